use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use linkvet_core::history::{JsonHistory, NoopSink, OutcomeSink};
use linkvet_core::report::{
    CategoryCounts, ReportData, ReportFormat, generate_json_report, generate_text_report,
    save_report,
};
use linkvet_scanner::pool::OutcomeCallback;
use linkvet_scanner::{
    BatchSummary, ChromiumRenderer, Outcome, PageRenderer, discovery, pool, verify,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://ccri-cyberknights.github.io/page";

/// Lenient positional parsing: a numeric first argument is a worker count,
/// anything else is a base-URL override; a non-numeric second argument is
/// ignored in favor of the default worker count.
pub fn parse_target_args(
    target: Option<&str>,
    workers_arg: Option<&str>,
) -> (Option<usize>, Option<String>) {
    let mut workers = None;
    let mut base_url = None;

    if let Some(target) = target {
        match target.parse::<usize>() {
            Ok(n) => workers = Some(n),
            Err(_) => base_url = Some(target.to_string()),
        }
    }

    if let Some(arg) = workers_arg
        && let Ok(n) = arg.parse::<usize>()
    {
        workers = Some(n);
    }

    (workers, base_url)
}

/// Per-link console line, or nothing in quiet mode.
pub fn outcome_console_line(outcome: &Outcome, quiet: bool) -> Option<String> {
    if quiet {
        return None;
    }
    let marker = if outcome.success {
        "PASS".green().bold()
    } else {
        "FAIL".red().bold()
    };
    Some(format!(
        "  {} {} ({})",
        marker, outcome.link.text, outcome.link.url
    ))
}

pub async fn handle_check(sub_matches: &ArgMatches, quiet: bool) {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let (workers_arg, base_override) = parse_target_args(
        sub_matches.get_one::<String>("TARGET").map(String::as_str),
        sub_matches.get_one::<String>("WORKERS").map(String::as_str),
    );
    let workers = workers_arg.unwrap_or_else(pool::default_workers).max(1);
    let base_url = base_override.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let html_path = sub_matches.get_one::<PathBuf>("html").unwrap();
    let skip_runtime = sub_matches.get_flag("no-runtime");
    let timeout = Duration::from_secs(*sub_matches.get_one::<u64>("timeout").unwrap_or(&10));
    let history_path = sub_matches.get_one::<String>("history").unwrap();
    let no_history = sub_matches.get_flag("no-history");
    let output = sub_matches.get_one::<PathBuf>("output");
    let format = sub_matches
        .get_one::<String>("format")
        .and_then(|s| ReportFormat::from_str(s))
        .unwrap_or(ReportFormat::Text);

    if !quiet {
        println!("\n🔗 Checking links for {}", base_url);
        println!("Workers: {}", workers);
        println!("Document: {}", html_path.display());
        println!(
            "Runtime discovery: {}\n",
            if skip_runtime { "disabled" } else { "enabled" }
        );
    }

    let start_time = chrono::Utc::now().timestamp();

    // Static discovery failures are fatal: nothing to verify without it.
    let mut links = match discovery::discover_from_file(html_path, &base_url) {
        Ok(links) => links,
        Err(e) => {
            eprintln!("{} Link discovery failed: {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    let renderer: Arc<dyn PageRenderer> = Arc::new(ChromiumRenderer::new());
    if !skip_runtime {
        if let Err(e) =
            discovery::discover_from_runtime(renderer.as_ref(), &base_url, &mut links).await
        {
            eprintln!("{} Runtime link discovery failed: {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    }

    let discovered = CategoryCounts::from(&links);
    if !quiet {
        println!(
            "Discovered {} hash, {} guide, {} external, {} navigation links",
            discovered.internal_hash,
            discovered.internal_guide,
            discovered.external,
            discovered.navigation
        );
    }

    // History is an injected sink; the verifier never knows whether it is
    // writing a JSON log or nothing at all.
    let sink: Box<dyn OutcomeSink> = if no_history {
        Box::new(NoopSink)
    } else {
        let expanded = shellexpand::tilde(history_path);
        Box::new(JsonHistory::open(expanded.as_ref()))
    };
    let sink = Arc::new(StdMutex::new(sink));
    sink.lock().unwrap().start_session(&base_url);

    let spinner = if quiet {
        ProgressBar::hidden()
    } else {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    };

    let sink_clone = sink.clone();
    let spinner_clone = spinner.clone();
    let on_outcome: OutcomeCallback = Arc::new(move |outcome: &Outcome| {
        if let Some(line) = outcome_console_line(outcome, quiet) {
            spinner_clone.println(line);
        }
        if let Ok(mut sink) = sink_clone.lock() {
            sink.record(outcome);
        }
    });

    let mut combined = BatchSummary::default();

    // Categories run one after another; only links inside a category run
    // in parallel.
    let internal_hash = std::mem::take(&mut links.internal_hash);
    spinner.set_message(format!(
        "Verifying {} internal hash links...",
        internal_hash.len()
    ));
    let renderer_clone = renderer.clone();
    let base = base_url.clone();
    combined.absorb(
        pool::run_batch(
            internal_hash,
            workers,
            move |link| {
                let renderer = renderer_clone.clone();
                let base = base.clone();
                async move {
                    verify::verify_internal(renderer.as_ref(), &base, &link, verify::SETTLE_DELAY)
                        .await
                }
            },
            Some(on_outcome.clone()),
        )
        .await,
    );

    let internal_guide = std::mem::take(&mut links.internal_guide);
    spinner.set_message(format!("Verifying {} guide links...", internal_guide.len()));
    let renderer_clone = renderer.clone();
    let base = base_url.clone();
    combined.absorb(
        pool::run_batch(
            internal_guide,
            workers,
            move |link| {
                let renderer = renderer_clone.clone();
                let base = base.clone();
                async move {
                    verify::verify_internal(renderer.as_ref(), &base, &link, verify::SETTLE_DELAY)
                        .await
                }
            },
            Some(on_outcome.clone()),
        )
        .await,
    );

    let external = std::mem::take(&mut links.external);
    spinner.set_message(format!("Verifying {} external links...", external.len()));
    let client = match verify::http_client(timeout) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("{} Failed to build HTTP client: {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };
    combined.absorb(
        pool::run_batch(
            external,
            workers,
            move |link| {
                let client = client.clone();
                async move { verify::verify_external(&client, &link).await }
            },
            Some(on_outcome.clone()),
        )
        .await,
    );

    spinner.finish_and_clear();
    sink.lock().unwrap().end_session();

    let end_time = chrono::Utc::now().timestamp();
    let data = ReportData {
        base_url,
        workers,
        discovered,
        summary: combined,
        start_time,
        end_time,
    };

    let rendered = match format {
        ReportFormat::Text => generate_text_report(&data),
        ReportFormat::Json => match generate_json_report(&data) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("{} Failed to serialize report: {}", "✗".red().bold(), e);
                std::process::exit(1);
            }
        },
    };

    match output {
        Some(path) => {
            if let Err(e) = save_report(&rendered, path) {
                eprintln!("{} Failed to save report: {}", "✗".red().bold(), e);
                std::process::exit(1);
            }
            if !quiet {
                println!("{} Report saved to {}", "✓".green().bold(), path.display());
            }
        }
        None => print!("{}", rendered),
    }

    if !data.all_passed() {
        std::process::exit(1);
    }
}
