use crate::CLAP_STYLING;
use clap::{arg, command};

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("linkvet")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("linkvet")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("check")
                .about(
                    "Discover every link in the landing page and verify it with a parallel \
                worker pool.",
                )
                .arg(
                    arg!([TARGET])
                        .required(false)
                        .help("Worker count if numeric, otherwise a base URL override"),
                )
                .arg(
                    arg!([WORKERS])
                        .required(false)
                        .help("Worker count when TARGET holds a base URL"),
                )
                .arg(
                    arg!(--"html" <PATH>)
                        .required(false)
                        .help("Static HTML document to discover links from")
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                        .default_value("index.html"),
                )
                .arg(
                    arg!(--"no-runtime")
                        .required(false)
                        .help("Skip the rendered-page discovery pass (no browser needed)")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("External request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("10"),
                )
                .arg(
                    arg!(--"history" <PATH>)
                        .required(false)
                        .help("JSON history log location")
                        .default_value("tested-links.json"),
                )
                .arg(
                    arg!(--"no-history")
                        .required(false)
                        .help("Disable the JSON history log for this run")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                ),
        )
}
