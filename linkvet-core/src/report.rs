// Report generation for a completed verification run

use linkvet_scanner::{BatchSummary, DiscoveredLinks};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub internal_hash: usize,
    pub internal_guide: usize,
    pub external: usize,
    pub navigation: usize,
}

impl From<&DiscoveredLinks> for CategoryCounts {
    fn from(links: &DiscoveredLinks) -> Self {
        Self {
            internal_hash: links.internal_hash.len(),
            internal_guide: links.internal_guide.len(),
            external: links.external.len(),
            navigation: links.navigation.len(),
        }
    }
}

/// Everything the report needs, gathered once after the last batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportData {
    pub base_url: String,
    pub workers: usize,
    pub discovered: CategoryCounts,
    /// All category batches summed; failure order is batch order.
    pub summary: BatchSummary,
    pub start_time: i64,
    pub end_time: i64,
}

impl ReportData {
    /// The run succeeds only when nothing failed across any category.
    pub fn all_passed(&self) -> bool {
        self.summary.total_failed == 0
    }

    fn format_timestamp(&self, timestamp: i64) -> String {
        use chrono::{DateTime, Utc};
        let datetime = DateTime::<Utc>::from_timestamp(timestamp, 0).unwrap_or_else(Utc::now);
        datetime.format("%Y-%m-%d %H:%M:%S UTC").to_string()
    }
}

pub fn generate_text_report(data: &ReportData) -> String {
    let mut report = String::new();

    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    report.push_str("                      LINKVET PARALLEL LINK TEST REPORT\n");
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    report.push_str(&format!("Base URL:     {}\n", data.base_url));
    report.push_str(&format!(
        "Test Date:    {}\n",
        data.format_timestamp(data.start_time)
    ));
    report.push_str(&format!(
        "Duration:     {} seconds\n",
        data.end_time - data.start_time
    ));
    report.push_str(&format!("Workers:      {}\n\n", data.workers));

    report.push_str("SUMMARY\n");
    report.push_str(&format!(
        "  Total Links Tested: {}\n",
        data.summary.total_tested
    ));
    report.push_str(&format!("  Passed:             {}\n", data.summary.total_passed));
    report.push_str(&format!("  Failed:             {}\n", data.summary.total_failed));
    if data.summary.total_tested > 0 {
        report.push_str(&format!(
            "  Success Rate:       {:.1}%\n",
            data.summary.pass_rate()
        ));
    }
    report.push('\n');

    report.push_str("DISCOVERED LINKS\n");
    report.push_str(&format!(
        "  Internal Hash Links:  {}\n",
        data.discovered.internal_hash
    ));
    report.push_str(&format!(
        "  Internal Guide Links: {}\n",
        data.discovered.internal_guide
    ));
    report.push_str(&format!(
        "  External Links:       {}\n",
        data.discovered.external
    ));
    report.push_str(&format!(
        "  Navigation Links:     {}\n",
        data.discovered.navigation
    ));
    report.push('\n');

    if !data.summary.failed.is_empty() {
        report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
        report.push_str(&format!("FAILED LINKS ({})\n", data.summary.failed.len()));
        report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

        for outcome in &data.summary.failed {
            report.push_str(&format!(
                "  [{}] {} ({})\n",
                outcome.link.category.label().to_uppercase(),
                outcome.link.text,
                outcome.link.url
            ));
            if let Some(status) = outcome.status_code {
                report.push_str(&format!("      Status: {}\n", status));
            }
            report.push_str(&format!(
                "      Error: {}\n",
                outcome.error.as_deref().unwrap_or("unknown error")
            ));
        }
        report.push('\n');
    }

    if data.all_passed() {
        report.push_str("ALL TESTS PASSED - every discovered link is working correctly.\n");
    } else {
        report.push_str(&format!(
            "{} TESTS FAILED - fix the broken links before committing.\n",
            data.summary.total_failed
        ));
    }

    report
}

pub fn generate_json_report(data: &ReportData) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "linkvet",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json",
            },
            "run": {
                "base_url": data.base_url,
                "workers": data.workers,
                "start_time": data.start_time,
                "end_time": data.end_time,
                "duration_seconds": data.end_time - data.start_time,
            },
            "summary": {
                "total_tested": data.summary.total_tested,
                "total_passed": data.summary.total_passed,
                "total_failed": data.summary.total_failed,
                "pass_rate": data.summary.pass_rate(),
            },
            "discovered": data.discovered,
            "failed_links": data.summary.failed,
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
