//! Append-only JSON log of verification sessions.
//!
//! The verifier itself only talks to the [`OutcomeSink`] trait, so the core
//! pipeline carries no compiled-in dependency on persistence. The JSON
//! layout keeps per-URL content hash/size history so later runs can flag
//! content drift.

use chrono::{Local, Utc};
use linkvet_scanner::Outcome;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::warn;

/// Sessions retained in the log file before the oldest are dropped.
pub const SESSION_RETENTION: usize = 50;

/// Injected recorder for verification outcomes. One session per run.
pub trait OutcomeSink: Send {
    fn start_session(&mut self, base_url: &str);
    fn record(&mut self, outcome: &Outcome);
    fn end_session(&mut self);
}

/// Sink used when history is disabled.
pub struct NoopSink;

impl OutcomeSink for NoopSink {
    fn start_session(&mut self, _base_url: &str) {}
    fn record(&mut self, _outcome: &Outcome) {}
    fn end_session(&mut self) {}
}

#[derive(Debug, Serialize, Deserialize)]
struct LogMetadata {
    created: String,
    version: String,
    description: String,
}

/// Rolling per-URL state carried across sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkHistory {
    pub url: String,
    pub link_text: String,
    pub last_tested: String,
    pub last_success: bool,
    pub last_status_code: Option<u16>,
    pub last_content_hash: Option<String>,
    pub last_content_size: Option<u64>,
    pub total_tests: u64,
    pub success_count: u64,
}

/// One outcome as stored inside a session, drift flags included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEntry {
    pub url: String,
    pub link_text: String,
    pub success: bool,
    pub status_code: Option<u16>,
    pub error_message: Option<String>,
    pub content_hash: Option<String>,
    pub content_size: Option<u64>,
    pub content_changed: bool,
    pub size_changed: bool,
    pub previous_hash: Option<String>,
    pub previous_size: Option<u64>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSummary {
    pub total_tested: usize,
    pub total_passed: usize,
    pub total_failed: usize,
    pub content_changes: usize,
    pub new_links: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSession {
    pub test_id: String,
    pub timestamp: String,
    pub end_timestamp: Option<String>,
    pub duration_seconds: Option<f64>,
    pub base_url: String,
    pub links_tested: Vec<SessionEntry>,
    pub summary: SessionSummary,
}

#[derive(Debug, Serialize, Deserialize)]
struct LogFile {
    metadata: LogMetadata,
    test_sessions: Vec<TestSession>,
    link_history: HashMap<String, LinkHistory>,
}

impl LogFile {
    fn fresh() -> Self {
        Self {
            metadata: LogMetadata {
                created: Utc::now().to_rfc3339(),
                version: "1.0".to_string(),
                description: "Link testing log with content drift tracking".to_string(),
            },
            test_sessions: Vec::new(),
            link_history: HashMap::new(),
        }
    }
}

/// File-backed [`OutcomeSink`]. Loading problems fall back to a fresh log
/// and save problems are logged; history never aborts a run.
pub struct JsonHistory {
    path: PathBuf,
    log: LogFile,
    current: Option<TestSession>,
    session_start: Option<Instant>,
}

impl JsonHistory {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let log = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(log) => log,
                Err(e) => {
                    warn!("could not parse history log {}: {}", path.display(), e);
                    LogFile::fresh()
                }
            },
            Err(_) => LogFile::fresh(),
        };

        Self {
            path,
            log,
            current: None,
            session_start: None,
        }
    }

    pub fn session_count(&self) -> usize {
        self.log.test_sessions.len()
    }

    pub fn link_history(&self, url: &str) -> Option<&LinkHistory> {
        self.log.link_history.get(url)
    }

    fn generate_test_id() -> String {
        format!("test_{}", Local::now().format("%Y%m%d_%H%M%S"))
    }

    fn save(&self) {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warn!("could not create history directory: {}", e);
            return;
        }

        match serde_json::to_string_pretty(&self.log) {
            Ok(serialized) => {
                if let Err(e) = fs::write(&self.path, serialized) {
                    warn!("could not save history log {}: {}", self.path.display(), e);
                }
            }
            Err(e) => warn!("could not serialize history log: {}", e),
        }
    }
}

impl OutcomeSink for JsonHistory {
    fn start_session(&mut self, base_url: &str) {
        self.current = Some(TestSession {
            test_id: Self::generate_test_id(),
            timestamp: Utc::now().to_rfc3339(),
            end_timestamp: None,
            duration_seconds: None,
            base_url: base_url.to_string(),
            links_tested: Vec::new(),
            summary: SessionSummary::default(),
        });
        self.session_start = Some(Instant::now());
    }

    fn record(&mut self, outcome: &Outcome) {
        let Some(session) = self.current.as_mut() else {
            return;
        };

        let url = outcome.link.url.clone();
        let previous = self.log.link_history.get(&url);

        let previous_hash = previous.and_then(|h| h.last_content_hash.clone());
        let previous_size = previous.and_then(|h| h.last_content_size);
        let content_changed = matches!(
            (&previous_hash, &outcome.content_hash),
            (Some(old), Some(new)) if old != new
        );
        let size_changed = matches!(
            (previous_size, outcome.content_length),
            (Some(old), Some(new)) if old != new
        );

        if previous.is_none() {
            session.summary.new_links += 1;
        }

        let (total_tests, success_count) = previous
            .map(|h| (h.total_tests, h.success_count))
            .unwrap_or((0, 0));

        self.log.link_history.insert(
            url.clone(),
            LinkHistory {
                url: url.clone(),
                link_text: outcome.link.text.clone(),
                last_tested: Utc::now().to_rfc3339(),
                last_success: outcome.success,
                last_status_code: outcome.status_code,
                last_content_hash: outcome.content_hash.clone(),
                last_content_size: outcome.content_length,
                total_tests: total_tests + 1,
                success_count: success_count + u64::from(outcome.success),
            },
        );

        session.links_tested.push(SessionEntry {
            url,
            link_text: outcome.link.text.clone(),
            success: outcome.success,
            status_code: outcome.status_code,
            error_message: outcome.error.clone(),
            content_hash: outcome.content_hash.clone(),
            content_size: outcome.content_length,
            content_changed,
            size_changed,
            previous_hash,
            previous_size,
            timestamp: Utc::now().to_rfc3339(),
        });

        session.summary.total_tested += 1;
        if outcome.success {
            session.summary.total_passed += 1;
        } else {
            session.summary.total_failed += 1;
        }
        if content_changed || size_changed {
            session.summary.content_changes += 1;
        }
    }

    fn end_session(&mut self) {
        let Some(mut session) = self.current.take() else {
            return;
        };

        session.end_timestamp = Some(Utc::now().to_rfc3339());
        session.duration_seconds = self
            .session_start
            .take()
            .map(|start| start.elapsed().as_secs_f64());

        self.log.test_sessions.push(session);

        // Retention cap keeps the log from growing without bound.
        let excess = self.log.test_sessions.len().saturating_sub(SESSION_RETENTION);
        if excess > 0 {
            self.log.test_sessions.drain(..excess);
        }

        self.save();
    }
}
