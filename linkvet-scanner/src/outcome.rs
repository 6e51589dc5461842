use crate::link::Link;
use serde::{Deserialize, Serialize};

/// The result of verifying a single link. Produced exactly once per link
/// per batch and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub link: Link,
    pub success: bool,
    pub status_code: Option<u16>,
    pub error: Option<String>,
    /// SHA-256 of the fetched body, when one was fetched. Only used by the
    /// history sink to flag content drift between runs.
    pub content_hash: Option<String>,
    pub content_length: Option<u64>,
}

impl Outcome {
    pub fn pass(link: Link, status_code: Option<u16>) -> Self {
        Self {
            link,
            success: true,
            status_code,
            error: None,
            content_hash: None,
            content_length: None,
        }
    }

    pub fn fail(link: Link, status_code: Option<u16>, error: String) -> Self {
        Self {
            link,
            success: false,
            status_code,
            error: Some(error),
            content_hash: None,
            content_length: None,
        }
    }

    pub fn with_content(mut self, hash: String, length: u64) -> Self {
        self.content_hash = Some(hash);
        self.content_length = Some(length);
        self
    }
}

/// Lock-protected tally for one category batch. Owned by the coordinator;
/// workers only ever touch it through [`BatchSummary::record`].
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_tested: usize,
    pub total_passed: usize,
    pub total_failed: usize,
    pub failed: Vec<Outcome>,
}

impl BatchSummary {
    pub fn record(&mut self, outcome: Outcome) {
        self.total_tested += 1;
        if outcome.success {
            self.total_passed += 1;
        } else {
            self.total_failed += 1;
            self.failed.push(outcome);
        }
    }

    /// Fold another batch into this one, preserving failure order.
    pub fn absorb(&mut self, other: BatchSummary) {
        self.total_tested += other.total_tested;
        self.total_passed += other.total_passed;
        self.total_failed += other.total_failed;
        self.failed.extend(other.failed);
    }

    /// Holds after every batch: every recorded outcome counted exactly once.
    pub fn is_consistent(&self) -> bool {
        self.total_tested == self.total_passed + self.total_failed
            && self.failed.len() == self.total_failed
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total_tested == 0 {
            return 0.0;
        }
        self.total_passed as f64 / self.total_tested as f64 * 100.0
    }
}
