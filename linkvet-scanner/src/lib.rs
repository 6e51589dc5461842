pub mod discovery;
pub mod error;
pub mod link;
pub mod outcome;
pub mod pool;
pub mod renderer;
pub mod verify;

pub use error::VerifyError;
pub use link::{DiscoveredLinks, Link, LinkCategory};
pub use outcome::{BatchSummary, Outcome};
pub use pool::{OutcomeCallback, default_workers, run_batch};
pub use renderer::{ChromiumRenderer, PageRenderer, RenderedPage};
