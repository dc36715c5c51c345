//! Pipeline entry points for the republisher.
//!
//! - `Harvester`: Resumable fetch → filter → verify → publish loop
//! - `run_init`: Write the starting cursor
//! - `run_preview`: Classify the current window without side effects

pub mod harvest;
pub mod init;
pub mod preview;
pub mod window;

pub use harvest::{HarvestSettings, Harvester, WindowReport};
pub use init::run_init;
pub use preview::{PreviewItem, PreviewOutcome, run_preview};
pub use window::Window;
