//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `RunState`: Lifecycle of a crawl run (idle, running, completed, failed, cancelled)
//! - `DownloadStatus`: Outcome category of an individual image download

mod download_status;
mod run_state;

// Re-export main types
pub use download_status::DownloadStatus;
pub use run_state::RunState;
