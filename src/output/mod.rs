//! Output module for reporting crawl progress and results
//!
//! This module handles:
//! - Notifying hosts through the `CrawlObserver` interface
//! - Aggregating download results into statistics
//! - Writing markdown run reports

mod markdown;
pub mod stats;
mod traits;

pub use markdown::{format_markdown_report, generate_markdown_report, RunReport};
pub use stats::{format_bytes, print_statistics, CrawlProgress, RunStatistics};
pub use traits::{
    ChannelObserver, CrawlEvent, CrawlObserver, LoggingObserver, NullObserver, OutputError,
    OutputResult, ProgressEvent,
};
