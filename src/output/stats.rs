//! Run statistics
//!
//! Everything here is derived: `RunStatistics` from a result list, and
//! `CrawlProgress` from the counters the coordinator maintains.

use crate::crawler::DownloadResult;

/// Aggregate figures over a list of download results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStatistics {
    pub total: usize,
    pub success: usize,
    pub failed: usize,

    /// Sum of `size` over successful results
    pub total_bytes: u64,

    /// Mean `elapsed_secs` of successful results, rounded to two decimals
    pub average_secs: f64,
}

impl RunStatistics {
    /// Computes statistics from a result list
    ///
    /// # Example
    ///
    /// ```
    /// use img_harvest::output::RunStatistics;
    ///
    /// let stats = RunStatistics::from_results(&[]);
    /// assert_eq!(stats.total, 0);
    /// assert_eq!(stats.average_secs, 0.0);
    /// ```
    pub fn from_results(results: &[DownloadResult]) -> Self {
        let successes: Vec<_> = results.iter().filter(|r| r.success).collect();

        let total_bytes = successes.iter().map(|r| r.size).sum();
        let average_secs = if successes.is_empty() {
            0.0
        } else {
            let sum: f64 = successes.iter().map(|r| r.elapsed_secs).sum();
            ((sum / successes.len() as f64) * 100.0).round() / 100.0
        };

        Self {
            total: results.len(),
            success: successes.len(),
            failed: results.len() - successes.len(),
            total_bytes,
            average_secs,
        }
    }

    /// Percentage of successful results, 0 when there are none
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.success as f64 / self.total as f64 * 100.0
        }
    }
}

/// Counters describing how far a crawl has come
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlProgress {
    pub total_urls: usize,
    pub processed_urls: usize,
    pub found_images: usize,
    pub downloaded_images: usize,
    pub failed_downloads: usize,
}

/// Formats a byte count with a binary unit suffix
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// Prints statistics to stdout
pub fn print_statistics(stats: &RunStatistics) {
    println!("=== Download Statistics ===\n");
    println!("Total images: {}", stats.total);
    println!(
        "Succeeded:    {} ({:.1}%)",
        stats.success,
        stats.success_rate()
    );
    println!("Failed:       {}", stats.failed);
    println!("Total size:   {}", format_bytes(stats.total_bytes));
    println!("Avg. time:    {:.2}s", stats.average_secs);
}
