//! Markdown run report
//!
//! Renders the configuration, the aggregate statistics and one table row
//! per download result.

use crate::config::Config;
use crate::crawler::DownloadResult;
use crate::output::stats::{format_bytes, RunStatistics};
use crate::output::traits::OutputResult;
use crate::state::{DownloadStatus, RunState};
use chrono::{DateTime, Local};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Everything a report is rendered from
#[derive(Debug, Clone)]
pub struct RunReport<'a> {
    pub config: &'a Config,
    pub config_hash: Option<&'a str>,
    pub state: RunState,
    pub results: &'a [DownloadResult],
    pub generated_at: DateTime<Local>,
}

impl<'a> RunReport<'a> {
    pub fn new(config: &'a Config, state: RunState, results: &'a [DownloadResult]) -> Self {
        Self {
            config,
            config_hash: None,
            state,
            results,
            generated_at: Local::now(),
        }
    }

    pub fn with_config_hash(mut self, hash: &'a str) -> Self {
        self.config_hash = Some(hash);
        self
    }
}

/// Writes the markdown report to `output_path`
pub fn generate_markdown_report(report: &RunReport<'_>, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_report(report);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a run report as markdown
pub fn format_markdown_report(report: &RunReport<'_>) -> String {
    let config = report.config;
    let stats = RunStatistics::from_results(report.results);
    let mut md = String::new();

    md.push_str("# Img-Harvest Run Report\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!(
        "- **Generated**: {}\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S")
    ));
    md.push_str(&format!("- **Status**: {}\n", report.state));
    if let Some(hash) = report.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push('\n');

    md.push_str("## Configuration\n\n");
    md.push_str(&format!("- **URL**: {}\n", config.url));
    if config.repeat_enabled {
        md.push_str(&format!(
            "- **Range**: {}..={} step {}\n",
            config.start_value, config.end_value, config.step_value
        ));
    }
    md.push_str(&format!(
        "- **Selectors**: {}\n",
        config
            .selectors
            .iter()
            .map(|s| format!("`{}`", s))
            .collect::<Vec<_>>()
            .join(", ")
    ));
    md.push_str(&format!("- **Save Path**: {}\n", config.save_path.display()));
    md.push_str(&format!("- **Filename Pattern**: {}\n", config.filename_pattern));
    md.push_str(&format!(
        "- **Concurrency**: {} pages / {} downloads\n\n",
        config.page_concurrency(),
        config.download_concurrency()
    ));

    md.push_str("## Statistics\n\n");
    md.push_str(&format!("- **Total Images**: {}\n", stats.total));
    md.push_str(&format!(
        "- **Succeeded**: {} ({:.1}%)\n",
        stats.success,
        stats.success_rate()
    ));
    md.push_str(&format!("- **Failed**: {}\n", stats.failed));
    md.push_str(&format!("- **Total Size**: {}\n", format_bytes(stats.total_bytes)));
    md.push_str(&format!("- **Average Time**: {:.2}s\n\n", stats.average_secs));

    if !report.results.is_empty() {
        md.push_str("## Results\n\n");
        md.push_str("| | File | URL | Size | Time | Error |\n");
        md.push_str("|-|------|-----|------|------|-------|\n");

        for result in report.results {
            let icon = match result.status {
                DownloadStatus::Downloaded => "✅",
                DownloadStatus::SkippedExists => "⏭",
                DownloadStatus::Failed => "❌",
            };
            md.push_str(&format!(
                "| {} | {} | {} | {} | {:.2}s | {} |\n",
                icon,
                escape_cell(result.filename.as_deref().unwrap_or("-")),
                escape_cell(&result.url),
                format_bytes(result.size),
                result.elapsed_secs,
                escape_cell(result.error.as_deref().unwrap_or("")),
            ));
        }
        md.push('\n');
    }

    md
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}
