use std::fmt;

/// Outcome category of a single image download
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DownloadStatus {
    /// The body was fetched and written to disk
    Downloaded,

    /// The destination already existed and overwriting is disabled
    SkippedExists,

    /// The download did not produce a file
    Failed,
}

impl DownloadStatus {
    /// Returns true for statuses that count as a successful outcome
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Downloaded | Self::SkippedExists)
    }

    /// Human-readable label used in results and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Downloaded => "downloaded",
            Self::SkippedExists => "skipped (already exists)",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq<&str> for DownloadStatus {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}
