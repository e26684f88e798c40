use thiserror::Error;

/// Errors surfaced at file or configuration granularity.
///
/// Everything below this level (silent blocks, degenerate correlation
/// windows, singular velocity fits, track capacity exhaustion) is handled
/// locally inside the analysis pipeline and never becomes an error.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid configuration value or structure.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Audio file sample rate does not match the configured analysis rate.
    /// The file is skipped; no result row is written for it.
    #[error("sample rate mismatch: file is {actual} Hz, analyzer configured for {expected} Hz")]
    SampleRateMismatch {
        /// Configured analysis sample rate.
        expected: u32,
        /// Sample rate reported by the decoded file.
        actual: u32,
    },
}
