use std::path::Path;

use anyhow::Result;
use cs_core::config::AnalyzerConfig;
use cs_core::error::CoreError;

use crate::analyzer::SpectralFrameAnalyzer;
use crate::decode;
use crate::rho::CorrelationScorer;
use crate::tracker::TrackManager;

/// Drives one full trial: block segmentation, peak detection, track
/// lifecycle, and ρ aggregation. All track state is reset per buffer;
/// nothing persists across files.
///
/// # Example
/// ```
/// use cs_core::config::AnalyzerConfig;
/// use cs_audio::trial::TrialProcessor;
/// let mut processor = TrialProcessor::new(&AnalyzerConfig::default()).unwrap();
/// let silence = vec![0.0f32; 48_000];
/// let rho = processor.process_buffer(&silence, 48_000).unwrap();
/// assert_eq!(rho, 0.0);
/// ```
pub struct TrialProcessor {
    config: AnalyzerConfig,
    analyzer: SpectralFrameAnalyzer,
    tracker: TrackManager,
    scorer: CorrelationScorer,
}

impl TrialProcessor {
    /// Build a processor after validating the configuration.
    ///
    /// # Errors
    /// Returns `CoreError::Config` for an invalid configuration.
    pub fn new(config: &AnalyzerConfig) -> Result<Self, CoreError> {
        config.validate()?;
        Ok(Self {
            config: config.clone(),
            analyzer: SpectralFrameAnalyzer::new(config),
            tracker: TrackManager::new(config),
            scorer: CorrelationScorer::new(config.rho_window_size),
        })
    }

    /// Analyze one mono buffer and return the trial ρ summary.
    ///
    /// Blocks of `block_size` samples advance by `block_size / 2` while a
    /// full block remains; each is fed through detection, association, and
    /// scoring in temporal order.
    ///
    /// # Errors
    /// Returns `CoreError::SampleRateMismatch` if the buffer's rate differs
    /// from the configured analysis rate. No other error can escape the
    /// block loop.
    pub fn process_buffer(&mut self, samples: &[f32], sample_rate: u32) -> Result<f64, CoreError> {
        if sample_rate != self.config.sample_rate {
            return Err(CoreError::SampleRateMismatch {
                expected: self.config.sample_rate,
                actual: sample_rate,
            });
        }

        self.tracker.reset();
        self.scorer.reset();

        let block = self.config.block_size;
        let hop = self.config.hop();
        let mut start = 0usize;
        let mut index = 0usize;
        while start + block < samples.len() {
            let peaks = self.analyzer.detect(&samples[start..start + block]);
            self.tracker.process_block(&peaks);
            if let Some(aggregate) = self.scorer.score_block(self.tracker.tracks()) {
                log::trace!(
                    "block {index}: {} peaks, {} tracks, ρ = {aggregate:+.4}",
                    peaks.len(),
                    self.tracker.len()
                );
            }
            start += hop;
            index += 1;
        }

        let summary = self.scorer.trial_summary();
        log::debug!("trial done: {index} blocks, mean |ρ| = {summary:.4}");
        Ok(summary)
    }

    /// Decode an audio file and analyze it as one trial.
    ///
    /// # Errors
    /// Returns decode failures and `CoreError::SampleRateMismatch`; either
    /// way the file produces no summary.
    pub fn process_file(&mut self, path: &Path) -> Result<f64> {
        let (samples, sample_rate) = decode::decode_file(path)?;
        Ok(self.process_buffer(&samples, sample_rate)?)
    }

    /// Track state as left by the most recently processed buffer.
    #[must_use]
    pub fn tracker(&self) -> &TrackManager {
        &self.tracker
    }

    /// Number of blocks in the most recent buffer that produced a ρ
    /// aggregate. Zero means the summary is the no-data fallback.
    #[must_use]
    pub fn aggregated_blocks(&self) -> usize {
        self.scorer.aggregate_count()
    }
}
