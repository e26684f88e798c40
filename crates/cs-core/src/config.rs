use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Spectral analyzer configuration.
///
/// Every field has a documented default; a TOML file may override any
/// subset. Validated at construction — a bad value is an error, never
/// silently clamped, because it would corrupt the analysis.
///
/// # Example
/// ```
/// use cs_core::config::AnalyzerConfig;
/// let config = AnalyzerConfig::default();
/// assert_eq!(config.block_size, 4096);
/// assert!((config.tolerance_hz() - 35.15625).abs() < 1e-9);
/// ```
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AnalyzerConfig {
    /// Analysis sample rate (Hz). Files at any other rate are rejected.
    pub sample_rate: u32,
    /// FFT block length in samples. Hop is always `block_size / 2`.
    pub block_size: usize,
    /// Lower edge of the analysis band (Hz).
    pub band_min: f64,
    /// Upper edge of the analysis band (Hz).
    pub band_max: f64,
    /// Peak detection threshold, as a multiple of the in-band noise floor.
    pub peak_threshold: f64,
    /// Maximum number of simultaneously live tracks.
    pub max_tracks: usize,
    /// Consecutive unmatched blocks before a track is retired.
    pub timeout_blocks: u32,
    /// Smoothing window; track history capacity is `smoothing_window * 5`.
    pub smoothing_window: usize,
    /// Sliding window length (in blocks) for the ρ correlation.
    pub rho_window_size: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            block_size: 4096,
            band_min: 500.0,
            band_max: 18_000.0,
            peak_threshold: 6.0,
            max_tracks: 50,
            timeout_blocks: 20,
            smoothing_window: 10,
            rho_window_size: 25,
        }
    }
}

impl AnalyzerConfig {
    /// Hop between consecutive block starts, in samples (50% overlap).
    #[inline]
    #[must_use]
    pub fn hop(&self) -> usize {
        self.block_size / 2
    }

    /// Hop duration in seconds.
    #[inline]
    #[must_use]
    pub fn hop_secs(&self) -> f64 {
        self.hop() as f64 / f64::from(self.sample_rate)
    }

    /// Association tolerance: three FFT bin widths, in Hz.
    #[inline]
    #[must_use]
    pub fn tolerance_hz(&self) -> f64 {
        3.0 * f64::from(self.sample_rate) / self.block_size as f64
    }

    /// Track frequency-history capacity.
    #[inline]
    #[must_use]
    pub fn history_capacity(&self) -> usize {
        self.smoothing_window * 5
    }

    /// Validate field values and cross-field constraints.
    ///
    /// # Errors
    /// Returns `CoreError::Config` describing the first violated constraint.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.sample_rate == 0 {
            return Err(CoreError::Config("sample_rate must be > 0".into()));
        }
        if self.block_size < 2 {
            return Err(CoreError::Config("block_size must be >= 2".into()));
        }
        if self.band_min < 0.0 || self.band_min >= self.band_max {
            return Err(CoreError::Config(format!(
                "analysis band [{}, {}] is empty or negative",
                self.band_min, self.band_max
            )));
        }
        let nyquist = f64::from(self.sample_rate) / 2.0;
        if self.band_min > nyquist {
            return Err(CoreError::Config(format!(
                "band_min {} Hz exceeds Nyquist {nyquist} Hz",
                self.band_min
            )));
        }
        if self.peak_threshold <= 0.0 {
            return Err(CoreError::Config("peak_threshold must be > 0".into()));
        }
        if self.max_tracks == 0 {
            return Err(CoreError::Config("max_tracks must be >= 1".into()));
        }
        if self.timeout_blocks == 0 {
            return Err(CoreError::Config("timeout_blocks must be >= 1".into()));
        }
        if self.smoothing_window == 0 {
            return Err(CoreError::Config("smoothing_window must be >= 1".into()));
        }
        if self.rho_window_size < 2 {
            return Err(CoreError::Config("rho_window_size must be >= 2".into()));
        }
        if self.rho_window_size > self.history_capacity() {
            return Err(CoreError::Config(format!(
                "rho_window_size {} exceeds history capacity {}",
                self.rho_window_size,
                self.history_capacity()
            )));
        }
        Ok(())
    }
}

/// Experiment protocol configuration (chirp-rate sweep).
///
/// A chirp rate of 0 selects the stationary multi-tone control protocol
/// (condition "A"); any positive rate selects the swept protocol ("B").
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ExperimentConfig {
    /// Nominal chirp rates to test, in Hz/s. 0 is the stationary control.
    pub chirp_rates: Vec<f64>,
    /// Repetitions per chirp rate.
    pub trials_per_rate: usize,
    /// Stimulus duration in seconds.
    pub duration_secs: f64,
    /// Number of simultaneous tones per stimulus.
    pub tone_count: usize,
    /// Lowest starting tone frequency (Hz).
    pub tone_min_hz: f64,
    /// Highest starting tone frequency (Hz).
    pub tone_max_hz: f64,
    /// Randomize per-tone starting phases for swept stimuli.
    pub vary_phases: bool,
    /// Gaussian jitter (std dev, Hz/s) applied to the effective chirp rate
    /// of each swept trial. 0.0 disables jitter. The nominal rate is logged.
    pub chirp_jitter_sigma: f64,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            chirp_rates: vec![0.0, 100.0, 250.0, 500.0, 750.0],
            trials_per_rate: 20,
            duration_secs: 10.0,
            tone_count: 50,
            tone_min_hz: 1000.0,
            tone_max_hz: 15_000.0,
            vary_phases: true,
            chirp_jitter_sigma: 25.0,
        }
    }
}

impl ExperimentConfig {
    /// Validate field values.
    ///
    /// # Errors
    /// Returns `CoreError::Config` describing the first violated constraint.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.chirp_rates.is_empty() {
            return Err(CoreError::Config("chirp_rates must not be empty".into()));
        }
        if self.chirp_rates.iter().any(|r| *r < 0.0) {
            return Err(CoreError::Config("chirp rates must be >= 0".into()));
        }
        if self.trials_per_rate == 0 {
            return Err(CoreError::Config("trials_per_rate must be >= 1".into()));
        }
        if self.duration_secs <= 0.0 {
            return Err(CoreError::Config("duration_secs must be > 0".into()));
        }
        if self.tone_count == 0 {
            return Err(CoreError::Config("tone_count must be >= 1".into()));
        }
        if self.tone_min_hz <= 0.0 || self.tone_min_hz > self.tone_max_hz {
            return Err(CoreError::Config(format!(
                "tone band [{}, {}] is empty or non-positive",
                self.tone_min_hz, self.tone_max_hz
            )));
        }
        if self.chirp_jitter_sigma < 0.0 {
            return Err(CoreError::Config("chirp_jitter_sigma must be >= 0".into()));
        }
        Ok(())
    }
}

/// Combined configuration as loaded from disk.
#[derive(Clone, Debug, Default)]
pub struct Config {
    pub analyzer: AnalyzerConfig,
    pub experiment: ExperimentConfig,
}

/// TOML file shape: both sections optional, every field optional.
#[derive(Deserialize)]
struct ConfigFile {
    analyzer: Option<AnalyzerSection>,
    experiment: Option<ExperimentSection>,
}

#[derive(Deserialize)]
struct AnalyzerSection {
    sample_rate: Option<u32>,
    block_size: Option<usize>,
    band_min: Option<f64>,
    band_max: Option<f64>,
    peak_threshold: Option<f64>,
    max_tracks: Option<usize>,
    timeout_blocks: Option<u32>,
    smoothing_window: Option<usize>,
    rho_window_size: Option<usize>,
}

#[derive(Deserialize)]
struct ExperimentSection {
    chirp_rates: Option<Vec<f64>>,
    trials_per_rate: Option<usize>,
    duration_secs: Option<f64>,
    tone_count: Option<usize>,
    tone_min_hz: Option<f64>,
    tone_max_hz: Option<f64>,
    vary_phases: Option<bool>,
    chirp_jitter_sigma: Option<f64>,
}

/// Load a TOML configuration file and merge it over the defaults.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed, or if the merged
/// configuration fails validation.
///
/// # Example
/// ```no_run
/// use cs_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read config file {}", path.display()))?;

    let file: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("TOML parse error in {}", path.display()))?;

    let mut config = Config::default();

    if let Some(a) = file.analyzer {
        if let Some(v) = a.sample_rate {
            config.analyzer.sample_rate = v;
        }
        if let Some(v) = a.block_size {
            config.analyzer.block_size = v;
        }
        if let Some(v) = a.band_min {
            config.analyzer.band_min = v;
        }
        if let Some(v) = a.band_max {
            config.analyzer.band_max = v;
        }
        if let Some(v) = a.peak_threshold {
            config.analyzer.peak_threshold = v;
        }
        if let Some(v) = a.max_tracks {
            config.analyzer.max_tracks = v;
        }
        if let Some(v) = a.timeout_blocks {
            config.analyzer.timeout_blocks = v;
        }
        if let Some(v) = a.smoothing_window {
            config.analyzer.smoothing_window = v;
        }
        if let Some(v) = a.rho_window_size {
            config.analyzer.rho_window_size = v;
        }
    }

    if let Some(e) = file.experiment {
        if let Some(v) = e.chirp_rates {
            config.experiment.chirp_rates = v;
        }
        if let Some(v) = e.trials_per_rate {
            config.experiment.trials_per_rate = v;
        }
        if let Some(v) = e.duration_secs {
            config.experiment.duration_secs = v;
        }
        if let Some(v) = e.tone_count {
            config.experiment.tone_count = v;
        }
        if let Some(v) = e.tone_min_hz {
            config.experiment.tone_min_hz = v;
        }
        if let Some(v) = e.tone_max_hz {
            config.experiment.tone_max_hz = v;
        }
        if let Some(v) = e.vary_phases {
            config.experiment.vary_phases = v;
        }
        if let Some(v) = e.chirp_jitter_sigma {
            config.experiment.chirp_jitter_sigma = v;
        }
    }

    config.analyzer.validate()?;
    config.experiment.validate()?;
    Ok(config)
}
