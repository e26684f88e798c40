use cs_core::config::AnalyzerConfig;

use crate::fft::FftPipeline;

/// Mean-squared energy below which a block is treated as silence.
const SILENCE_EPS: f64 = 1e-10;

/// Detects spectral peaks in one block via adaptive noise-floor thresholding.
///
/// The magnitude spectrum is restricted to the configured band; the noise
/// floor is the median in-band magnitude. Bins whose magnitude exceeds
/// `peak_threshold` times the floor become peaks, reported as frequencies
/// in ascending order.
///
/// # Example
/// ```
/// use cs_core::config::AnalyzerConfig;
/// use cs_audio::analyzer::SpectralFrameAnalyzer;
/// let mut analyzer = SpectralFrameAnalyzer::new(&AnalyzerConfig::default());
/// let silence = vec![0.0f32; 4096];
/// assert!(analyzer.detect(&silence).is_empty());
/// ```
pub struct SpectralFrameAnalyzer {
    fft: FftPipeline,
    /// Spectrum bin indices whose frequency lies inside [band_min, band_max].
    band_bins: Vec<usize>,
    /// Frequency of each spectrum bin (Hz).
    bin_freqs: Vec<f64>,
    threshold: f64,
    // Scratch reused across blocks.
    magnitudes: Vec<f32>,
    band_mags: Vec<f64>,
    sorted: Vec<f64>,
}

impl SpectralFrameAnalyzer {
    /// Build an analyzer for the given configuration.
    #[must_use]
    pub fn new(config: &AnalyzerConfig) -> Self {
        let fft = FftPipeline::new(config.block_size);
        let bin_hz = f64::from(config.sample_rate) / config.block_size as f64;
        let bin_freqs: Vec<f64> = (0..fft.num_bins()).map(|k| k as f64 * bin_hz).collect();
        let band_bins: Vec<usize> = bin_freqs
            .iter()
            .enumerate()
            .filter(|(_, f)| **f >= config.band_min && **f <= config.band_max)
            .map(|(k, _)| k)
            .collect();

        Self {
            fft,
            band_bins,
            bin_freqs,
            threshold: config.peak_threshold,
            magnitudes: Vec::new(),
            band_mags: Vec::new(),
            sorted: Vec::new(),
        }
    }

    /// Detect peak frequencies in one block of samples.
    ///
    /// Returns frequencies in ascending order, at most one per bin. A block
    /// whose mean squared energy is below the silence gate yields no peaks
    /// without computing a spectrum.
    pub fn detect(&mut self, block: &[f32]) -> Vec<f64> {
        if block.is_empty() || self.band_bins.is_empty() {
            return Vec::new();
        }

        let energy: f64 = block.iter().map(|&s| f64::from(s) * f64::from(s)).sum::<f64>()
            / block.len() as f64;
        if energy < SILENCE_EPS {
            log::trace!("block below silence gate (mse = {energy:.3e})");
            return Vec::new();
        }

        self.fft.process_into(block, &mut self.magnitudes);

        self.band_mags.clear();
        self.band_mags
            .extend(self.band_bins.iter().map(|&k| f64::from(self.magnitudes[k])));

        // Median in-band magnitude, plus a tiny constant so a pathological
        // all-zero band cannot divide by zero.
        let noise_floor = median(&self.band_mags, &mut self.sorted) + 1e-12;

        self.band_bins
            .iter()
            .zip(&self.band_mags)
            .filter_map(|(&k, &mag)| {
                (mag / noise_floor > self.threshold).then(|| self.bin_freqs[k])
            })
            .collect()
    }

    /// Frequency resolution of one FFT bin (Hz).
    #[must_use]
    pub fn bin_hz(&self) -> f64 {
        self.bin_freqs.get(1).copied().unwrap_or(0.0)
    }
}

/// Median of `values`, averaging the two middle elements for even lengths.
/// `scratch` is reused to avoid reallocating per block.
fn median(values: &[f64], scratch: &mut Vec<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    scratch.clear();
    scratch.extend_from_slice(values);
    scratch.sort_by(f64::total_cmp);
    let mid = scratch.len() / 2;
    if scratch.len() % 2 == 0 {
        (scratch[mid - 1] + scratch[mid]) / 2.0
    } else {
        scratch[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(freq: f64, amp: f64, n: usize, fs: f64) -> Vec<f32> {
        (0..n)
            .map(|i| (amp * (std::f64::consts::TAU * freq * i as f64 / fs).sin()) as f32)
            .collect()
    }

    #[test]
    fn median_even_and_odd() {
        let mut scratch = Vec::new();
        assert!((median(&[3.0, 1.0, 2.0], &mut scratch) - 2.0).abs() < f64::EPSILON);
        assert!((median(&[4.0, 1.0, 3.0, 2.0], &mut scratch) - 2.5).abs() < f64::EPSILON);
        assert_eq!(median(&[], &mut scratch), 0.0);
    }

    #[test]
    fn silence_yields_no_peaks() {
        let config = AnalyzerConfig::default();
        let mut analyzer = SpectralFrameAnalyzer::new(&config);
        let silence = vec![0.0f32; config.block_size];
        assert!(analyzer.detect(&silence).is_empty());
        // Just below the gate: mean square of 1e-6 amplitude is 1e-12.
        let faint = vec![1e-6f32; config.block_size];
        assert!(analyzer.detect(&faint).is_empty());
    }

    #[test]
    fn single_tone_detected_at_its_frequency() {
        let config = AnalyzerConfig::default();
        let fs = f64::from(config.sample_rate);
        let mut analyzer = SpectralFrameAnalyzer::new(&config);
        let block = tone(5000.0, 1.0, config.block_size, fs);

        // Leakage skirts may also clear the adaptive floor, but the
        // mainlobe bin must be among the peaks.
        let peaks = analyzer.detect(&block);
        let bin_hz = fs / config.block_size as f64;
        assert!(
            peaks.iter().any(|p| (p - 5000.0).abs() <= bin_hz),
            "no peak near 5000 Hz in {peaks:?}"
        );
    }

    #[test]
    fn peaks_stay_inside_the_band() {
        let config = AnalyzerConfig {
            band_min: 2000.0,
            band_max: 8000.0,
            ..AnalyzerConfig::default()
        };
        let fs = f64::from(config.sample_rate);
        let mut analyzer = SpectralFrameAnalyzer::new(&config);
        let mut block = tone(5000.0, 1.0, config.block_size, fs);
        let out_of_band = tone(15_000.0, 1.0, config.block_size, fs);
        for (a, b) in block.iter_mut().zip(out_of_band) {
            *a += b;
        }

        let peaks = analyzer.detect(&block);
        assert!(!peaks.is_empty());
        for p in &peaks {
            assert!((2000.0..=8000.0).contains(p), "out-of-band peak {p}");
        }
    }

    #[test]
    fn peaks_are_ascending() {
        let config = AnalyzerConfig::default();
        let fs = f64::from(config.sample_rate);
        let mut analyzer = SpectralFrameAnalyzer::new(&config);
        let mut block = tone(3000.0, 0.5, config.block_size, fs);
        let second = tone(9000.0, 0.5, config.block_size, fs);
        for (a, b) in block.iter_mut().zip(second) {
            *a += b;
        }

        let peaks = analyzer.detect(&block);
        assert!(peaks.windows(2).all(|w| w[0] < w[1]));
    }
}
