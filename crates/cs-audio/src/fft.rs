use realfft::RealFftPlanner;

/// FFT pipeline: windowed real FFT using realfft.
///
/// Pre-allocates the FFT plan and scratch buffers for zero-allocation
/// reuse across blocks.
///
/// # Example
/// ```
/// use cs_audio::fft::FftPipeline;
/// let fft = FftPipeline::new(4096);
/// ```
pub struct FftPipeline {
    fft_size: usize,
    input_buf: Vec<f32>,
    spectrum_buf: Vec<realfft::num_complex::Complex<f32>>,
    scratch: Vec<realfft::num_complex::Complex<f32>>,
    plan: std::sync::Arc<dyn realfft::RealToComplex<f32>>,
    /// Hann window coefficients.
    window: Vec<f32>,
}

impl FftPipeline {
    /// Create a new FFT pipeline with the given block size.
    ///
    /// # Panics
    /// Panics if `size` is 0.
    #[must_use]
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "FFT size must be > 0");

        let mut planner = RealFftPlanner::<f32>::new();
        let plan = planner.plan_fft_forward(size);

        let input_buf = plan.make_input_vec();
        let spectrum_buf = plan.make_output_vec();
        let scratch = plan.make_scratch_vec();

        // Hann window
        let window: Vec<f32> = (0..size)
            .map(|i| {
                0.5 * (1.0
                    - (2.0 * std::f32::consts::PI * i as f32 / (size as f32 - 1.0)).cos())
            })
            .collect();

        Self {
            fft_size: size,
            input_buf,
            spectrum_buf,
            scratch,
            plan,
            window,
        }
    }

    /// Process `samples` through the windowed FFT.
    ///
    /// Writes the magnitude spectrum (N/2+1 bins) into `magnitudes`,
    /// resizing it as needed. Short input is zero-padded.
    pub fn process_into(&mut self, samples: &[f32], magnitudes: &mut Vec<f32>) {
        let n = self.fft_size.min(samples.len());

        // Copy and window
        for (i, slot) in self.input_buf.iter_mut().enumerate() {
            *slot = if i < n {
                samples[i] * self.window[i]
            } else {
                0.0
            };
        }

        magnitudes.clear();
        if self
            .plan
            .process_with_scratch(&mut self.input_buf, &mut self.spectrum_buf, &mut self.scratch)
            .is_err()
        {
            magnitudes.resize(self.spectrum_buf.len(), 0.0);
            return;
        }

        magnitudes.extend(
            self.spectrum_buf
                .iter()
                .map(|c| (c.re * c.re + c.im * c.im).sqrt()),
        );
    }

    /// FFT block size.
    #[must_use]
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of spectrum bins (N/2 + 1).
    #[must_use]
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bin_count() {
        let mut fft = FftPipeline::new(256);
        let mut mags = Vec::new();
        let silence = vec![0.0f32; 256];
        fft.process_into(&silence, &mut mags);
        assert_eq!(mags.len(), 129); // N/2 + 1
    }

    #[test]
    fn tone_lands_in_expected_bin() {
        let size = 1024;
        let sample_rate = 48_000.0f32;
        let bin_hz = sample_rate / size as f32;
        let freq = bin_hz * 100.0; // exactly bin 100
        let samples: Vec<f32> = (0..size)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate).sin())
            .collect();

        let mut fft = FftPipeline::new(size);
        let mut mags = Vec::new();
        fft.process_into(&samples, &mut mags);

        let peak_bin = mags
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i);
        assert_eq!(peak_bin, Some(100));
    }
}
