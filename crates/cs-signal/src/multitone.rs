use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A bank of evenly spaced starting frequencies.
#[derive(Clone, Copy, Debug)]
pub struct ToneBank {
    /// Number of simultaneous tones.
    pub count: usize,
    /// Lowest starting frequency (Hz).
    pub f_min: f64,
    /// Highest starting frequency (Hz).
    pub f_max: f64,
}

impl ToneBank {
    /// Starting frequencies, linearly spaced over `[f_min, f_max]`.
    #[must_use]
    pub fn frequencies(&self) -> Vec<f64> {
        if self.count <= 1 {
            return vec![self.f_min];
        }
        let step = (self.f_max - self.f_min) / (self.count - 1) as f64;
        (0..self.count).map(|i| self.f_min + step * i as f64).collect()
    }
}

/// Stationary multi-tone stimulus (control protocol).
///
/// Each tone has amplitude `1 / count` and a uniformly random starting
/// phase drawn from the seeded generator. The output is normalized to
/// unit RMS.
///
/// # Example
/// ```
/// use cs_signal::{stationary_multitone, ToneBank};
/// let bank = ToneBank { count: 50, f_min: 1000.0, f_max: 15_000.0 };
/// let samples = stationary_multitone(1.0, 48_000, &bank, 7);
/// assert_eq!(samples.len(), 48_000);
/// ```
#[must_use]
pub fn stationary_multitone(
    duration_secs: f64,
    sample_rate: u32,
    bank: &ToneBank,
    seed: u64,
) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let phases: Vec<f64> = (0..bank.count)
        .map(|_| rng.random_range(0.0..std::f64::consts::TAU))
        .collect();
    render(duration_secs, sample_rate, bank, 0.0, &phases)
}

/// Frequency-swept multi-tone stimulus (chirp protocol).
///
/// Every tone sweeps upward at `chirp_rate` Hz/s from its starting
/// frequency: the instantaneous phase is `2π(f₀·t + ½·rate·t²) + φ`.
/// Starting phases are zero-aligned when `phase_seed` is `None`, or
/// uniformly randomized from the seed otherwise. Unit RMS output.
///
/// # Example
/// ```
/// use cs_signal::{swept_multitone, ToneBank};
/// let bank = ToneBank { count: 50, f_min: 1000.0, f_max: 15_000.0 };
/// let samples = swept_multitone(1.0, 48_000, 500.0, &bank, Some(7));
/// assert_eq!(samples.len(), 48_000);
/// ```
#[must_use]
pub fn swept_multitone(
    duration_secs: f64,
    sample_rate: u32,
    chirp_rate: f64,
    bank: &ToneBank,
    phase_seed: Option<u64>,
) -> Vec<f32> {
    let phases: Vec<f64> = match phase_seed {
        Some(seed) => {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..bank.count)
                .map(|_| rng.random_range(0.0..std::f64::consts::TAU))
                .collect()
        }
        None => vec![0.0; bank.count],
    };
    render(duration_secs, sample_rate, bank, chirp_rate, &phases)
}

/// Sum the tone bank into a unit-RMS f32 buffer.
fn render(
    duration_secs: f64,
    sample_rate: u32,
    bank: &ToneBank,
    chirp_rate: f64,
    phases: &[f64],
) -> Vec<f32> {
    let total = (duration_secs * f64::from(sample_rate)) as usize;
    let freqs = bank.frequencies();
    let amp = 1.0 / bank.count.max(1) as f64;
    let fs = f64::from(sample_rate);

    let mut signal = vec![0.0f64; total];
    for (&f0, &phase) in freqs.iter().zip(phases) {
        for (i, sample) in signal.iter_mut().enumerate() {
            let t = i as f64 / fs;
            let arg = std::f64::consts::TAU * (f0 * t + 0.5 * chirp_rate * t * t) + phase;
            *sample += amp * arg.sin();
        }
    }

    // Normalize to unit RMS.
    let mean_sq = signal.iter().map(|s| s * s).sum::<f64>() / total.max(1) as f64;
    let rms = mean_sq.sqrt();
    if rms > 0.0 {
        for sample in &mut signal {
            *sample /= rms;
        }
    } else {
        log::warn!("generated stimulus has zero energy, skipping normalization");
    }

    signal.into_iter().map(|s| s as f32).collect()
}
