use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use cs_audio::trial::TrialProcessor;
use cs_core::config::Config;
use cs_signal::{stationary_multitone, swept_multitone, ToneBank};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::results::{ResultsLog, TrialRecord};

/// One scheduled trial. The nominal rate is what gets logged; jitter is
/// applied only to the generated stimulus.
#[derive(Clone, Copy, Debug)]
struct Task {
    trial_id: usize,
    nominal_rate: f64,
}

impl Task {
    /// Condition label: "A" for the stationary control, "B" for swept.
    fn condition(self) -> &'static str {
        if self.nominal_rate == 0.0 { "A" } else { "B" }
    }
}

/// Run the full chirp-rate sweep: generate each stimulus, render it to a
/// temporary WAV, analyze it as one trial, and append the summary row.
///
/// Failed trials (unreadable file, sample-rate mismatch) are logged and
/// skipped; they write no row.
///
/// # Errors
/// Returns an error for setup failures (invalid config, temp dir or
/// results file unavailable), not for individual trial failures.
pub fn run(config: &Config, output: &Path, seed: Option<u64>) -> Result<()> {
    config.analyzer.validate()?;
    config.experiment.validate()?;

    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    };

    let exp = &config.experiment;
    let mut tasks: Vec<Task> = Vec::with_capacity(exp.chirp_rates.len() * exp.trials_per_rate);
    for &rate in &exp.chirp_rates {
        for _ in 0..exp.trials_per_rate {
            tasks.push(Task {
                trial_id: tasks.len() + 1,
                nominal_rate: rate,
            });
        }
    }
    tasks.shuffle(&mut rng);

    let jitter = if exp.chirp_jitter_sigma > 0.0 {
        Some(
            Normal::new(0.0, exp.chirp_jitter_sigma)
                .map_err(|e| anyhow::anyhow!("invalid jitter sigma: {e}"))?,
        )
    } else {
        None
    };

    let bank = ToneBank {
        count: exp.tone_count,
        f_min: exp.tone_min_hz,
        f_max: exp.tone_max_hz,
    };
    let sample_rate = config.analyzer.sample_rate;

    let results = ResultsLog::new(output);
    let mut processor = TrialProcessor::new(&config.analyzer)?;
    let temp_dir = tempfile::tempdir().context("cannot create temp directory")?;

    let total = tasks.len();
    for (i, task) in tasks.iter().enumerate() {
        let samples = if task.nominal_rate == 0.0 {
            stationary_multitone(exp.duration_secs, sample_rate, &bank, rng.random())
        } else {
            let mut effective = task.nominal_rate;
            if let Some(dist) = &jitter {
                effective = (effective + dist.sample(&mut rng)).max(0.0);
            }
            let phase_seed = exp.vary_phases.then(|| rng.random());
            swept_multitone(exp.duration_secs, sample_rate, effective, &bank, phase_seed)
        };

        let wav_path = temp_dir.path().join(format!("task_{}.wav", i + 1));
        write_wav(&wav_path, &samples, sample_rate)?;

        log::info!(
            "trial {}/{total}: condition {}, nominal rate {} Hz/s",
            i + 1,
            task.condition(),
            task.nominal_rate
        );

        match processor.process_file(&wav_path) {
            Ok(rho) => {
                log::info!("trial {} done: mean |ρ| = {rho:.4}", task.trial_id);
                results.append(&TrialRecord {
                    trial_id: task.trial_id,
                    condition: task.condition().to_string(),
                    chirp_rate: task.nominal_rate,
                    rho_mean_abs: rho,
                    timestamp: Utc::now().to_rfc3339(),
                })?;
            }
            Err(e) => {
                log::warn!("trial {} skipped: {e:#}", task.trial_id);
            }
        }

        if let Err(e) = std::fs::remove_file(&wav_path) {
            log::warn!("cannot remove {}: {e}", wav_path.display());
        }
    }

    log::info!("experiment complete, results in {}", output.display());
    Ok(())
}

/// Write mono f32 samples as a 32-bit float WAV file.
fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("cannot create {}", path.display()))?;
    for &s in samples {
        writer.write_sample(s)?;
    }
    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cs_core::config::ExperimentConfig;

    #[test]
    fn condition_labels() {
        let a = Task {
            trial_id: 1,
            nominal_rate: 0.0,
        };
        let b = Task {
            trial_id: 2,
            nominal_rate: 250.0,
        };
        assert_eq!(a.condition(), "A");
        assert_eq!(b.condition(), "B");
    }

    #[test]
    fn small_sweep_end_to_end() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let output = dir.path().join("results.csv");

        let config = Config {
            experiment: ExperimentConfig {
                chirp_rates: vec![0.0, 500.0],
                trials_per_rate: 1,
                duration_secs: 1.5,
                tone_count: 5,
                chirp_jitter_sigma: 0.0,
                ..ExperimentConfig::default()
            },
            ..Config::default()
        };

        run(&config, &output, Some(7))?;

        let content = std::fs::read_to_string(&output)?;
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3, "header + one row per trial:\n{content}");
        assert!(lines[0].starts_with("trial_id,"));
        assert!(content.contains(",A,0"));
        assert!(content.contains(",B,500"));
        Ok(())
    }

    #[test]
    fn mismatched_rate_writes_no_row() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let wav_path = dir.path().join("wrong_rate.wav");
        let samples = vec![0.1f32; 44_100];
        write_wav(&wav_path, &samples, 44_100)?;

        let config = Config::default(); // analyzer expects 48 kHz
        let mut processor = TrialProcessor::new(&config.analyzer)?;
        assert!(processor.process_file(&wav_path).is_err());
        Ok(())
    }
}
