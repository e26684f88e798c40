use std::collections::BTreeMap;

use cs_core::config::AnalyzerConfig;

use crate::track::Track;
use crate::velocity;

/// A transient (track, peak) pairing considered during association.
#[derive(Clone, Copy, Debug)]
struct Candidate {
    dist: f64,
    track_id: u64,
    peak_idx: usize,
}

/// Owns all live tracks and runs the per-block lifecycle:
/// prediction, greedy association, spawning, and timeout retirement.
///
/// Matching is globally greedy nearest-neighbor: all in-tolerance
/// (track, peak) pairs are sorted by distance and committed first-come,
/// ties broken by track id then peak frequency. This approximates optimal
/// bipartite assignment; tracked peaks are normally separated well beyond
/// the tolerance radius, so mismatches are rare.
///
/// # Example
/// ```
/// use cs_core::config::AnalyzerConfig;
/// use cs_audio::tracker::TrackManager;
/// let mut tracker = TrackManager::new(&AnalyzerConfig::default());
/// tracker.process_block(&[1000.0, 2000.0]);
/// assert_eq!(tracker.len(), 2);
/// ```
pub struct TrackManager {
    tracks: BTreeMap<u64, Track>,
    /// Monotonically increasing id source; ids are never reused.
    next_id: u64,
    hop_secs: f64,
    tolerance_hz: f64,
    max_tracks: usize,
    timeout_blocks: u32,
    history_capacity: usize,
}

impl TrackManager {
    /// Build a track manager for the given configuration.
    #[must_use]
    pub fn new(config: &AnalyzerConfig) -> Self {
        Self {
            tracks: BTreeMap::new(),
            next_id: 0,
            hop_secs: config.hop_secs(),
            tolerance_hz: config.tolerance_hz(),
            max_tracks: config.max_tracks,
            timeout_blocks: config.timeout_blocks,
            history_capacity: config.history_capacity(),
        }
    }

    /// Drop all tracks and restart the id counter. Called once per trial.
    pub fn reset(&mut self) {
        self.tracks.clear();
        self.next_id = 0;
    }

    /// Live tracks, keyed by id.
    #[must_use]
    pub fn tracks(&self) -> &BTreeMap<u64, Track> {
        &self.tracks
    }

    /// Number of live tracks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// `true` if no tracks are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Advance all tracks by one block given the detected peaks
    /// (ascending frequencies, one per bin).
    ///
    /// Runs unconditionally even for an empty peak set so that miss
    /// counting and timeout retirement stay in step with the block clock.
    pub fn process_block(&mut self, peaks: &[f64]) {
        // 1. Predict and clear per-block match state.
        for track in self.tracks.values_mut() {
            let v = velocity::estimate(&track.history, self.hop_secs);
            track.predicted_f = track.f0 + v * self.hop_secs;
            track.seen = false;
        }

        // 2. All in-tolerance pairings. Tracks iterate in ascending id and
        // peaks are ascending, so construction order already agrees with
        // the (distance, track id, peak frequency) tie-break.
        let mut candidates: Vec<Candidate> = Vec::new();
        for (&track_id, track) in &self.tracks {
            for (peak_idx, &peak_f) in peaks.iter().enumerate() {
                let dist = (track.predicted_f - peak_f).abs();
                if dist < self.tolerance_hz {
                    candidates.push(Candidate {
                        dist,
                        track_id,
                        peak_idx,
                    });
                }
            }
        }
        candidates.sort_by(|a, b| {
            a.dist
                .total_cmp(&b.dist)
                .then(a.track_id.cmp(&b.track_id))
                .then(a.peak_idx.cmp(&b.peak_idx))
        });

        // 3. Greedy commit: both sides must still be unclaimed.
        let mut peak_claimed = vec![false; peaks.len()];
        for c in &candidates {
            if peak_claimed[c.peak_idx] {
                continue;
            }
            let Some(track) = self.tracks.get_mut(&c.track_id) else {
                continue;
            };
            if track.seen {
                continue;
            }
            let peak_f = peaks[c.peak_idx];
            track.f0 = peak_f;
            track.history.push(peak_f);
            track.seen = true;
            track.miss_count = 0;
            peak_claimed[c.peak_idx] = true;
            log::trace!(
                "track {} matched peak {peak_f:.1} Hz (dist {:.1} Hz)",
                c.track_id,
                c.dist
            );
        }

        // 4. Unmatched tracks age.
        for track in self.tracks.values_mut() {
            if !track.seen {
                track.miss_count += 1;
            }
        }

        // 5. Leftover peaks spawn tracks while capacity allows; beyond that
        // the detection is dropped, which is lossy but not an error.
        for (peak_idx, &peak_f) in peaks.iter().enumerate() {
            if peak_claimed[peak_idx] {
                continue;
            }
            if self.tracks.len() < self.max_tracks {
                self.next_id += 1;
                self.tracks
                    .insert(self.next_id, Track::new(peak_f, self.history_capacity));
                log::trace!("spawned track {} at {peak_f:.1} Hz", self.next_id);
            } else {
                log::debug!("track capacity full, dropping peak {peak_f:.1} Hz");
            }
        }

        // 6. Retire timed-out tracks.
        let timeout = self.timeout_blocks;
        self.tracks.retain(|id, track| {
            let live = track.miss_count < timeout;
            if !live {
                log::trace!("track {id} timed out");
            }
            live
        });
    }
}
