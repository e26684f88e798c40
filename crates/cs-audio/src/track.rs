/// Fixed-capacity ring buffer of frequency samples, oldest overwritten first.
///
/// # Example
/// ```
/// use cs_audio::track::FreqHistory;
/// let mut h = FreqHistory::new(3);
/// for f in [1.0, 2.0, 3.0, 4.0] {
///     h.push(f);
/// }
/// assert_eq!(h.len(), 3);
/// assert_eq!(h.last_n(2), vec![3.0, 4.0]);
/// ```
#[derive(Clone, Debug)]
pub struct FreqHistory {
    buf: Vec<f64>,
    /// Next write position.
    head: usize,
    len: usize,
}

impl FreqHistory {
    /// Create an empty history with the given fixed capacity.
    ///
    /// # Panics
    /// Panics if `capacity` is 0.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "history capacity must be > 0");
        Self {
            buf: vec![0.0; capacity],
            head: 0,
            len: 0,
        }
    }

    /// Append a sample, overwriting the oldest entry once full.
    pub fn push(&mut self, value: f64) {
        self.buf[self.head] = value;
        self.head = (self.head + 1) % self.buf.len();
        self.len = (self.len + 1).min(self.buf.len());
    }

    /// Number of stored samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` if no samples are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Fixed capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Most recently pushed sample.
    #[must_use]
    pub fn last(&self) -> Option<f64> {
        if self.len == 0 {
            return None;
        }
        let cap = self.buf.len();
        Some(self.buf[(self.head + cap - 1) % cap])
    }

    /// The most recent `n` samples in insertion order (oldest first).
    /// Returns fewer than `n` if the history is shorter.
    #[must_use]
    pub fn last_n(&self, n: usize) -> Vec<f64> {
        let take = n.min(self.len);
        let cap = self.buf.len();
        let start = (self.head + cap - take) % cap;
        (0..take).map(|i| self.buf[(start + i) % cap]).collect()
    }
}

/// A persistent identity for a spectral peak, carried across blocks.
///
/// Owned and mutated exclusively by the `TrackManager`.
#[derive(Clone, Debug)]
pub struct Track {
    /// Current frequency estimate (Hz); equals the last history entry.
    pub f0: f64,
    /// Bounded trajectory of matched peak frequencies.
    pub history: FreqHistory,
    /// Consecutive blocks without a match.
    pub miss_count: u32,
    /// Matched in the current block.
    pub seen: bool,
    /// Frequency predicted for the current block before association.
    pub predicted_f: f64,
}

impl Track {
    /// Create a track seeded with a single detected peak.
    #[must_use]
    pub fn new(peak_f: f64, history_capacity: usize) -> Self {
        let mut history = FreqHistory::new(history_capacity);
        history.push(peak_f);
        Self {
            f0: peak_f,
            history,
            miss_count: 0,
            seen: true,
            predicted_f: peak_f,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_overwrites_oldest() {
        let mut h = FreqHistory::new(4);
        for i in 0..10 {
            h.push(f64::from(i));
        }
        assert_eq!(h.len(), 4);
        assert_eq!(h.capacity(), 4);
        assert_eq!(h.last_n(4), vec![6.0, 7.0, 8.0, 9.0]);
        assert_eq!(h.last(), Some(9.0));
    }

    #[test]
    fn last_n_short_history() {
        let mut h = FreqHistory::new(8);
        h.push(440.0);
        h.push(441.0);
        assert_eq!(h.last_n(5), vec![440.0, 441.0]);
    }

    #[test]
    fn new_track_is_seen_with_seeded_history() {
        let t = Track::new(1000.0, 50);
        assert!(t.seen);
        assert_eq!(t.miss_count, 0);
        assert_eq!(t.history.len(), 1);
        assert_eq!(t.history.last(), Some(1000.0));
        assert!((t.f0 - 1000.0).abs() < f64::EPSILON);
    }
}
