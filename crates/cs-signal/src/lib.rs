// Synthetic multi-tone stimulus generators for chirpscope experiments.

pub mod multitone;

pub use multitone::{stationary_multitone, swept_multitone, ToneBank};
