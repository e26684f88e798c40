// Spectral peak detection, track lifecycle, and ρ correlation scoring.

pub mod analyzer;
pub mod decode;
pub mod fft;
pub mod rho;
pub mod track;
pub mod tracker;
pub mod trial;
pub mod velocity;
