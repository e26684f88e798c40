// Configuration and shared error types for chirpscope.

pub mod config;
pub mod error;
