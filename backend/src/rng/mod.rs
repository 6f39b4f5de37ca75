//! Deterministic random number generation
//!
//! Uses the xorshift64* algorithm for fast, deterministic random numbers.
//! CRITICAL: All randomness in the model (simulated observation error,
//! MCMC proposals) MUST go through this module.

mod xorshift;

pub use xorshift::RngManager;
