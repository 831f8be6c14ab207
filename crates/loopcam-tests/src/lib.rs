//! Integration test crate for LoopCam.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on the loopcam crates to verify they work together.

#[cfg(test)]
mod crossfade;

#[cfg(test)]
mod encoder;

#[cfg(test)]
mod session;
