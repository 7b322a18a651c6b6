#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Filesystem and path helpers shared by the optdeps crates.
//!
//! Pure functions only; logging happens in the callers.

pub mod fs;
pub mod path;
