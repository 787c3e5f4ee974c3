//! Common utilities for the extended CSS selector engine.
//!
//! This crate provides shared infrastructure used by all engine components:
//! - **Warning System** - colored terminal output for recoverable problems
//!   (swallowed `:is()` branches, legacy syntax rewrites, host rejections)

pub mod warning;
