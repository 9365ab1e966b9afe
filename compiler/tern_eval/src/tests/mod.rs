//! End-to-end frame scenarios.
//!
//! `helper` holds a small step driver for a subset of the language; the
//! scenario modules run programs through it and check what the frame stack,
//! scopes and heap did along the way.

mod helper;
mod limits_tests;
