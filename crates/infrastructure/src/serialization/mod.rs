//! JSON helpers for the files this crate writes.
//!
//! Output is pretty-printed with 2-space indentation and a trailing newline,
//! so token and config files stay readable when opened by hand.

mod json;

pub use json::*;
