//! A blog writer backed by the Gemini API.
//!
//! The crate includes a CLI tool for using in the terminal. The commands it
//! runs live in [`commands`] and only depend on a [`core::ModelClient`], so
//! they can be driven by any model provider.

#![deny(missing_docs)]

#[allow(unused_imports)]
#[macro_use]
extern crate tracing;

pub mod commands;
mod printer;

pub use printer::{CLOSING_BANNER, Printer};

/// Re-exports of [`quill_core`] crate.
pub mod core {
    pub use quill_core::*;
}
