//! An abstraction layer for hosted text-generation models.
//!
//! This crate establishes the protocol the agent layer uses to talk to a
//! model provider, so that the agent can switch between a real hosted
//! service and a local fake without modifying the core codebase.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod info;
mod provider;
mod request;
mod response;

pub use error::*;
pub use info::*;
pub use provider::*;
pub use request::*;
pub use response::*;
