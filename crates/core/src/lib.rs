//! Core logic: agents, tasks, the crew that runs them, and the model client
//! they share.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod agent;
mod crew;
mod error;
mod model_client;
mod task;

pub use agent::{Agent, AgentBuilder};
pub use crew::{Crew, CrewBuilder, CrewOutput};
pub use error::{Error, ErrorKind};
pub use model_client::{ModelClient, ModelClientResponse};
pub use task::{Task, TaskOutput};
