//! # SimpleChat Client
//!
//! The request pipeline between the transport layer and a provider:
//!
//! - [`prompt`] turns a request body into an ordered message list
//! - [`advisor`] holds the interceptors (memory, logging) wrapped around
//!   every exchange
//! - [`client::ChatClient`] runs one prompt through its advisors and the
//!   provider, as a single reply, a stream, or a typed entity
//! - [`service::ChatService`] is the facade the gateway and CLI call

pub mod advisor;
pub mod client;
pub mod prompt;
pub mod service;

#[cfg(test)]
mod test_helpers;

pub use advisor::{Advisor, AdvisorChain, AdvisorRole, AdvisorSet, LoggingAdvisor, MemoryAdvisor};
pub use client::{ChatClient, ContentStream};
pub use prompt::{Prompt, PromptBody};
pub use service::ChatService;
