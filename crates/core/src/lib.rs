//! # SimpleChat Core
//!
//! Domain types, traits, and error definitions for the SimpleChat chat facade.
//! This crate has **zero framework dependencies**: it defines the domain model
//! that the provider, memory, client and gateway crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator of the chat pipeline (LLM provider, conversation memory,
//! structured output shape) is a trait here. Implementations live in their
//! respective crates, so tests can swap in scripted providers and in-process
//! memory without touching the pipeline.

pub mod error;
pub mod message;
pub mod options;
pub mod provider;
pub mod memory;
pub mod output;
pub mod emotion;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use message::{Message, Role, ConversationId};
pub use options::ChatOptions;
pub use provider::{Provider, ProviderRequest, ChatResponse, ChunkReceiver, StreamChunk, Usage};
pub use memory::ChatMemory;
pub use output::StructuredOutput;
pub use emotion::{Emotion, EmotionEvaluation};
