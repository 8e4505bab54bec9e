//! Chat-completion provider implementations for SimpleChat.
//!
//! All providers implement the `simplechat_core::Provider` trait.
//! [`router::build_from_config`] picks the base URL and credentials from
//! configuration.

pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use router::build_from_config;
