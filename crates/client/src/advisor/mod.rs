//! Advisors: interceptors that wrap every exchange with a provider.
//!
//! An advisor sees the request on the way in (`before`) and the response on
//! the way out (`after`). A client runs its chain as an onion:
//!
//! ```text
//!   before: memory → logger → provider
//!   after:  provider → logger → memory
//! ```
//!
//! For streaming exchanges `after` receives the aggregated response once the
//! final chunk has been forwarded. A stream the consumer abandons never
//! reaches `after`.

mod logger;
mod memory;

pub use logger::LoggingAdvisor;
pub use memory::MemoryAdvisor;

use async_trait::async_trait;
use simplechat_core::error::Result;
use simplechat_core::memory::ChatMemory;
use simplechat_core::message::{ConversationId, Message, Role};
use simplechat_core::options::ChatOptions;
use simplechat_core::provider::{ChatResponse, ProviderRequest};
use std::sync::Arc;

// ── Request ───────────────────────────────────────────────────────────────

/// A request as it travels through the advisor chain.
#[derive(Debug, Clone)]
pub struct AdvisedRequest {
    /// Conversation key; memory is partitioned by it.
    pub conversation_id: ConversationId,

    pub messages: Vec<Message>,

    /// Options after merging the prompt's over the client defaults.
    pub options: ChatOptions,

    /// Output-format instructions added to the last user message at
    /// dispatch. Kept separate so memory stores what the user typed.
    pub format_instructions: Option<String>,
}

impl AdvisedRequest {
    /// The request the provider receives.
    pub fn to_provider_request(&self) -> ProviderRequest {
        let mut messages = self.messages.clone();
        if let Some(instructions) = &self.format_instructions {
            if let Some(user) = messages.iter_mut().rev().find(|m| m.role == Role::User) {
                user.content = format!("{}\n\n{instructions}", user.content);
            }
        }
        ProviderRequest {
            messages,
            options: self.options.clone(),
        }
    }
}

// ── Advisor trait ─────────────────────────────────────────────────────────

#[async_trait]
pub trait Advisor: Send + Sync {
    fn name(&self) -> &str;

    async fn before(&self, request: AdvisedRequest) -> Result<AdvisedRequest> {
        Ok(request)
    }

    async fn after(&self, _request: &AdvisedRequest, response: ChatResponse) -> Result<ChatResponse> {
        Ok(response)
    }
}

// ── Chain ─────────────────────────────────────────────────────────────────

/// An ordered list of advisors attached to one client.
#[derive(Clone, Default)]
pub struct AdvisorChain {
    advisors: Vec<Arc<dyn Advisor>>,
}

impl AdvisorChain {
    pub fn new(advisors: Vec<Arc<dyn Advisor>>) -> Self {
        Self { advisors }
    }

    pub fn names(&self) -> Vec<&str> {
        self.advisors.iter().map(|a| a.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.advisors.is_empty()
    }

    pub async fn before(&self, mut request: AdvisedRequest) -> Result<AdvisedRequest> {
        for advisor in &self.advisors {
            request = advisor.before(request).await?;
        }
        Ok(request)
    }

    pub async fn after(&self, request: &AdvisedRequest, mut response: ChatResponse) -> Result<ChatResponse> {
        for advisor in self.advisors.iter().rev() {
            response = advisor.after(request, response).await?;
        }
        Ok(response)
    }
}

impl std::fmt::Debug for AdvisorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

// ── Advisor set ───────────────────────────────────────────────────────────

/// What an advisor in an [`AdvisorSet`] is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvisorRole {
    Memory,
    Logging,
    Custom,
}

/// The application's advisors, tagged by role.
///
/// Clients take a view of the set: [`AdvisorSet::full`] for every advisor,
/// [`AdvisorSet::silent`] for everything except logging.
#[derive(Clone, Default)]
pub struct AdvisorSet {
    entries: Vec<(AdvisorRole, Arc<dyn Advisor>)>,
}

impl AdvisorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Memory first, then the logger.
    pub fn standard(memory: Arc<dyn ChatMemory>) -> Self {
        Self::new()
            .with(AdvisorRole::Memory, Arc::new(MemoryAdvisor::new(memory)))
            .with(AdvisorRole::Logging, Arc::new(LoggingAdvisor::new()))
    }

    pub fn with(mut self, role: AdvisorRole, advisor: Arc<dyn Advisor>) -> Self {
        self.entries.push((role, advisor));
        self
    }

    pub fn full(&self) -> AdvisorChain {
        AdvisorChain::new(self.entries.iter().map(|(_, a)| a.clone()).collect())
    }

    pub fn silent(&self) -> AdvisorChain {
        AdvisorChain::new(
            self.entries
                .iter()
                .filter(|(role, _)| *role != AdvisorRole::Logging)
                .map(|(_, a)| a.clone())
                .collect(),
        )
    }

    pub fn roles(&self) -> Vec<AdvisorRole> {
        self.entries.iter().map(|(role, _)| *role).collect()
    }
}
