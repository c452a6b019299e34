//! The `ChatProvider` trait -- the seam between plan generation and the
//! network.

use async_trait::async_trait;

use super::{ChatRequest, ProviderError};

/// A chat-completion capability.
///
/// Implementations make exactly one upstream call per [`complete`] and do
/// not retry; retry policy belongs to the caller. The trait is object-safe
/// so it can be shared as `Arc<dyn ChatProvider>`.
///
/// [`complete`]: ChatProvider::complete
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Short provider name for logs and the health endpoint.
    fn name(&self) -> &str;

    /// Whether a credential is available. Checked once per generation,
    /// before any call is made.
    fn has_credentials(&self) -> bool;

    /// Run one completion and return the text of the first choice.
    ///
    /// A missing or null message body comes back as an empty string.
    async fn complete(&self, request: ChatRequest) -> Result<String, ProviderError>;
}

// Compile-time assertion: ChatProvider must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn ChatProvider) {}
};
