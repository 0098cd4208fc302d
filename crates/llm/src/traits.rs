use tw_domain::error::Result;

/// Trait every summary-generation adapter must implement.
///
/// Implementations are provider-specific adapters (Google Gemini,
/// OpenAI) that translate an instruction plus serialized entity content
/// into one completed text response. No streaming, no tool use; a
/// summary is a single round trip.
#[async_trait::async_trait]
pub trait Summarizer: Send + Sync {
    /// Generate a completion for `content` under the given `instruction`.
    ///
    /// `instruction` is the task framing (the configured prompt) and
    /// `content` is the entity serialized as JSON. Returns the model's
    /// text verbatim.
    async fn generate(&self, instruction: &str, content: &str) -> Result<String>;

    /// A unique identifier for this provider instance.
    fn provider_id(&self) -> &str;
}
