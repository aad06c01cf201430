// llm-client-rs/src/lib.rs
// Model-call collaborator for scenario generation

mod llm_client;
mod prompt;

#[cfg(test)]
mod tests;

pub use llm_client::{AnthropicClient, LLMError, ModelClient, ANTHROPIC_VERSION};
pub use prompt::{build_system_prompt, build_system_prompt_with};
