pub mod gateway;
pub mod ollama;
pub mod openai;
pub mod prompts;
pub mod provider;
pub mod types;

pub use gateway::{GatewayError, LlmGateway};
pub use provider::LlmProvider;
pub use types::{ImageExtraction, Intent, IntentResult};
