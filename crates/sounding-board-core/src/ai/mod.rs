pub mod azure;

pub use azure::{with_system_prompt, AzureOpenAIClient};
