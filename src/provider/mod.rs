pub mod client;
pub mod error;
pub mod extract;
pub mod types;

pub use client::{ProviderClient, TaskProvider};
pub use error::ProviderError;
pub use extract::TaskStatus;
pub use types::GenerationRequest;
