pub mod client;
pub mod error;
pub mod types;

pub use client::{JobStore, StoreClient};
pub use error::StoreError;
pub use types::{FinalizeUpload, StatusUpdate};
