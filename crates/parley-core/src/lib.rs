pub mod config;
pub mod error;

pub use config::{ParleyConfig, ReplyProviderKind};
pub use error::{ParleyError, Result};
