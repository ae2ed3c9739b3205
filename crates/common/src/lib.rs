//! Shared types for the force-auth workspace

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
