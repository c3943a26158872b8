//! Core domain models for the Antigravity gateway.
//!
//! This module contains the data structures shared between the account pool,
//! the OAuth lifecycle, and the dispatcher.

mod account;
mod model_family;
mod status;

// Re-export all models
pub use account::{Account, AccountsFile};
pub use model_family::ModelFamily;
pub use status::{AccountStatus, PoolStatus};
