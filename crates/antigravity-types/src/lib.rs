//! # Antigravity Types
//!
//! Core types, protocol models, and error definitions for the Antigravity
//! gateway.
//!
//! This crate provides the foundational type system for the gateway:
//!
//! - **`error`** - The gateway error taxonomy (auth, rate limit, quota, pool)
//! - **`models`** - Domain models (Account, model family, pool status)
//! - **`protocol`** - OpenAI/Gemini protocol message types
//!
//! ## Architecture Role
//!
//! `antigravity-types` sits at the bottom of the dependency graph:
//!
//! ```text
//!     antigravity-types (this crate)
//!             │
//!             ▼
//!     antigravity-gateway
//! ```
//!
//! All types are designed to be:
//! - **Serializable** via serde for API/IPC
//! - **Clone** for cheap sharing across async boundaries
//! - **PartialEq** for testing and comparison

pub mod error;
pub mod models;
pub mod protocol;

// Re-export error types for convenience
pub use error::{GatewayError, Result};

// Re-export core model types
pub use models::{Account, AccountStatus, AccountsFile, ModelFamily, PoolStatus};
