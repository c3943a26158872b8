//! # Antigravity Gateway
//!
//! Multi-account gateway core for the Antigravity Cloud Code API.
//!
//! The gateway accepts chat-completion requests in the OpenAI schema and
//! dispatches them to the Cloud Code upstream under OAuth-bearer
//! authentication, pooling several independently authorized accounts.
//!
//! ## Architecture
//!
//! ```text
//! caller request
//!       │
//!       ▼
//!   Dispatcher ──► AccountManager ──► RateLimitLedger (cooldowns)
//!       │               │
//!       │               └──► Authenticator ──► TokenCache / ProjectCache
//!       │                         │                  │
//!       │                         └──► OAuthClient ──┘ (refresh, discovery)
//!       ▼
//!   mappers (OpenAI ↔ Google-Content) ──► upstream endpoints (fallback order)
//! ```
//!
//! Every component is safe to share across concurrent dispatches; see the
//! individual modules for the locking granularity.

pub mod account;
pub mod auth;
pub mod common;
pub mod config;
pub mod dispatch;
pub mod mappers;
pub mod rate_limit;

// Re-export the main entry points
pub use account::{AccountManager, AccountStore};
pub use config::{GatewayConfig, OAuthSettings};
pub use dispatch::Dispatcher;
