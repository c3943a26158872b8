//! OAuth credential lifecycle: PKCE authorization, token refresh, caches,
//! project discovery, and account onboarding.

pub mod authenticator;
pub mod caches;
pub mod callback;
pub mod oauth;
pub mod pkce;

pub use authenticator::{AddedAccount, Authenticator};
pub use caches::{ProjectCache, TokenCache};
pub use oauth::OAuthClient;
