pub mod oauth;
pub mod token;

pub use oauth::{OAuthExchange, TokenResponse};
pub use token::{Credentials, TokenManager, TokenManagerBuilder, TokenPair, TokenState};
