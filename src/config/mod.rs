pub mod env;

pub use env::{EnvFileStore, MemoryStore, OAuthConfig, TokenStore};
