//! # Revizto v5 Rust Crate
//!
//! Uma biblioteca Rust para integração com a API v5 do Revizto.
//!
//! ## Features
//!
//! - Gerenciamento do ciclo de vida de tokens OAuth2 (cache, validação,
//!   renovação) por região
//! - Persistência durável de tokens entre execuções via store chave-valor
//!   injetável
//! - Cliente HTTP síncrono autenticado para os endpoints de recursos
//! - Tratamento de erros por categoria (validação, permissão, transitório)
//!
//! ## Exemplo
//!
//! ```no_run
//! use revizto_v5::{EnvFileStore, OAuthConfig, TokenManager};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut manager = TokenManager::builder("us")
//!         .oauth(OAuthConfig::new("client_id", "https://app.example.com/callback"))
//!         .store(EnvFileStore::new(".env")?)
//!         .build()?;
//!
//!     let tokens = manager.get_tokens(Some("codigo_de_autorizacao"))?;
//!     println!("Token obtido: {}", tokens.access_token);
//!
//!     let client = manager.resource_client()?;
//!     let licenses = client.get("user/licenses", &[])?;
//!     println!("{}", licenses);
//!     Ok(())
//! }
//! ```

/// Módulo de autenticação OAuth2
pub mod auth;

/// Módulo de cliente API
pub mod client;

/// Módulo de configuração e persistência
pub mod config;

/// Módulo de tratamento de erros
pub mod error;

// Re-exportações para conveniência
pub use auth::{Credentials, TokenManager, TokenManagerBuilder, TokenPair, TokenState};
pub use client::ReviztoClient;
pub use config::{EnvFileStore, MemoryStore, OAuthConfig, TokenStore};
pub use error::{AuthError, AuthResult};
