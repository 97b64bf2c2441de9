use crate::error::{AuthError, AuthResult};
use dotenv::dotenv;
use std::collections::HashMap;
use std::env;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Identidade do cliente OAuth2 junto à API do Revizto.
///
/// Imutável após a construção; `state` e `scope` só são enviados no grant de
/// código de autorização quando configurados.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub redirect_uri: String,
    pub state: Option<String>,
    pub scope: Option<String>,
}

impl OAuthConfig {
    /// Cria uma configuração com os campos obrigatórios
    pub fn new(client_id: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            state: None,
            scope: None,
        }
    }

    /// Define o parâmetro `state` enviado no grant de autorização
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Define o escopo solicitado no grant de autorização
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Carrega as configurações das variáveis de ambiente (e do arquivo .env
    /// em desenvolvimento)
    pub fn from_env() -> AuthResult<Self> {
        // Durante testes, os testes configuram as variáveis diretamente
        if cfg!(not(test)) && Path::new(".env").exists() {
            dotenv().map_err(|e| AuthError::config_error(format!("Erro ao carregar .env: {}", e)))?;
        }

        let client_id = Self::get_env_var("REVIZTO_CLIENT_ID")?;
        let redirect_uri = Self::get_env_var("REVIZTO_REDIRECT_URI")?;

        Ok(Self {
            client_id,
            redirect_uri,
            state: env::var("REVIZTO_STATE").ok().filter(|v| !v.is_empty()),
            scope: env::var("REVIZTO_SCOPE").ok().filter(|v| !v.is_empty()),
        })
    }

    /// Obtém variável de ambiente obrigatória
    fn get_env_var(key: &str) -> AuthResult<String> {
        env::var(key).map_err(|_| AuthError::config_error(format!("{} não encontrado", key)))
    }

    /// Valida se as configurações obrigatórias estão presentes
    pub fn validate(&self) -> AuthResult<()> {
        if self.client_id.is_empty() {
            return Err(AuthError::config_error("client_id é obrigatório"));
        }

        if self.redirect_uri.is_empty() {
            return Err(AuthError::config_error("redirect_uri é obrigatório"));
        }

        let parsed = url::Url::parse(&self.redirect_uri)?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(AuthError::config_error(
                "redirect_uri deve ser uma URL http(s) válida",
            ));
        }

        Ok(())
    }
}

/// Store durável de tokens, chave-valor, injetável.
///
/// O `TokenManager` lê o store uma única vez, na construção, e escreve as
/// quatro chaves namespaced por região a cada troca bem-sucedida. Testes
/// substituem o backend de arquivo por um [`MemoryStore`].
pub trait TokenStore: std::fmt::Debug {
    /// Lê o valor de uma chave; `None` quando ausente ou vazia
    fn get(&self, key: &str) -> Option<String>;

    /// Grava uma chave; valor vazio remove a entrada
    fn set(&mut self, key: &str, value: &str) -> AuthResult<()>;
}

/// Backend de arquivo no formato dotenv (`CHAVE=VALOR`, uma por linha).
///
/// O arquivo é criado vazio quando ausente, lido sob demanda e reescrito por
/// inteiro a cada gravação. Sem watching de mudanças externas; escritas
/// concorrentes resultam em last-writer-wins.
#[derive(Debug, Clone)]
pub struct EnvFileStore {
    path: PathBuf,
}

impl EnvFileStore {
    /// Abre (ou cria vazio) o arquivo de tokens no caminho informado
    pub fn new(path: impl Into<PathBuf>) -> AuthResult<Self> {
        let path = path.into();
        if !path.exists() {
            OpenOptions::new().append(true).create(true).open(&path)?;
            log::info!("Arquivo de tokens criado: {}", path.display());
        }
        Ok(Self { path })
    }

    /// Caminho do arquivo de tokens
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_lines(&self) -> AuthResult<Vec<String>> {
        let mut lines = Vec::new();
        if let Ok(file) = std::fs::File::open(&self.path) {
            let reader = BufReader::new(file);
            for line in reader.lines() {
                lines.push(line?);
            }
        }
        Ok(lines)
    }
}

impl TokenStore for EnvFileStore {
    fn get(&self, key: &str) -> Option<String> {
        let prefix = format!("{}=", key);
        let lines = self.read_lines().ok()?;
        lines
            .iter()
            .find_map(|line| line.strip_prefix(&prefix))
            .map(|value| value.to_string())
            .filter(|value| !value.is_empty())
    }

    fn set(&mut self, key: &str, value: &str) -> AuthResult<()> {
        let prefix = format!("{}=", key);
        let mut lines = Vec::new();
        let mut key_found = false;

        for line in self.read_lines()? {
            if line.starts_with(&prefix) {
                if !value.is_empty() {
                    lines.push(format!("{}={}", key, value));
                }
                key_found = true;
            } else {
                lines.push(line);
            }
        }

        if !key_found && !value.is_empty() {
            lines.push(format!("{}={}", key, value));
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)?;

        for line in lines {
            writeln!(file, "{}", line)?;
        }

        Ok(())
    }
}

/// Backend em memória: estado vive apenas durante o processo.
///
/// Usado nos testes e por aplicações que desabilitam a persistência.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned().filter(|v| !v.is_empty())
    }

    fn set(&mut self, key: &str, value: &str) -> AuthResult<()> {
        if value.is_empty() {
            self.values.remove(key);
        } else {
            self.values.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_oauth_config_from_env() {
        temp_env::with_vars(
            vec![
                ("REVIZTO_CLIENT_ID", Some("test_client_id")),
                ("REVIZTO_REDIRECT_URI", Some("https://app.example.com/callback")),
                ("REVIZTO_STATE", Some("abc123")),
                ("REVIZTO_SCOPE", None),
            ],
            || {
                let config = OAuthConfig::from_env().unwrap();
                assert_eq!(config.client_id, "test_client_id");
                assert_eq!(config.redirect_uri, "https://app.example.com/callback");
                assert_eq!(config.state.as_deref(), Some("abc123"));
                assert_eq!(config.scope, None);
            },
        );
    }

    #[test]
    fn test_oauth_config_from_env_missing() {
        temp_env::with_vars_unset(vec!["REVIZTO_CLIENT_ID", "REVIZTO_REDIRECT_URI"], || {
            let result = OAuthConfig::from_env();
            assert!(result.is_err());
        });
    }

    #[test]
    fn test_oauth_config_validate() {
        let valid = OAuthConfig::new("id", "https://app.example.com/callback");
        assert!(valid.validate().is_ok());

        let empty_id = OAuthConfig::new("", "https://app.example.com/callback");
        assert!(empty_id.validate().is_err());

        let empty_redirect = OAuthConfig::new("id", "");
        assert!(empty_redirect.validate().is_err());

        let bad_scheme = OAuthConfig::new("id", "ftp://example.com/callback");
        assert!(bad_scheme.validate().is_err());
    }

    #[test]
    fn test_oauth_config_builders() {
        let config = OAuthConfig::new("id", "https://app.example.com/callback")
            .with_state("s1")
            .with_scope("openid");
        assert_eq!(config.state.as_deref(), Some("s1"));
        assert_eq!(config.scope.as_deref(), Some("openid"));
    }

    #[test]
    fn test_env_file_store_created_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.env");
        assert!(!path.exists());

        let store = EnvFileStore::new(&path).unwrap();
        assert!(path.exists());
        assert_eq!(store.get("US_ACCESS_TOKEN"), None);
    }

    #[test]
    fn test_env_file_store_set_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = EnvFileStore::new(dir.path().join("tokens.env")).unwrap();

        store.set("US_ACCESS_TOKEN", "A1").unwrap();
        store.set("US_REFRESH_TOKEN", "R1").unwrap();

        assert_eq!(store.get("US_ACCESS_TOKEN"), Some("A1".to_string()));
        assert_eq!(store.get("US_REFRESH_TOKEN"), Some("R1".to_string()));
    }

    #[test]
    fn test_env_file_store_overwrite_preserves_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = EnvFileStore::new(dir.path().join("tokens.env")).unwrap();

        store.set("US_ACCESS_TOKEN", "A1").unwrap();
        store.set("EU_ACCESS_TOKEN", "B1").unwrap();
        store.set("US_ACCESS_TOKEN", "A2").unwrap();

        assert_eq!(store.get("US_ACCESS_TOKEN"), Some("A2".to_string()));
        assert_eq!(store.get("EU_ACCESS_TOKEN"), Some("B1".to_string()));
    }

    #[test]
    fn test_env_file_store_empty_value_removes_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = EnvFileStore::new(dir.path().join("tokens.env")).unwrap();

        store.set("US_ACCESS_TOKEN", "A1").unwrap();
        store.set("US_ACCESS_TOKEN", "").unwrap();

        assert_eq!(store.get("US_ACCESS_TOKEN"), None);
    }

    #[test]
    fn test_env_file_store_reopen_reads_prior_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.env");

        {
            let mut store = EnvFileStore::new(&path).unwrap();
            store.set("US_ACCESS_TOKEN", "A1").unwrap();
        }

        let store = EnvFileStore::new(&path).unwrap();
        assert_eq!(store.get("US_ACCESS_TOKEN"), Some("A1".to_string()));
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("US_ACCESS_TOKEN"), None);

        store.set("US_ACCESS_TOKEN", "A1").unwrap();
        assert_eq!(store.get("US_ACCESS_TOKEN"), Some("A1".to_string()));

        store.set("US_ACCESS_TOKEN", "").unwrap();
        assert_eq!(store.get("US_ACCESS_TOKEN"), None);
    }
}
