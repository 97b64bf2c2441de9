use crate::auth::oauth::{OAuthExchange, TokenResponse};
use crate::client::ReviztoClient;
use crate::config::{OAuthConfig, TokenStore};
use crate::error::{AuthError, AuthResult};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Par de tokens devolvido ao chamador após validação ou troca
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

/// Credenciais OAuth2 de uma região.
///
/// Criadas vazias na construção do [`TokenManager`], populadas a partir do
/// store persistido ou de uma troca bem-sucedida, e mutadas in place a cada
/// renovação. Um token e seu timestamp de emissão só mudam juntos.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub access_issued_at: Option<DateTime<Utc>>,
    pub refresh_issued_at: Option<DateTime<Utc>>,
}

impl Credentials {
    /// Token de acesso válido: presente e dentro da janela `issued_at + ttl`.
    /// Timestamp ausente implica inválido.
    pub fn is_access_valid(&self, ttl: Duration) -> bool {
        match (&self.access_token, self.access_issued_at) {
            (Some(_), Some(issued_at)) => Utc::now() <= issued_at + ttl,
            _ => false,
        }
    }

    /// Refresh token válido: presente e dentro da janela `issued_at + ttl`
    pub fn is_refresh_valid(&self, ttl: Duration) -> bool {
        match (&self.refresh_token, self.refresh_issued_at) {
            (Some(_), Some(issued_at)) => Utc::now() <= issued_at + ttl,
            _ => false,
        }
    }
}

/// Estado do ciclo de vida dos tokens de uma região, calculado sob demanda
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// Nenhuma credencial conhecida; requer um código de autorização
    NoToken,
    /// Token de acesso em cache ainda válido; nenhuma chamada de rede
    AccessValid,
    /// Acesso expirado, refresh ainda dentro da janela; uma troca de refresh
    AccessExpiredRefreshValid,
    /// Refresh expirado; terminal até um novo código de autorização
    RefreshExpired,
}

const ACCESS_TOKEN_KEY: &str = "ACCESS_TOKEN";
const ACCESS_TIMESTAMP_KEY: &str = "ACCESS_TOKEN_TIMESTAMP";
const REFRESH_TOKEN_KEY: &str = "REFRESH_TOKEN";
const REFRESH_TIMESTAMP_KEY: &str = "REFRESH_TOKEN_TIMESTAMP";

/// Gerenciador do ciclo de vida de tokens OAuth2 do Revizto.
///
/// Produz um token de acesso utilizável para uma região realizando a menor
/// troca de rede necessária (no máximo uma por chamada) e mantém o estado de
/// refresh durável em um [`TokenStore`] injetado. A expiração é verificada de
/// forma lazy, somente quando um token é solicitado; não há timers nem
/// retentativas internas. Chamadores concorrentes devem serializar o acesso a
/// uma instância por região.
#[derive(Debug)]
pub struct TokenManager {
    region: String,
    api_base_url: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
    http: reqwest::blocking::Client,
    exchange: OAuthExchange,
    credentials: Credentials,
    store: Option<Box<dyn TokenStore>>,
}

impl TokenManager {
    /// Inicia a construção de um gerenciador para a região informada
    pub fn builder(region: impl Into<String>) -> TokenManagerBuilder {
        TokenManagerBuilder::new(region)
    }

    /// Região atendida por este gerenciador
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Credenciais em memória (inspeção; a mutação é interna)
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Estado atual do ciclo de vida, derivado dos timestamps de emissão
    pub fn state(&self) -> TokenState {
        if self.credentials.is_access_valid(self.access_ttl) {
            TokenState::AccessValid
        } else if self.credentials.is_refresh_valid(self.refresh_ttl) {
            TokenState::AccessExpiredRefreshValid
        } else if self.credentials.refresh_token.is_some()
            || self.credentials.refresh_issued_at.is_some()
        {
            TokenState::RefreshExpired
        } else {
            TokenState::NoToken
        }
    }

    /// Obtém um par de tokens utilizável, trocando o mínimo necessário.
    ///
    /// Com um token de acesso válido em cache, devolve o par sem tocar a
    /// rede. Com o acesso expirado e o refresh válido, executa uma troca de
    /// refresh. Caso contrário executa o grant de código de autorização com o
    /// `code` fornecido; sem código, falha com a classe TokenError
    /// ([`AuthError::CodeRequired`] / [`AuthError::RefreshExpired`]).
    pub fn get_tokens(&mut self, code: Option<&str>) -> AuthResult<TokenPair> {
        match self.state() {
            TokenState::AccessValid => self.cached_pair().ok_or(AuthError::CodeRequired),
            TokenState::AccessExpiredRefreshValid => self.run_refresh_exchange(),
            TokenState::NoToken => match code {
                Some(code) => self.run_code_exchange(code),
                None => Err(AuthError::CodeRequired),
            },
            TokenState::RefreshExpired => match code {
                Some(code) => self.run_code_exchange(code),
                None => Err(AuthError::RefreshExpired),
            },
        }
    }

    /// Força a revalidação sem código de autorização.
    ///
    /// Token válido em cache é devolvido como está; senão tenta uma troca de
    /// refresh; com o refresh expirado falha com
    /// [`AuthError::RefreshExpired`], sem fallback para o grant de código.
    pub fn get_refreshed_token(&mut self) -> AuthResult<TokenPair> {
        match self.state() {
            TokenState::AccessValid => self.cached_pair().ok_or(AuthError::CodeRequired),
            TokenState::AccessExpiredRefreshValid => self.run_refresh_exchange(),
            _ => Err(AuthError::RefreshExpired),
        }
    }

    /// Entrega um cliente de recursos com um bearer token atualmente válido.
    ///
    /// Renova o token se necessário; falha se a renovação não for possível.
    pub fn resource_client(&mut self) -> AuthResult<ReviztoClient> {
        let pair = self.get_refreshed_token()?;
        Ok(ReviztoClient::with_http(
            self.http.clone(),
            pair.access_token,
            self.api_base_url.clone(),
        ))
    }

    fn cached_pair(&self) -> Option<TokenPair> {
        self.credentials.access_token.clone().map(|access_token| TokenPair {
            access_token,
            refresh_token: self.credentials.refresh_token.clone(),
        })
    }

    fn run_code_exchange(&mut self, code: &str) -> AuthResult<TokenPair> {
        let response = self.exchange.request_new_tokens(code)?;
        Ok(self.apply_exchange(response))
    }

    fn run_refresh_exchange(&mut self) -> AuthResult<TokenPair> {
        let refresh_token = self
            .credentials
            .refresh_token
            .clone()
            .ok_or(AuthError::RefreshExpired)?;
        let response = self.exchange.request_refresh_token(&refresh_token)?;
        Ok(self.apply_exchange(response))
    }

    /// Aplica uma troca confirmada: tokens e timestamps de emissão mudam
    /// juntos, e só então o store é atualizado
    fn apply_exchange(&mut self, response: TokenResponse) -> TokenPair {
        let now = Utc::now();
        self.credentials.access_token = Some(response.access_token.clone());
        self.credentials.refresh_token = Some(response.refresh_token.clone());
        self.credentials.access_issued_at = Some(now);
        self.credentials.refresh_issued_at = Some(now);

        self.persist(now);

        TokenPair {
            access_token: response.access_token,
            refresh_token: Some(response.refresh_token),
        }
    }

    /// Grava as quatro chaves namespaced por região. Best-effort: uma falha
    /// do store não invalida a troca já confirmada
    fn persist(&mut self, issued_at: DateTime<Utc>) {
        let namespace = self.region.to_uppercase();
        let timestamp = issued_at.to_rfc3339();

        let entries = [
            (ACCESS_TOKEN_KEY, self.credentials.access_token.clone()),
            (ACCESS_TIMESTAMP_KEY, Some(timestamp.clone())),
            (REFRESH_TOKEN_KEY, self.credentials.refresh_token.clone()),
            (REFRESH_TIMESTAMP_KEY, Some(timestamp)),
        ];

        if let Some(store) = &mut self.store {
            for (suffix, value) in entries {
                let key = format!("{}_{}", namespace, suffix);
                if let Err(e) = store.set(&key, value.as_deref().unwrap_or("")) {
                    log::warn!("Falha ao persistir {}: {}", key, e);
                }
            }
        }
    }
}

/// Builder do [`TokenManager`]; espelha os parâmetros opcionais da construção
pub struct TokenManagerBuilder {
    region: String,
    oauth: Option<OAuthConfig>,
    access_ttl: Duration,
    refresh_ttl: Duration,
    verify: bool,
    identity: Option<reqwest::Identity>,
    store: Option<Box<dyn TokenStore>>,
    api_base_url: Option<String>,
}

impl TokenManagerBuilder {
    fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            oauth: None,
            access_ttl: Duration::minutes(30),
            refresh_ttl: Duration::days(30),
            verify: true,
            identity: None,
            store: None,
            api_base_url: None,
        }
    }

    /// Identidade OAuth2 do cliente (obrigatória)
    pub fn oauth(mut self, config: OAuthConfig) -> Self {
        self.oauth = Some(config);
        self
    }

    /// Janela de validade do token de acesso (padrão: 30 minutos)
    pub fn access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    /// Janela de validade do refresh token (padrão: 30 dias)
    pub fn refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }

    /// Habilita ou desabilita a verificação do certificado TLS do servidor
    pub fn verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Certificado de cliente para TLS mútuo
    pub fn identity(mut self, identity: reqwest::Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Store durável de tokens; sem store, o estado vive apenas em memória
    pub fn store(mut self, store: impl TokenStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    /// Sobrescreve a URL base da API (padrão:
    /// `https://api.{region}.revizto.com/v5`)
    pub fn api_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api_base_url = Some(base_url.into());
        self
    }

    /// Constrói o gerenciador, semeando as credenciais do store uma única vez
    pub fn build(self) -> AuthResult<TokenManager> {
        let oauth = self
            .oauth
            .ok_or_else(|| AuthError::config_error("identidade OAuth2 não configurada"))?;
        oauth.validate()?;

        let mut client_builder =
            reqwest::blocking::Client::builder().danger_accept_invalid_certs(!self.verify);
        if let Some(identity) = self.identity {
            client_builder = client_builder.identity(identity);
        }
        let http = client_builder.build()?;

        let api_base_url = self
            .api_base_url
            .unwrap_or_else(|| format!("https://api.{}.revizto.com/v5", self.region));
        let token_url = format!("{}/oauth2", api_base_url.trim_end_matches('/'));

        let mut credentials = Credentials::default();
        if let Some(store) = &self.store {
            let namespace = self.region.to_uppercase();
            credentials.access_token = store.get(&format!("{}_{}", namespace, ACCESS_TOKEN_KEY));
            credentials.refresh_token = store.get(&format!("{}_{}", namespace, REFRESH_TOKEN_KEY));
            credentials.access_issued_at = store
                .get(&format!("{}_{}", namespace, ACCESS_TIMESTAMP_KEY))
                .and_then(|raw| parse_timestamp(&raw));
            credentials.refresh_issued_at = store
                .get(&format!("{}_{}", namespace, REFRESH_TIMESTAMP_KEY))
                .and_then(|raw| parse_timestamp(&raw));
            log::info!(
                "Credenciais da região {} semeadas do store (access: {}, refresh: {})",
                self.region,
                credentials.access_token.is_some(),
                credentials.refresh_token.is_some()
            );
        }

        let exchange = OAuthExchange::new(http.clone(), token_url, oauth);

        Ok(TokenManager {
            region: self.region,
            api_base_url,
            access_ttl: self.access_ttl,
            refresh_ttl: self.refresh_ttl,
            http,
            exchange,
            credentials,
            store: self.store,
        })
    }
}

/// Timestamp ilegível no store equivale a timestamp ausente
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
