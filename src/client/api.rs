use crate::error::{AuthError, AuthResult};
use reqwest::header::AUTHORIZATION;
use serde_json::Value;

/// Cliente HTTP genérico e autenticado para os endpoints de recursos do
/// Revizto (issues, comments, licenses, projects, sheets, stamps, users).
///
/// O contrato com o [`TokenManager`](crate::auth::TokenManager) é mínimo: o
/// gerenciador entrega um bearer token atualmente válido e as configurações
/// TLS; este cliente apenas monta a URL, anexa o header e repassa a chamada.
/// O mapeamento de schemas por endpoint fica a cargo da aplicação.
#[derive(Debug, Clone)]
pub struct ReviztoClient {
    http: reqwest::blocking::Client,
    access_token: String,
    base_url: String,
}

impl ReviztoClient {
    /// Cria um cliente para uma região
    /// (`https://api.{region}.revizto.com/v5`)
    pub fn new(access_token: impl Into<String>, region: &str) -> Self {
        Self::with_http(
            reqwest::blocking::Client::new(),
            access_token.into(),
            format!("https://api.{}.revizto.com/v5", region),
        )
    }

    /// Cria um cliente com um `reqwest` já configurado (TLS, certificados) e
    /// uma URL base explícita
    pub fn with_http(
        http: reqwest::blocking::Client,
        access_token: String,
        base_url: String,
    ) -> Self {
        Self {
            http,
            access_token,
            base_url,
        }
    }

    /// URL base da API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Header de autorização no formato esperado pela API
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    /// GET autenticado; `query` entra como query string
    pub fn get(&self, endpoint: &str, query: &[(&str, String)]) -> AuthResult<Value> {
        let response = self
            .http
            .get(self.endpoint_url(endpoint))
            .header(AUTHORIZATION, self.authorization_header())
            .query(query)
            .send()?;
        Self::json_body(response)
    }

    /// POST autenticado com corpo JSON
    pub fn post_json(&self, endpoint: &str, body: &Value) -> AuthResult<Value> {
        let response = self
            .http
            .post(self.endpoint_url(endpoint))
            .header(AUTHORIZATION, self.authorization_header())
            .json(body)
            .send()?;
        Self::json_body(response)
    }

    fn json_body(response: reqwest::blocking::Response) -> AuthResult<Value> {
        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            return Err(AuthError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Valida o envelope `{"result": <código>, ...}` das respostas do
    /// Revizto; `0` é sucesso, qualquer outro código vira erro de API
    pub fn check_result(value: &Value) -> AuthResult<()> {
        match value.get("result").and_then(Value::as_i64) {
            Some(0) => Ok(()),
            Some(code) => Err(AuthError::Api {
                code,
                body: value.to_string(),
            }),
            None => Err(AuthError::Api {
                code: -1,
                body: value.to_string(),
            }),
        }
    }
}
