use crate::config::OAuthConfig;
use crate::error::{AuthError, AuthResult};
use serde::Deserialize;

/// Resposta do endpoint `/v5/oauth2` em caso de sucesso
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token_type: String,
    pub access_token: String,
    pub refresh_token: String,
}

/// Executor das trocas OAuth2 contra o endpoint de token do Revizto.
///
/// Os dois grants (`authorization_code` e `refresh_token`) são POSTs
/// síncronos com corpo `application/x-www-form-urlencoded`; a resposta é
/// classificada estritamente pelo status HTTP. Nenhuma retentativa
/// automática: cada falha é devolvida ao chamador uma única vez.
#[derive(Debug, Clone)]
pub struct OAuthExchange {
    http: reqwest::blocking::Client,
    token_url: String,
    config: OAuthConfig,
}

impl OAuthExchange {
    pub fn new(http: reqwest::blocking::Client, token_url: String, config: OAuthConfig) -> Self {
        Self {
            http,
            token_url,
            config,
        }
    }

    /// URL do endpoint de token
    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Troca um código de autorização por um novo par de tokens.
    ///
    /// `state` e `scope` só entram no corpo quando configurados.
    pub fn request_new_tokens(&self, code: &str) -> AuthResult<TokenResponse> {
        let mut params = vec![
            ("grant_type", "authorization_code".to_string()),
            ("code", code.to_string()),
            ("redirect_uri", self.config.redirect_uri.clone()),
            ("client_id", self.config.client_id.clone()),
        ];
        if let Some(state) = &self.config.state {
            params.push(("state", state.clone()));
        }
        if let Some(scope) = &self.config.scope {
            params.push(("scope", scope.clone()));
        }

        log::info!("Solicitando novos tokens (grant authorization_code)...");
        let response = self.http.post(&self.token_url).form(&params).send()?;
        Self::handle_token_response(response)
    }

    /// Troca um refresh token válido por um par de tokens renovado
    pub fn request_refresh_token(&self, refresh_token: &str) -> AuthResult<TokenResponse> {
        let params = vec![
            ("grant_type", "refresh_token".to_string()),
            ("refresh_token", refresh_token.to_string()),
            ("redirect_uri", self.config.redirect_uri.clone()),
            ("client_id", self.config.client_id.clone()),
        ];

        log::info!("Renovando tokens (grant refresh_token)...");
        let response = self.http.post(&self.token_url).form(&params).send()?;
        Self::handle_token_response(response)
    }

    /// Classifica a resposta do endpoint de token pelo status HTTP
    fn handle_token_response(response: reqwest::blocking::Response) -> AuthResult<TokenResponse> {
        let status = response.status().as_u16();
        match status {
            200 => {
                let body = response.text()?;
                let value: serde_json::Value = serde_json::from_str(&body)?;

                // Alguns servidores respondem 200 com um grant rejeitado
                // semanticamente; token_type diferente de Bearer é tratado
                // como falha de permissão
                if value.get("token_type").and_then(|v| v.as_str()) != Some("Bearer") {
                    return Err(AuthError::PermissionDenied(body));
                }

                let tokens: TokenResponse = serde_json::from_value(value)?;
                log::info!("Tokens obtidos com sucesso");
                Ok(tokens)
            }
            400 => Err(AuthError::invalid_request(
                "o endpoint de token rejeitou os parâmetros do grant",
            )),
            401 => Err(AuthError::permission_denied(
                "Unauthorized: verifique o client_id e as credenciais",
            )),
            403 => Err(AuthError::permission_denied(
                "Forbidden: sem permissão para acessar este recurso",
            )),
            500 => Err(AuthError::server_error(
                "o endpoint de token respondeu HTTP 500",
            )),
            other => {
                let body = response.text().unwrap_or_default();
                Err(AuthError::UnexpectedStatus {
                    status: other,
                    body,
                })
            }
        }
    }
}
