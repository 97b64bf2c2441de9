use thiserror::Error;

/// Tipos de erro para o ciclo de vida de tokens e chamadas à API do Revizto
#[derive(Error, Debug)]
pub enum AuthError {
    /// Refresh token ausente ou além da janela de validade. Sem caminho de
    /// recuperação além de um novo fluxo de código de autorização.
    #[error("Refresh token ausente ou expirado; um novo código de autorização é necessário")]
    RefreshExpired,

    /// Nenhuma credencial em cache e nenhum código de autorização fornecido.
    #[error("Código de autorização necessário: nenhum token válido em cache")]
    CodeRequired,

    /// HTTP 400 do endpoint de token
    #[error("Requisição inválida: verifique os parâmetros e tente novamente: {0}")]
    InvalidRequest(String),

    /// HTTP 401/403, ou 200 com token_type inesperado
    #[error("Permissão negada: {0}")]
    PermissionDenied(String),

    /// HTTP 500 — falha transitória, o chamador pode tentar novamente
    #[error("Erro do servidor, tente novamente mais tarde: {0}")]
    ServerError(String),

    /// Qualquer outro status HTTP, com o corpo bruto da resposta
    #[error("Resposta inesperada do servidor (HTTP {status}): {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// Erro de rede durante a troca de tokens
    #[error("Erro de rede: {0}")]
    Network(#[from] reqwest::Error),

    /// Erro de IO (arquivo .env, store de tokens)
    #[error("Erro de IO: {0}")]
    Io(#[from] std::io::Error),

    /// Erro de parsing de JSON
    #[error("Erro de serialização: {0}")]
    Parse(#[from] serde_json::Error),

    /// Erro de parsing de URL
    #[error("URL inválida: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Configuração ausente ou inválida
    #[error("Configuração inválida: {0}")]
    Config(String),

    /// Envelope da API com result diferente de zero
    #[error("Erro da API Revizto (result {code}): {body}")]
    Api { code: i64, body: String },
}

impl AuthError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    pub fn server_error(msg: impl Into<String>) -> Self {
        Self::ServerError(msg.into())
    }
}

/// Tipo de resultado padrão para operações da biblioteca
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let refresh_expired = AuthError::RefreshExpired;
        assert!(refresh_expired.to_string().contains("Refresh token"));

        let code_required = AuthError::CodeRequired;
        assert!(code_required.to_string().contains("Código de autorização"));

        let invalid = AuthError::invalid_request("grant_type ausente");
        assert!(invalid.to_string().contains("grant_type ausente"));

        let denied = AuthError::permission_denied("Unauthorized");
        assert!(denied.to_string().contains("Permissão negada"));

        let server = AuthError::server_error("HTTP 500");
        assert!(server.to_string().contains("tente novamente"));
    }

    #[test]
    fn test_unexpected_status_carries_raw_body() {
        let error = AuthError::UnexpectedStatus {
            status: 502,
            body: "Bad Gateway".to_string(),
        };
        assert!(error.to_string().contains("502"));
        assert!(error.to_string().contains("Bad Gateway"));
    }

    #[test]
    fn test_api_error_carries_result_code() {
        let error = AuthError::Api {
            code: -206,
            body: "token expirado".to_string(),
        };
        assert!(error.to_string().contains("-206"));
    }

    #[test]
    fn test_io_error_from() {
        use std::io::{Error, ErrorKind};
        let io_error = Error::new(ErrorKind::NotFound, "arquivo não encontrado");
        let auth_error = AuthError::from(io_error);
        assert!(auth_error.to_string().contains("Erro de IO"));
    }

    #[test]
    fn test_parse_error_from() {
        let parse_result: Result<serde_json::Value, _> = serde_json::from_str("{invalido}");
        if let Err(json_error) = parse_result {
            let auth_error = AuthError::from(json_error);
            assert!(auth_error.to_string().contains("Erro de serialização"));
        }
    }

    #[test]
    fn test_url_parse_error_from() {
        let url_error = url::Url::parse("not-a-valid-url").unwrap_err();
        let auth_error = AuthError::from(url_error);
        assert!(auth_error.to_string().contains("URL inválida"));
    }

    #[test]
    fn test_auth_result_type() {
        fn returns_auth_error() -> AuthResult<String> {
            Err(AuthError::RefreshExpired)
        }

        assert!(matches!(
            returns_auth_error().unwrap_err(),
            AuthError::RefreshExpired
        ));
    }

    #[test]
    fn test_error_debug_format() {
        let error = AuthError::InvalidRequest("XYZ".to_string());
        let debug_str = format!("{:?}", error);
        assert!(debug_str.contains("InvalidRequest"));
        assert!(debug_str.contains("XYZ"));
    }
}
