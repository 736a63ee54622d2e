//! Erros HTTP do servidor

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bert_ner_core::ModelError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Corpo JSON de erro
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    /// Requisição inválida (ex: texto vazio, JSON malformado)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Falha do modelo durante a análise
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Falha ao renderizar o template HTML
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Model(_) | AppError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "bad_request",
            AppError::Model(_) => "model_error",
            AppError::Template(_) => "internal_error",
        }
    }
}

/// Corpo ausente, JSON malformado ou campos faltando viram 400 no formato de erro da API
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "erro interno");
        }
        let body = ErrorResponse {
            error: self.code().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
