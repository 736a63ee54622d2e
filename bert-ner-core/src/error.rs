//! Erros de carregamento do modelo.
//!
//! A reconstrução de entidades é total e não tem erros. A aquisição do modelo
//! (Hub, arquivos, JSON, vocabulário, labels) falha na inicialização do
//! processo; a tokenização é a única etapa por requisição que pode falhar.

use std::path::PathBuf;

use hf_hub::api::sync::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    /// Falha ao ler um arquivo do diretório do modelo
    #[error("falha ao ler {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON malformado em `config.json` ou `gazetteer.json`
    #[error("JSON inválido em {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Mapa `id2label` inconsistente
    #[error("mapa de labels inválido: {0}")]
    InvalidLabelMap(String),

    /// Vocabulário vazio ou sem `[UNK]`
    #[error("vocabulário inválido: {0}")]
    InvalidVocabulary(String),

    /// Parâmetro de configuração fora do domínio
    #[error("configuração inválida: {0}")]
    InvalidConfig(String),

    /// `tokenizer.json` ilegível ou falha da biblioteca `tokenizers`
    #[error("erro do tokenizador: {0}")]
    Tokenizer(String),

    /// Cliente do Hugging Face Hub não pôde ser criado
    #[error("falha ao iniciar o cliente do Hugging Face Hub: {0}")]
    HubClient(#[source] ApiError),

    /// Download de um arquivo do repositório falhou
    #[error("falha ao baixar {file} de {repo}: {source}")]
    Hub {
        repo: String,
        file: String,
        #[source]
        source: ApiError,
    },
}

pub type Result<T> = std::result::Result<T, ModelError>;
