//! # Configuração do Modelo
//!
//! Um diretório de modelo segue o layout dos repositórios do Hugging Face Hub:
//!
//! ```text
//! modelo/
//! ├── config.json      # id2label, max_position_embeddings, do_lower_case
//! ├── tokenizer.json   # tokenizador completo (preferido)
//! ├── vocab.txt        # alternativa: vocabulário WordPiece, uma peça por linha
//! └── gazetteer.json   # opcional: {"PER": ["Elon Musk", ...], ...}
//! ```
//!
//! Um repositório do Hub é baixado para o cache local e lido como diretório:
//! todos os arquivos de uma mesma revisão ficam no mesmo snapshot.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use hf_hub::api::sync::Api;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{ModelError, Result};
use crate::tokenizer::{DEFAULT_MAX_LENGTH, MIN_MAX_LENGTH};

pub const CONFIG_FILE: &str = "config.json";
pub const TOKENIZER_FILE: &str = "tokenizer.json";
pub const VOCAB_FILE: &str = "vocab.txt";
pub const GAZETTEER_FILE: &str = "gazetteer.json";

/// De onde carregar o modelo.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ModelSource {
    /// Modelo embutido de demonstração (vocabulário reduzido + gazetteers)
    #[default]
    Builtin,
    /// Diretório com `config.json` e `tokenizer.json` (ou `vocab.txt`)
    Directory(PathBuf),
    /// Repositório do Hugging Face Hub (ex: "dslim/bert-base-NER")
    Hub(String),
}

/// Conteúdo de `config.json`.
///
/// Campos desconhecidos (ex: `hidden_size`, `architectures`) são ignorados, de
/// modo que o `config.json` original de um modelo do Hub pode ser usado direto.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Nome do modelo (ex: "Nomi78600/bert-ner-squad")
    #[serde(default, alias = "_name_or_path")]
    pub name: Option<String>,
    /// Mapa id → label, com chaves textuais ("0", "1", ...)
    pub id2label: BTreeMap<String, String>,
    /// Comprimento máximo da sequência, incluindo `[CLS]` e `[SEP]`
    #[serde(default = "default_max_length", rename = "max_position_embeddings")]
    pub max_length: usize,
    #[serde(default = "default_do_lower_case")]
    pub do_lower_case: bool,
}

fn default_max_length() -> usize {
    DEFAULT_MAX_LENGTH
}

fn default_do_lower_case() -> bool {
    true
}

impl ModelConfig {
    /// Lê e valida `config.json` do diretório do modelo.
    pub fn load(dir: &Path) -> Result<Self> {
        let config: ModelConfig = read_json(&dir.join(CONFIG_FILE))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_length < MIN_MAX_LENGTH {
            return Err(ModelError::InvalidConfig(format!(
                "max_length deve ser >= {MIN_MAX_LENGTH} (recebido {})",
                self.max_length
            )));
        }
        Ok(())
    }
}

/// Baixa (ou reaproveita do cache) os arquivos de um repositório do Hub.
///
/// Devolve o diretório do snapshot, que tem o layout de um diretório de modelo.
/// `config.json` é obrigatório; `tokenizer.json` só é dispensado quando o
/// repositório publica `vocab.txt`; `gazetteer.json` é opcional.
pub(crate) fn hub_snapshot(repo_id: &str) -> Result<PathBuf> {
    let api = Api::new().map_err(ModelError::HubClient)?;
    let repo = api.model(repo_id.to_string());
    let fetch = |file: &str| {
        repo.get(file).map_err(|source| ModelError::Hub {
            repo: repo_id.to_string(),
            file: file.to_string(),
            source,
        })
    };

    let config_path = fetch(CONFIG_FILE)?;
    if let Err(err) = fetch(TOKENIZER_FILE) {
        debug!(error = %err, "sem tokenizer.json, tentando vocab.txt");
        fetch(VOCAB_FILE)?;
    }
    if fetch(GAZETTEER_FILE).is_err() {
        debug!(repo = repo_id, "repositório sem gazetteer.json");
    }

    let snapshot = config_path
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| ModelError::InvalidConfig(format!("caminho de cache inesperado: {}", config_path.display())))?;
    info!(repo = repo_id, snapshot = %snapshot.display(), "modelo obtido do Hub");
    Ok(snapshot)
}

/// Lê um arquivo texto, anexando o caminho ao erro.
pub(crate) fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Lê e desserializa um arquivo JSON.
pub(crate) fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let contents = read_text(path)?;
    serde_json::from_str(&contents).map_err(|source| ModelError::Json {
        path: path.to_path_buf(),
        source,
    })
}
