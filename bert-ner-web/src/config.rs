//! Configuração do servidor: argumentos de linha de comando com fallback em
//! variáveis de ambiente (argumentos têm precedência).

use std::net::SocketAddr;
use std::path::PathBuf;

use bert_ner_core::ModelSource;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "bert-ner-web",
    version,
    about = "Interface web de NER: destaca pessoas, organizações, locais e miscelânea no texto"
)]
pub struct ServerArgs {
    /// Endereço de escuta do servidor HTTP
    #[arg(long, env = "NER_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Diretório do modelo (config.json + tokenizer.json ou vocab.txt)
    #[arg(long, env = "NER_MODEL_DIR", value_name = "DIR", conflicts_with = "model_repo")]
    pub model_dir: Option<PathBuf>,

    /// Repositório no Hugging Face Hub (ex: "dslim/bert-base-NER"), baixado para o cache local.
    /// Sem `--model-dir` nem `--model-repo`, usa o modelo embutido.
    #[arg(long, env = "NER_MODEL_REPO", value_name = "REPO")]
    pub model_repo: Option<String>,

    /// Filtro de log no formato do `tracing_subscriber::EnvFilter` (ex: "info,bert_ner_core=debug")
    #[arg(long, env = "NER_LOG", default_value = "info")]
    pub log: String,
}

impl ServerArgs {
    pub fn model_source(&self) -> ModelSource {
        match (&self.model_dir, &self.model_repo) {
            (Some(dir), _) => ModelSource::Directory(dir.clone()),
            (None, Some(repo)) => ModelSource::Hub(repo.clone()),
            (None, None) => ModelSource::Builtin,
        }
    }
}
