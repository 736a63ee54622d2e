//! Servidor web Axum para visualização do NER: formulário, destaque de entidades e API JSON

mod app;
mod config;
mod error;

use std::sync::Arc;

use anyhow::Context;
use bert_ner_core::{model, NerPipeline};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::app::AppState;
use crate::config::ServerArgs;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();

    let filter = EnvFilter::try_new(&args.log).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // O modelo é carregado uma única vez; falhar aqui encerra o processo
    let source = args.model_source();
    info!(?source, "carregando modelo");
    let model = model::init_global(&source).with_context(|| format!("falha ao carregar o modelo {source:?}"))?;
    let state = Arc::new(AppState::new(NerPipeline::new(model)));

    let app = app::router(state);

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("falha ao escutar em {}", args.bind))?;
    info!("🚀 Servidor NER iniciado em http://{}", args.bind);
    axum::serve(listener, app).await?;

    Ok(())
}
