//! Rotas HTTP: página com formulário, análise via formulário e API JSON

use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{rejection::JsonRejection, State},
    response::{Html, IntoResponse, Json},
    routing::{get, post},
    Form, Router,
};
use bert_ner_core::{
    demo::demo_texts, render::entity_color, Analysis, Entity, ModelError, NerPipeline, SubwordToken, WordTag,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::AppError;

const EMPTY_TEXT_WARNING: &str = "Please enter some text to analyze.";

/// Estado compartilhado da aplicação
pub struct AppState {
    pipeline: NerPipeline,
}

impl AppState {
    pub fn new(pipeline: NerPipeline) -> Self {
        Self { pipeline }
    }

    fn analyze(&self, text: &str) -> Result<Analysis, ModelError> {
        let analysis = self.pipeline.analyze(text)?;
        info!(
            chars = text.len(),
            tokens = analysis.tokens.len(),
            entities = analysis.entities.len(),
            truncated = analysis.truncated,
            "texto analisado"
        );
        Ok(analysis)
    }
}

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    text: String,
}

#[derive(Serialize)]
struct AnalyzeResponse {
    entities: Vec<Entity>,
    words: Vec<WordTag>,
    tokens: Vec<SubwordToken>,
    html: String,
    total_tokens: usize,
    truncated: bool,
    processing_ms: u64,
}

#[derive(Deserialize)]
pub struct AnalyzeForm {
    #[serde(default)]
    text: String,
}

struct ResultView {
    html: String,
    entity_list: String,
    total_tokens: usize,
    truncated: bool,
    processing_ms: u64,
}

impl From<Analysis> for ResultView {
    fn from(analysis: Analysis) -> Self {
        Self {
            html: analysis.highlighted_html(),
            entity_list: analysis.entity_list(),
            total_tokens: analysis.tokens.len(),
            truncated: analysis.truncated,
            processing_ms: analysis.processing_ms,
        }
    }
}

struct LegendView<'a> {
    entity_type: &'a str,
    color: &'static str,
}

struct DemoView {
    domain: &'static str,
    text: &'static str,
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate<'a> {
    model_name: &'a str,
    text: &'a str,
    warning: Option<&'static str>,
    result: Option<ResultView>,
    legend: Vec<LegendView<'a>>,
    demos: Vec<DemoView>,
}

impl<'a> IndexTemplate<'a> {
    fn new(state: &'a AppState, text: &'a str) -> Self {
        Self {
            model_name: state.pipeline.model().name(),
            text,
            warning: None,
            result: None,
            // Só os tipos que o modelo carregado conhece
            legend: state
                .pipeline
                .model()
                .labels()
                .entity_types()
                .into_iter()
                .map(|entity_type| LegendView { entity_type, color: entity_color(entity_type) })
                .collect(),
            demos: demo_texts()
                .into_iter()
                .map(|(domain, text)| DemoView { domain, text })
                .collect(),
        }
    }

    fn into_html(self) -> Result<Html<String>, AppError> {
        Ok(Html(self.render()?))
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler).post(form_handler))
        .route("/analyze", post(analyze_handler))
        .route("/demo-texts", get(demo_texts_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Página principal com o formulário
async fn index_handler(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    IndexTemplate::new(&state, "").into_html()
}

/// Análise via formulário HTML: devolve a página com os resultados
async fn form_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<AnalyzeForm>,
) -> Result<Html<String>, AppError> {
    let mut page = IndexTemplate::new(&state, &form.text);
    if form.text.trim().is_empty() {
        page.warning = Some(EMPTY_TEXT_WARNING);
    } else {
        page.result = Some(state.analyze(&form.text)?.into());
    }
    page.into_html()
}

/// Análise NER via HTTP POST com JSON
async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;
    if req.text.trim().is_empty() {
        return Err(AppError::BadRequest("Texto vazio".into()));
    }

    let analysis = state.analyze(&req.text)?;
    Ok(Json(AnalyzeResponse {
        html: analysis.highlighted_html(),
        total_tokens: analysis.tokens.len(),
        truncated: analysis.truncated,
        processing_ms: analysis.processing_ms,
        entities: analysis.entities,
        words: analysis.words,
        tokens: analysis.tokens,
    }))
}

/// Retorna textos de demonstração
async fn demo_texts_handler() -> impl IntoResponse {
    let texts: Vec<serde_json::Value> = demo_texts()
        .iter()
        .map(|(domain, text)| {
            serde_json::json!({
                "domain": domain,
                "text": text
            })
        })
        .collect();
    Json(texts)
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let model = state.pipeline.model();
    Json(serde_json::json!({
        "status": "ok",
        "model": model.name(),
        "entity_types": model.labels().entity_types(),
        "max_length": model.tokenizer().max_length(),
    }))
}
