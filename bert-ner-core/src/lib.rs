//! # bert-ner-core — Entidades a partir de Predições BIO em Sub-palavras
//!
//! Modelos do tipo BERT classificam **sub-palavras** (WordPiece), não palavras.
//! Este crate transforma essas predições em entidades legíveis e destacadas no
//! texto original.
//!
//! ## Arquitetura do Sistema
//!
//! 1.  **Entrada**: Texto bruto (String).
//! 2.  **Tokenização** ([`tokenizer`]): WordPiece (crate `tokenizers`) com offsets e índice de palavra.
//! 3.  **Classificação** ([`model`]): uma label BIO por sub-palavra, via [`model::TokenClassifier`].
//! 4.  **Alinhamento** ([`align`]): a tag da primeira peça representa a palavra.
//! 5.  **Reconstrução** ([`span`]): agrupamento BIO em entidades, tolerante a sequências malformadas.
//! 6.  **Destaque** ([`render`]): HTML colorido montado por offset.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use bert_ner_core::NerPipeline;
//!
//! // 1. Instancia o pipeline com o modelo embutido
//! let pipeline = NerPipeline::builtin()?;
//!
//! // 2. Analisa o texto
//! let analysis = pipeline.analyze("Elon Musk works at SpaceX")?;
//!
//! // 3. Exibe as entidades encontradas
//! for entity in &analysis.entities {
//!     println!("Entidade: {} ({})", entity.text, entity.entity_type);
//! }
//! assert_eq!(analysis.entities.len(), 2);
//! # Ok::<(), bert_ner_core::ModelError>(())
//! ```
//!
//! ## Módulos Principais
//!
//! - [`span`]: o reconstrutor de entidades (o coração do crate).
//! - [`pipeline`]: orquestrador de uma requisição de análise.
//! - [`model`]: labels, classificador e o modelo global do processo.
//! - [`demo`]: vocabulário, gazetteers e textos de demonstração embutidos.

pub mod align;
pub mod config;
pub mod demo;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod render;
pub mod span;
pub mod tagger;
pub mod tokenizer;

pub use config::ModelSource;
pub use error::ModelError;
pub use model::{LabelSet, NerModel, TokenClassifier};
pub use pipeline::{Analysis, NerPipeline};
pub use span::{reconstruct_entities, TokenSpan, WordTag};
pub use tagger::{Entity, Tag};
pub use tokenizer::{Encoding, SubwordToken, SubwordTokenizer};
