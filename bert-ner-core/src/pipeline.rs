//! # Pipeline NER — Orquestrador
//!
//! Conecta os módulos na ordem de uma requisição de análise:
//!
//! 1. **Tokenização** WordPiece (crate `tokenizers`) com offsets ([`crate::tokenizer`]).
//! 2. **Classificação** de cada sub-palavra ([`crate::model`]).
//! 3. **Alinhamento**: uma tag por palavra ([`crate::align`]).
//! 4. **Reconstrução** das entidades ([`crate::span`]).
//! 5. **Destaque** em HTML sob demanda ([`crate::render`]).
//!
//! Cada chamada é independente: o único estado compartilhado é o modelo, que é
//! somente leitura.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, warn};

use crate::align::align_words;
use crate::error::Result;
use crate::model::NerModel;
use crate::render::{entity_list_html, highlight_html};
use crate::span::{reconstruct_entities, WordTag};
use crate::tagger::Entity;
use crate::tokenizer::SubwordToken;

/// Resultado completo de uma análise.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    /// Texto original
    pub text: String,
    /// Sub-palavras com offsets (sem `[CLS]`/`[SEP]`)
    pub tokens: Vec<SubwordToken>,
    /// Uma tag por palavra de origem
    pub words: Vec<WordTag>,
    /// Entidades em ordem de aparição
    pub entities: Vec<Entity>,
    /// O texto excedeu o comprimento máximo do modelo
    pub truncated: bool,
    pub processing_ms: u64,
}

impl Analysis {
    /// Texto com as entidades destacadas (HTML escapado).
    pub fn highlighted_html(&self) -> String {
        highlight_html(&self.text, &self.entities)
    }

    /// Lista HTML das entidades, ou o aviso de que nada foi encontrado.
    pub fn entity_list(&self) -> String {
        entity_list_html(&self.entities)
    }
}

/// O pipeline NER principal.
///
/// Barato de clonar: compartilha o modelo via `Arc`.
#[derive(Debug, Clone)]
pub struct NerPipeline {
    model: Arc<NerModel>,
}

impl NerPipeline {
    pub fn new(model: Arc<NerModel>) -> Self {
        Self { model }
    }

    /// Pipeline com o modelo embutido de demonstração.
    pub fn builtin() -> Result<Self> {
        Ok(Self::new(Arc::new(NerModel::builtin()?)))
    }

    pub fn model(&self) -> &NerModel {
        &self.model
    }

    /// Analisa o texto e devolve tokens, tags por palavra e entidades.
    ///
    /// Texto vazio (ou só espaços) produz uma análise vazia. Erros vêm apenas
    /// do tokenizador.
    pub fn analyze(&self, text: &str) -> Result<Analysis> {
        let start = Instant::now();

        // === Passo 1: Tokenização ===
        let encoding = self.model.tokenizer().encode(text)?;
        if encoding.truncated {
            warn!(
                tokens = encoding.len(),
                max_length = self.model.tokenizer().max_length(),
                "texto truncado: palavras finais não serão analisadas"
            );
        }

        // === Passo 2: Classificação ===
        let tags = self.model.predict_tags(text, &encoding.tokens);

        // === Passo 3: Alinhamento ===
        let words = align_words(&encoding.tokens, &tags);

        // === Passo 4: Agrupamento de Entidades ===
        let entities = reconstruct_entities(text, &words);

        let processing_ms = start.elapsed().as_millis() as u64;
        debug!(
            chars = text.len(),
            tokens = encoding.len(),
            words = words.len(),
            entities = entities.len(),
            processing_ms,
            "análise concluída"
        );

        Ok(Analysis {
            text: text.to_string(),
            tokens: encoding.tokens,
            words,
            entities,
            truncated: encoding.truncated,
            processing_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::{builtin_vocab, demo_texts};
    use crate::model::GazetteerClassifier;
    use crate::render::NO_ENTITIES_MESSAGE;
    use crate::tokenizer::SubwordTokenizer;

    fn summary(analysis: &Analysis) -> Vec<(&str, &str)> {
        analysis
            .entities
            .iter()
            .map(|e| (e.text.as_str(), e.entity_type.as_str()))
            .collect()
    }

    #[test]
    fn test_pipeline_end_to_end() {
        let pipeline = NerPipeline::builtin().unwrap();
        let analysis = pipeline.analyze("Elon Musk works at SpaceX").unwrap();
        assert_eq!(summary(&analysis), vec![("Elon Musk", "PER"), ("SpaceX", "ORG")]);
        assert_eq!(analysis.words.len(), 5);
        assert!(!analysis.truncated);

        let word_tags: Vec<String> = analysis.words.iter().map(|w| w.tag.label()).collect();
        assert_eq!(word_tags, vec!["B-PER", "I-PER", "O", "O", "B-ORG"]);
    }

    #[test]
    fn test_pipeline_empty() {
        let pipeline = NerPipeline::builtin().unwrap();
        for text in ["", "   \n "] {
            let analysis = pipeline.analyze(text).unwrap();
            assert!(analysis.tokens.is_empty());
            assert!(analysis.entities.is_empty());
        }
    }

    #[test]
    fn test_pipeline_repeated_names_are_highlighted_by_offset() {
        let pipeline = NerPipeline::builtin().unwrap();
        let text = "Paris Hilton flew to Paris, and the Paris office of Google welcomed her.";
        let analysis = pipeline.analyze(text).unwrap();
        assert_eq!(
            summary(&analysis),
            vec![("Paris Hilton", "PER"), ("Paris", "LOC"), ("Paris", "LOC"), ("Google", "ORG")]
        );

        let html = analysis.highlighted_html();
        assert_eq!(html.matches("<span class=\"entity\"").count(), 4);
        assert!(html.ends_with(" welcomed her."));
    }

    #[test]
    fn test_pipeline_entities_cover_source_text() {
        let pipeline = NerPipeline::builtin().unwrap();
        for (_, text) in demo_texts() {
            let analysis = pipeline.analyze(text).unwrap();
            assert!(!analysis.entities.is_empty(), "sem entidades em: {text}");
            for pair in analysis.entities.windows(2) {
                assert!(pair[0].end <= pair[1].start);
            }
            for entity in &analysis.entities {
                assert_eq!(&text[entity.start..entity.end], entity.text);
            }
        }
    }

    #[test]
    fn test_pipeline_entity_list() {
        let pipeline = NerPipeline::builtin().unwrap();
        let analysis = pipeline.analyze("nothing here").unwrap();
        assert!(analysis.entity_list().contains(NO_ENTITIES_MESSAGE));

        let analysis = pipeline.analyze("Elon Musk works at SpaceX").unwrap();
        let list = analysis.entity_list();
        assert!(list.contains("<strong>Elon Musk</strong>"));
        assert!(list.contains("<strong>SpaceX</strong>"));
    }

    #[test]
    fn test_pipeline_truncates_long_text() {
        // max_length 5 → três sub-palavras úteis: "elon", "musk", "works"
        let tokenizer = SubwordTokenizer::from_vocab(builtin_vocab(), true, 5).unwrap();
        let model = NerModel::new("truncado", tokenizer, GazetteerClassifier::builtin().unwrap());
        let pipeline = NerPipeline::new(Arc::new(model));

        let text = "Elon Musk works at SpaceX";
        let analysis = pipeline.analyze(text).unwrap();
        assert!(analysis.truncated);
        assert_eq!(analysis.tokens.len(), 3);
        assert_eq!(analysis.words.len(), 3);
        assert_eq!(summary(&analysis), vec![("Elon Musk", "PER")]);

        // O texto devolvido é o original, inclusive a parte não analisada
        assert_eq!(analysis.text, text);
        assert!(analysis.highlighted_html().ends_with(" works at SpaceX"));

        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["truncated"], true);
    }
}
