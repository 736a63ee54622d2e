//! # Reconstrução de Spans a partir de Tags BIO
//!
//! O modelo prevê uma tag por **sub-palavra**, mas o usuário quer ver entidades
//! legíveis ("Elon Musk", "SpaceX"). Este módulo faz a ponte: recebe uma tag por
//! palavra (a tag da primeira sub-palavra, escolhida pelo [`crate::align`]) e
//! agrupa palavras consecutivas em entidades.
//!
//! ## Algoritmo
//! Passada linear única, sem backtracking, com um acumulador (tipo + span):
//! 1. `B-X`: fecha o acumulador atual e abre um novo do tipo X.
//! 2. `I-X` com acumulador do tipo X: estende o acumulador.
//! 3. `I-X` com acumulador de outro tipo (ou vazio): tratado como `B-X`.
//! 4. `O`: fecha o acumulador e volta ao estado vazio.
//!
//! A função é **total**: nenhuma sequência de tags, por mais malformada que
//! seja, causa erro. No pior caso cada palavra vira uma entidade própria.

use serde::{Deserialize, Serialize};

use crate::tagger::{Entity, Tag};

/// Intervalo `[start, end)` de bytes no texto original.
///
/// `is_word_start` marca a primeira sub-palavra de uma palavra de origem.
/// Spans de uma mesma sequência não se sobrepõem e estão ordenados por `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSpan {
    /// Índice do byte inicial (inclusivo)
    pub start: usize,
    /// Índice do byte final (exclusivo)
    pub end: usize,
    /// Primeira peça da palavra de origem?
    pub is_word_start: bool,
}

impl TokenSpan {
    pub fn new(start: usize, end: usize, is_word_start: bool) -> Self {
        Self { start, end, is_word_start }
    }

    /// Span de uma palavra inteira (sempre `is_word_start`).
    pub fn word(start: usize, end: usize) -> Self {
        Self::new(start, end, true)
    }
}

/// Par (span da palavra, tag prevista) consumido pelo reconstrutor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordTag {
    pub span: TokenSpan,
    pub tag: Tag,
}

impl WordTag {
    pub fn new(span: TokenSpan, tag: Tag) -> Self {
        Self { span, tag }
    }
}

/// Entidade em construção.
struct Accumulator {
    entity_type: String,
    start: usize,
    end: usize,
    words: usize,
}

impl Accumulator {
    fn open(entity_type: &str, span: &TokenSpan) -> Self {
        Self {
            entity_type: entity_type.to_string(),
            start: span.start,
            end: span.end,
            words: 1,
        }
    }

    fn extend(&mut self, span: &TokenSpan) {
        self.end = span.end;
        self.words += 1;
    }
}

/// Agrupa palavras rotuladas em entidades.
///
/// Entradas cujo span não é início de palavra são ignoradas: apenas a primeira
/// sub-palavra representa a palavra.
///
/// # Exemplo
/// `"Elon Musk works at SpaceX"` com `[B-PER, I-PER, O, O, B-ORG]`
/// → `[Entity("Elon Musk", PER), Entity("SpaceX", ORG)]`
pub fn reconstruct_entities(text: &str, words: &[WordTag]) -> Vec<Entity> {
    let mut entities = Vec::new();
    let mut current: Option<Accumulator> = None;

    for word in words.iter().filter(|w| w.span.is_word_start) {
        match &word.tag {
            Tag::Inside(ty) if current.as_ref().is_some_and(|acc| acc.entity_type == *ty) => {
                if let Some(acc) = current.as_mut() {
                    acc.extend(&word.span);
                }
            }
            // B-X, ou I-X que não pode estender o acumulador (regra de incompatibilidade)
            Tag::Begin(ty) | Tag::Inside(ty) => {
                flush(text, current.take(), &mut entities);
                current = Some(Accumulator::open(ty, &word.span));
            }
            Tag::Outside => flush(text, current.take(), &mut entities),
        }
    }

    // Fecha a última entidade se aberta
    flush(text, current.take(), &mut entities);

    entities
}

/// Emite o acumulador como entidade, fatiando o texto original.
///
/// Um span que não fatia o texto (fora do intervalo ou no meio de um `char`)
/// não gera entidade.
fn flush(text: &str, acc: Option<Accumulator>, entities: &mut Vec<Entity>) {
    let Some(acc) = acc else { return };
    if acc.entity_type.is_empty() || acc.entity_type == "O" {
        return;
    }
    if let Some(surface) = text.get(acc.start..acc.end) {
        entities.push(Entity {
            text: surface.to_string(),
            entity_type: acc.entity_type,
            start: acc.start,
            end: acc.end,
            words: acc.words,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Constrói pares (span, tag) a partir de palavras separadas por espaço.
    fn words_with_tags(text: &str, tags: &[&str]) -> Vec<WordTag> {
        let mut offset = 0;
        text.split(' ')
            .zip(tags)
            .map(|(word, tag)| {
                let start = offset;
                offset += word.len() + 1;
                WordTag::new(TokenSpan::word(start, start + word.len()), Tag::parse(tag))
            })
            .collect()
    }

    fn summary(entities: &[Entity]) -> Vec<(&str, &str)> {
        entities.iter().map(|e| (e.text.as_str(), e.entity_type.as_str())).collect()
    }

    #[test]
    fn test_end_to_end_example() {
        let text = "Elon Musk works at SpaceX";
        let words = words_with_tags(text, &["B-PER", "I-PER", "O", "O", "B-ORG"]);
        let entities = reconstruct_entities(text, &words);
        assert_eq!(summary(&entities), vec![("Elon Musk", "PER"), ("SpaceX", "ORG")]);
        assert_eq!(entities[0].words, 2);
        assert_eq!((entities[1].start, entities[1].end), (19, 25));
    }

    #[test]
    fn test_all_outside_is_empty() {
        let text = "nothing to see here";
        let words = words_with_tags(text, &["O", "O", "O", "O"]);
        assert!(reconstruct_entities(text, &words).is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(reconstruct_entities("", &[]).is_empty());
    }

    #[test]
    fn test_all_begin_gives_one_entity_per_word() {
        let text = "Paris London Rome";
        let words = words_with_tags(text, &["B-LOC", "B-LOC", "B-LOC"]);
        let entities = reconstruct_entities(text, &words);
        assert_eq!(
            summary(&entities),
            vec![("Paris", "LOC"), ("London", "LOC"), ("Rome", "LOC")]
        );
    }

    #[test]
    fn test_contiguous_extension() {
        let text = "Juan Carlos Ferrero";
        let words = words_with_tags(text, &["B-PER", "I-PER", "I-PER"]);
        let entities = reconstruct_entities(text, &words);
        assert_eq!(summary(&entities), vec![("Juan Carlos Ferrero", "PER")]);
        assert_eq!(entities[0].words, 3);
    }

    #[test]
    fn test_type_mismatch_is_boundary() {
        let text = "Musk Tesla";
        let words = words_with_tags(text, &["B-PER", "I-ORG"]);
        let entities = reconstruct_entities(text, &words);
        assert_eq!(summary(&entities), vec![("Musk", "PER"), ("Tesla", "ORG")]);
    }

    #[test]
    fn test_dangling_inside_opens_entity() {
        let text = "Berlin";
        let words = words_with_tags(text, &["I-LOC"]);
        let entities = reconstruct_entities(text, &words);
        assert_eq!(summary(&entities), vec![("Berlin", "LOC")]);
    }

    #[test]
    fn test_inside_after_outside_opens_entity() {
        let text = "in New York";
        let words = words_with_tags(text, &["O", "I-LOC", "I-LOC"]);
        let entities = reconstruct_entities(text, &words);
        assert_eq!(summary(&entities), vec![("New York", "LOC")]);
    }

    #[test]
    fn test_begin_after_begin_same_type_splits() {
        let text = "Alice Bob";
        let words = words_with_tags(text, &["B-PER", "B-PER"]);
        assert_eq!(reconstruct_entities(text, &words).len(), 2);
    }

    #[test]
    fn test_slice_keeps_inner_punctuation() {
        // Spans de palavra com pontuação entre elas: o texto é fatiado, não re-juntado
        let text = "Apple, Inc.";
        let words = vec![
            WordTag::new(TokenSpan::word(0, 5), Tag::parse("B-ORG")),
            WordTag::new(TokenSpan::word(5, 6), Tag::parse("I-ORG")),
            WordTag::new(TokenSpan::word(7, 10), Tag::parse("I-ORG")),
        ];
        let entities = reconstruct_entities(text, &words);
        assert_eq!(summary(&entities), vec![("Apple, Inc", "ORG")]);
    }

    #[test]
    fn test_continuation_pieces_are_skipped() {
        let text = "SpaceX launched";
        let words = vec![
            WordTag::new(TokenSpan::new(0, 6, true), Tag::parse("B-ORG")),
            // Peça de continuação com tag divergente: não deve abrir nova entidade
            WordTag::new(TokenSpan::new(5, 6, false), Tag::parse("B-MISC")),
            WordTag::new(TokenSpan::new(7, 15, true), Tag::parse("O")),
        ];
        let entities = reconstruct_entities(text, &words);
        assert_eq!(summary(&entities), vec![("SpaceX", "ORG")]);
    }

    #[test]
    fn test_outside_type_never_becomes_entity() {
        let text = "foo bar";
        let words = words_with_tags(text, &["B-O", "O"]);
        assert!(reconstruct_entities(text, &words).is_empty());

        // Tag construída direto, sem passar pelo parsing
        let words = vec![WordTag::new(TokenSpan::word(0, 3), Tag::Begin("O".into()))];
        assert!(reconstruct_entities(text, &words).is_empty());
    }

    #[test]
    fn test_out_of_range_span_is_dropped() {
        let text = "short";
        let words = vec![WordTag::new(TokenSpan::word(0, 50), Tag::parse("B-PER"))];
        assert!(reconstruct_entities(text, &words).is_empty());
    }

    #[test]
    fn test_multibyte_text() {
        let text = "José visitou São Paulo";
        let words = words_with_tags(text, &["B-PER", "O", "B-LOC", "I-LOC"]);
        let entities = reconstruct_entities(text, &words);
        assert_eq!(summary(&entities), vec![("José", "PER"), ("São Paulo", "LOC")]);
    }

    fn tag_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("O".to_string()),
            Just("B-PER".to_string()),
            Just("I-PER".to_string()),
            Just("B-ORG".to_string()),
            Just("I-ORG".to_string()),
            Just("I-LOC".to_string()),
            Just("B-O".to_string()),
            Just("garbage".to_string()),
        ]
    }

    proptest! {
        #[test]
        fn prop_entities_are_ordered_and_disjoint(tags in prop::collection::vec(tag_strategy(), 0..40)) {
            let text = vec!["word"; tags.len()].join(" ");
            let tag_refs: Vec<&str> = tags.iter().map(String::as_str).collect();
            let words = words_with_tags(&text, &tag_refs);
            let entities = reconstruct_entities(&text, &words);

            for pair in entities.windows(2) {
                prop_assert!(pair[0].end <= pair[1].start);
            }
            for entity in &entities {
                prop_assert!(!entity.entity_type.is_empty());
                prop_assert!(entity.entity_type != "O");
                prop_assert_eq!(&text[entity.start..entity.end], entity.text.as_str());
            }
            let total_words: usize = entities.iter().map(|e| e.words).sum();
            let tagged = tags.iter().filter(|t| !Tag::parse(t).is_outside()).count();
            prop_assert_eq!(total_words, tagged);
        }

        #[test]
        fn prop_all_outside_gives_nothing(n in 0usize..30) {
            let text = vec!["w"; n].join(" ");
            let tags = vec!["O"; n];
            let words = words_with_tags(&text, &tags);
            prop_assert!(reconstruct_entities(&text, &words).is_empty());
        }
    }
}
