//! # Alinhamento Sub-palavra → Palavra
//!
//! O modelo produz uma tag por sub-palavra; a reconstrução precisa de uma tag
//! por palavra. A convenção é usar a tag da **primeira peça** de cada palavra.
//!
//! O span devolvido cobre a palavra inteira (da primeira à última peça que
//! sobreviveu ao truncamento), para que "SpaceX" (`space` + `##x`) seja
//! destacado por completo e não só "Space".

use crate::span::{TokenSpan, WordTag};
use crate::tagger::Tag;
use crate::tokenizer::SubwordToken;

/// Seleciona uma tag por palavra de origem, usando o mapeamento de offsets.
///
/// `tags` é paralelo a `tokens`; se for mais curto, as palavras sem tag ficam `O`.
pub fn align_words(tokens: &[SubwordToken], tags: &[Tag]) -> Vec<WordTag> {
    let mut words: Vec<WordTag> = Vec::new();

    for (i, token) in tokens.iter().enumerate() {
        if token.is_word_start {
            let tag = tags.get(i).cloned().unwrap_or(Tag::Outside);
            words.push(WordTag::new(TokenSpan::word(token.start, token.end), tag));
        } else if let Some(last) = words.last_mut() {
            // Peça de continuação: só estende o span da palavra
            last.span.end = last.span.end.max(token.end);
        }
    }

    words
}
