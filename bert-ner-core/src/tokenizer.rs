//! # Tokenização em Sub-palavras com Mapeamento de Offsets
//!
//! Modelos BERT não enxergam palavras, e sim **sub-palavras** (WordPiece):
//! "SpaceX" pode virar `space` + `##x`. Para devolver as predições ao texto
//! original, cada sub-palavra carrega:
//!
//! - o intervalo de bytes `[start, end)` que ocupa no texto original;
//! - o índice da palavra de origem (`word_index`);
//! - se é a primeira peça da palavra (`is_word_start`).
//!
//! A tokenização é feita pela biblioteca `tokenizers` do Hugging Face, a mesma
//! usada no treino dos modelos. Offsets e índices de palavra vêm direto do
//! `Encoding` dela.
//!
//! ## Fontes
//!
//! - `tokenizer.json`: o tokenizador completo publicado junto ao modelo.
//! - `vocab.txt` (ou o vocabulário embutido): monta o pipeline BERT padrão
//!   (`BertNormalizer` + `BertPreTokenizer` + `WordPiece` + `[CLS]`/`[SEP]`).
//!
//! ## Truncamento
//!
//! No máximo `max_length` posições contando `[CLS]` e `[SEP]`. O que sobra vai
//! para o `overflowing` do `Encoding` e é descartado; a análise só registra
//! que houve corte.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use bert_ner_core::tokenizer::SubwordTokenizer;
//!
//! let tokenizer = SubwordTokenizer::builtin()?;
//! let encoding = tokenizer.encode("Elon Musk works at SpaceX")?;
//! assert!(encoding.tokens.iter().all(|t| t.end <= 25));
//! # Ok::<(), bert_ner_core::ModelError>(())
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokenizers::models::wordpiece::WordPiece;
use tokenizers::normalizers::bert::BertNormalizer;
use tokenizers::pre_tokenizers::bert::BertPreTokenizer;
use tokenizers::processors::bert::BertProcessing;
use tokenizers::{OffsetReferential, OffsetType, PreTokenizedString, PreTokenizer, Tokenizer, TruncationParams};

use crate::demo;
use crate::error::{ModelError, Result};

pub const UNK_TOKEN: &str = "[UNK]";
pub const CLS_TOKEN: &str = "[CLS]";
pub const SEP_TOKEN: &str = "[SEP]";
pub const PAD_TOKEN: &str = "[PAD]";

/// Prefixo das peças de continuação no vocabulário WordPiece
const CONTINUATION_PREFIX: &str = "##";

/// Palavras mais longas que isso viram `[UNK]` direto
const MAX_INPUT_CHARS_PER_WORD: usize = 100;

/// Comprimento máximo padrão de sequência (BERT base)
pub const DEFAULT_MAX_LENGTH: usize = 512;

/// `[CLS]` + `[SEP]` + ao menos uma peça
pub const MIN_MAX_LENGTH: usize = 3;

/// Uma sub-palavra produzida pelo tokenizador.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubwordToken {
    /// Peça do vocabulário (ex: "space", "##x", "[UNK]")
    pub text: String,
    /// Id da peça no vocabulário
    pub id: u32,
    /// Índice de byte inicial no texto original (inclusivo)
    pub start: usize,
    /// Índice de byte final no texto original (exclusivo)
    pub end: usize,
    /// Índice da palavra de origem
    pub word_index: usize,
    /// Primeira peça da palavra?
    pub is_word_start: bool,
    /// Posição sequencial da peça (sem contar tokens especiais)
    pub index: usize,
}

/// Resultado da tokenização de um texto.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encoding {
    pub tokens: Vec<SubwordToken>,
    /// O texto excedeu `max_length` e peças foram descartadas
    pub truncated: bool,
}

impl Encoding {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Número de palavras de origem presentes (após truncamento)
    pub fn word_count(&self) -> usize {
        self.tokens.iter().filter(|t| t.is_word_start).count()
    }
}

/// Tokenizador de sub-palavras sobre `tokenizers::Tokenizer`.
#[derive(Clone)]
pub struct SubwordTokenizer {
    inner: Tokenizer,
    max_length: usize,
}

impl SubwordTokenizer {
    /// Tokenizador BERT sem distinção de caixa sobre o vocabulário embutido.
    pub fn builtin() -> Result<Self> {
        Self::from_vocab(demo::builtin_vocab(), true, DEFAULT_MAX_LENGTH)
    }

    /// Carrega um `tokenizer.json`.
    pub fn from_file(path: &Path, max_length: usize) -> Result<Self> {
        let inner = Tokenizer::from_file(path)
            .map_err(|e| ModelError::Tokenizer(format!("{}: {e}", path.display())))?;
        Self::configure(inner, max_length)
    }

    /// Constrói a partir do conteúdo de um `vocab.txt` (uma peça por linha, id = número da linha).
    pub fn from_vocab_text(contents: &str, do_lower_case: bool, max_length: usize) -> Result<Self> {
        let tokens = contents.lines().map(|line| line.trim_end_matches('\r').to_string());
        Self::from_vocab(tokens, do_lower_case, max_length)
    }

    /// Monta o pipeline BERT sobre um vocabulário em ordem de id.
    ///
    /// Peças repetidas mantêm o primeiro id. Exige `[UNK]`, `[CLS]` e `[SEP]`.
    pub fn from_vocab(
        tokens: impl IntoIterator<Item = String>,
        do_lower_case: bool,
        max_length: usize,
    ) -> Result<Self> {
        let mut vocab: HashMap<String, u32> = HashMap::new();
        for (id, token) in tokens.into_iter().enumerate() {
            if !token.is_empty() {
                vocab.entry(token).or_insert(id as u32);
            }
        }
        if vocab.is_empty() {
            return Err(ModelError::InvalidVocabulary("vocabulário vazio".into()));
        }

        let special_id = |token: &str| {
            vocab
                .get(token)
                .copied()
                .ok_or_else(|| ModelError::InvalidVocabulary(format!("token {token} ausente")))
        };
        special_id(UNK_TOKEN)?;
        let cls_id = special_id(CLS_TOKEN)?;
        let sep_id = special_id(SEP_TOKEN)?;

        let model = WordPiece::builder()
            .vocab(vocab.into_iter().collect())
            .unk_token(UNK_TOKEN.to_string())
            .continuing_subword_prefix(CONTINUATION_PREFIX.to_string())
            .max_input_chars_per_word(MAX_INPUT_CHARS_PER_WORD)
            .build()
            .map_err(|e| ModelError::InvalidVocabulary(e.to_string()))?;

        let mut inner = Tokenizer::new(model);
        inner
            .with_normalizer(Some(BertNormalizer::new(true, true, None, do_lower_case)))
            .with_pre_tokenizer(Some(BertPreTokenizer))
            .with_post_processor(Some(BertProcessing::new(
                (SEP_TOKEN.to_string(), sep_id),
                (CLS_TOKEN.to_string(), cls_id),
            )));
        Self::configure(inner, max_length)
    }

    /// Sem padding; truncamento em `max_length` (com os tokens especiais).
    fn configure(mut inner: Tokenizer, max_length: usize) -> Result<Self> {
        if max_length < MIN_MAX_LENGTH {
            return Err(ModelError::InvalidConfig(format!(
                "max_length deve ser >= {MIN_MAX_LENGTH} (recebido {max_length})"
            )));
        }
        inner.with_padding(None);
        inner
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| ModelError::Tokenizer(e.to_string()))?;
        Ok(Self { inner, max_length })
    }

    pub fn vocab_size(&self) -> usize {
        self.inner.get_vocab_size(true)
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Tokeniza o texto em sub-palavras, preservando offsets.
    ///
    /// Tokens especiais (`[CLS]`, `[SEP]`) ficam de fora do resultado.
    pub fn encode(&self, text: &str) -> Result<Encoding> {
        let encoded = self
            .inner
            .encode(text, true)
            .map_err(|e| ModelError::Tokenizer(e.to_string()))?;

        let mut encoding = Encoding {
            tokens: Vec::with_capacity(encoded.len()),
            truncated: !encoded.get_overflowing().is_empty(),
        };

        let pieces = encoded
            .get_ids()
            .iter()
            .zip(encoded.get_tokens())
            .zip(encoded.get_offsets())
            .zip(encoded.get_word_ids())
            .zip(encoded.get_special_tokens_mask());

        let mut previous_word: Option<u32> = None;
        for ((((&id, piece), &(start, end)), &word), &special) in pieces {
            let Some(word) = word.filter(|_| special == 0) else {
                continue;
            };
            let index = encoding.tokens.len();
            encoding.tokens.push(SubwordToken {
                text: piece.clone(),
                id,
                start,
                end,
                word_index: word as usize,
                is_word_start: previous_word != Some(word),
                index,
            });
            previous_word = Some(word);
        }

        Ok(encoding)
    }
}

impl fmt::Debug for SubwordTokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubwordTokenizer")
            .field("vocab", &self.vocab_size())
            .field("max_length", &self.max_length)
            .finish()
    }
}

/// Divide o texto em palavras como a pré-tokenização BERT: espaços separam
/// palavras e cada sinal de pontuação vira uma palavra própria.
///
/// Devolve intervalos `[start, end)` de bytes no texto original.
pub fn split_words(text: &str) -> Result<Vec<(usize, usize)>> {
    let mut pretokenized = PreTokenizedString::from(text);
    BertPreTokenizer
        .pre_tokenize(&mut pretokenized)
        .map_err(|e| ModelError::Tokenizer(e.to_string()))?;
    Ok(pretokenized
        .get_splits(OffsetReferential::Original, OffsetType::Byte)
        .into_iter()
        .map(|(_, offsets, _)| offsets)
        .collect())
}

#[cfg(test)]
impl SubwordTokenizer {
    pub(crate) fn save(&self, path: &Path) {
        self.inner.save(path, false).unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_tokenizer(max_length: usize) -> SubwordTokenizer {
        let vocab = "[PAD]\n[UNK]\n[CLS]\n[SEP]\nspace\n##x\nelon\nmusk\nun\n##aff\n##able\n,\n.\nworks\nat";
        SubwordTokenizer::from_vocab_text(vocab, true, max_length).unwrap()
    }

    fn pieces(encoding: &Encoding) -> Vec<&str> {
        encoding.tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_split_words_isolates_punctuation() {
        let text = "Musk, CEO of SpaceX.";
        let words: Vec<&str> = split_words(text).unwrap().iter().map(|&(s, e)| &text[s..e]).collect();
        assert_eq!(words, vec!["Musk", ",", "CEO", "of", "SpaceX", "."]);
    }

    #[test]
    fn test_split_words_empty_and_whitespace() {
        assert!(split_words("").unwrap().is_empty());
        assert!(split_words("   \n\t ").unwrap().is_empty());
    }

    #[test]
    fn test_wordpiece_split() {
        let tokenizer = small_tokenizer(DEFAULT_MAX_LENGTH);
        let encoding = tokenizer.encode("SpaceX unaffable").unwrap();
        assert_eq!(pieces(&encoding), vec!["space", "##x", "un", "##aff", "##able"]);

        let flags: Vec<bool> = encoding.tokens.iter().map(|t| t.is_word_start).collect();
        assert_eq!(flags, vec![true, false, true, false, false]);

        let words: Vec<usize> = encoding.tokens.iter().map(|t| t.word_index).collect();
        assert_eq!(words, vec![0, 0, 1, 1, 1]);
        assert_eq!(encoding.word_count(), 2);
    }

    #[test]
    fn test_offsets_slice_original_text() {
        let tokenizer = small_tokenizer(DEFAULT_MAX_LENGTH);
        let text = "Elon Musk works at SpaceX.";
        let encoding = tokenizer.encode(text).unwrap();
        let surfaces: Vec<&str> = encoding.tokens.iter().map(|t| &text[t.start..t.end]).collect();
        assert_eq!(surfaces, vec!["Elon", "Musk", "works", "at", "Space", "X", "."]);
        for (i, token) in encoding.tokens.iter().enumerate() {
            assert_eq!(token.index, i);
        }
        // [CLS] e [SEP] não aparecem
        assert!(encoding.tokens.iter().all(|t| t.text != CLS_TOKEN && t.text != SEP_TOKEN));
    }

    #[test]
    fn test_bert_normalization_and_punctuation() {
        let vocab = "[PAD]\n[UNK]\n[CLS]\n[SEP]\njose\ndon\n'\nt\nu\n.\ns";
        let tokenizer = SubwordTokenizer::from_vocab_text(vocab, true, DEFAULT_MAX_LENGTH).unwrap();

        // Acentos removidos junto com a caixa; o offset ainda cobre "José" inteiro
        let text = "José";
        let encoding = tokenizer.encode(text).unwrap();
        assert_eq!(pieces(&encoding), vec!["jose"]);
        assert_eq!((encoding.tokens[0].start, encoding.tokens[0].end), (0, text.len()));

        assert_eq!(pieces(&tokenizer.encode("don't").unwrap()), vec!["don", "'", "t"]);
        assert_eq!(pieces(&tokenizer.encode("U.S.").unwrap()), vec!["u", ".", "s", "."]);
    }

    #[test]
    fn test_unknown_word_becomes_single_unk() {
        let tokenizer = small_tokenizer(DEFAULT_MAX_LENGTH);
        let text = "Zürich";
        let encoding = tokenizer.encode(text).unwrap();
        assert_eq!(pieces(&encoding), vec![UNK_TOKEN]);
        assert_eq!((encoding.tokens[0].start, encoding.tokens[0].end), (0, text.len()));
        assert!(encoding.tokens[0].is_word_start);
    }

    #[test]
    fn test_truncation() {
        // max_length 5 → 3 peças úteis
        let tokenizer = small_tokenizer(5);
        let encoding = tokenizer.encode("Elon Musk works at SpaceX").unwrap();
        assert!(encoding.truncated);
        assert_eq!(pieces(&encoding), vec!["elon", "musk", "works"]);

        let encoding = tokenizer.encode("Elon Musk").unwrap();
        assert!(!encoding.truncated);
    }

    #[test]
    fn test_truncation_inside_word_keeps_first_piece() {
        // 1 peça útil: só a primeira peça de "SpaceX"
        let tokenizer = small_tokenizer(3);
        let encoding = tokenizer.encode("SpaceX").unwrap();
        assert!(encoding.truncated);
        assert_eq!(pieces(&encoding), vec!["space"]);
    }

    #[test]
    fn test_empty_text() {
        let encoding = small_tokenizer(DEFAULT_MAX_LENGTH).encode("").unwrap();
        assert!(encoding.is_empty());
        assert!(!encoding.truncated);
    }

    #[test]
    fn test_case_sensitive_vocab() {
        let vocab = "[UNK]\n[CLS]\n[SEP]\nElon\n";
        let tokenizer = SubwordTokenizer::from_vocab_text(vocab, false, 16).unwrap();
        assert_eq!(pieces(&tokenizer.encode("Elon").unwrap()), vec!["Elon"]);
        assert_eq!(pieces(&tokenizer.encode("elon").unwrap()), vec![UNK_TOKEN]);
    }

    #[test]
    fn test_invalid_vocab() {
        assert!(matches!(
            SubwordTokenizer::from_vocab_text("", true, 16),
            Err(ModelError::InvalidVocabulary(_))
        ));
        assert!(SubwordTokenizer::from_vocab_text("a\nb\n", true, 16).is_err());
        // Sem [CLS]/[SEP] não há como montar a sequência
        assert!(SubwordTokenizer::from_vocab_text("[UNK]\na\n", true, 16).is_err());
    }

    #[test]
    fn test_rejects_tiny_max_length() {
        let vocab = "[UNK]\n[CLS]\n[SEP]\na";
        assert!(matches!(
            SubwordTokenizer::from_vocab_text(vocab, true, 2),
            Err(ModelError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_from_tokenizer_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokenizer.json");
        small_tokenizer(DEFAULT_MAX_LENGTH).save(&path);

        let tokenizer = SubwordTokenizer::from_file(&path, 5).unwrap();
        assert_eq!(tokenizer.max_length(), 5);
        let encoding = tokenizer.encode("Elon Musk works at SpaceX").unwrap();
        assert_eq!(pieces(&encoding), vec!["elon", "musk", "works"]);
        assert!(encoding.truncated);
    }

    #[test]
    fn test_from_missing_tokenizer_json() {
        let dir = tempfile::tempdir().unwrap();
        let err = SubwordTokenizer::from_file(&dir.path().join("tokenizer.json"), 16).unwrap_err();
        assert!(matches!(err, ModelError::Tokenizer(_)));
    }

    #[test]
    fn test_builtin_covers_ascii_words() {
        let tokenizer = SubwordTokenizer::builtin().unwrap();
        let encoding = tokenizer.encode("Quixotic zebras jumped over 42 fences!").unwrap();
        assert!(encoding.tokens.iter().all(|t| t.text != UNK_TOKEN));
        assert_eq!(encoding.word_count(), 7);
    }
}
