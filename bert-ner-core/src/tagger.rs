//! # Esquema de Tags BIO
//!
//! Define o esquema de anotação **BIO** (Beginning-Inside-Outside) usado pelos
//! modelos de classificação de tokens.
//!
//! ## Tipos de Entidade
//!
//! Diferente de um vocabulário fechado, o tipo da entidade é qualquer string
//! definida pelo conjunto de labels do modelo (`id2label`). Os tipos mais comuns
//! (esquema CoNLL) são:
//!
//! | Tipo | Significado         | Exemplos                     |
//! |------|---------------------|------------------------------|
//! | PER  | Pessoa              | Elon Musk, Ada Lovelace      |
//! | ORG  | Organização         | SpaceX, United Nations       |
//! | LOC  | Local/Geográfico    | California, Mars             |
//! | MISC | Miscelânea          | Nobel Prize, Python          |
//!
//! ## Esquema BIO
//!
//! - `B-TIPO`: Begin — primeira palavra de uma entidade
//! - `I-TIPO`: Inside — palavras seguintes da mesma entidade
//! - `O`: Outside — não faz parte de nenhuma entidade

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Tag BIO atribuída a uma palavra (ou sub-palavra).
///
/// O parsing é **total**: qualquer label fora do formato `O`, `B-X` ou `I-X`
/// vira [`Tag::Outside`], inclusive `B-O`/`I-O`. Modelos nem sempre emitem
/// sequências bem formadas e o sistema precisa degradar de forma graciosa.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    /// **Begin**: início de uma entidade. Ex: **Elon** (B-PER) Musk.
    Begin(String),
    /// **Inside**: continuação de uma entidade. Ex: Elon **Musk** (I-PER).
    Inside(String),
    /// **Outside**: fora de qualquer entidade.
    Outside,
}

impl Tag {
    /// Parseia uma label textual (ex: "B-PER" → `Begin("PER")`).
    pub fn parse(label: &str) -> Self {
        let label = label.trim();
        match label.split_once('-') {
            // Tipo vazio ou "O" não é entidade
            Some((_, "" | "O")) => Tag::Outside,
            Some(("B", ty)) => Tag::Begin(ty.to_string()),
            Some(("I", ty)) => Tag::Inside(ty.to_string()),
            _ => Tag::Outside,
        }
    }

    /// Representação textual da tag (ex: "B-PER", "I-ORG", "O")
    pub fn label(&self) -> String {
        self.to_string()
    }

    /// Tipo da entidade (se for B- ou I-)
    pub fn entity_type(&self) -> Option<&str> {
        match self {
            Tag::Begin(ty) | Tag::Inside(ty) => Some(ty),
            Tag::Outside => None,
        }
    }

    pub fn is_outside(&self) -> bool {
        matches!(self, Tag::Outside)
    }

    /// Tag de continuação para as sub-palavras seguintes de uma palavra.
    ///
    /// `B-X` e `I-X` continuam como `I-X`; `O` continua `O`.
    pub fn continuation(&self) -> Tag {
        match self {
            Tag::Begin(ty) | Tag::Inside(ty) => Tag::Inside(ty.clone()),
            Tag::Outside => Tag::Outside,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Begin(ty) => write!(f, "B-{ty}"),
            Tag::Inside(ty) => write!(f, "I-{ty}"),
            Tag::Outside => f.write_str("O"),
        }
    }
}

impl Serialize for Tag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Tag::parse(&label))
    }
}

/// Uma entidade reconstruída a partir da sequência BIO.
///
/// `start`/`end` são offsets de byte no texto original (sempre em fronteiras de
/// `char`). O renderizador usa esses offsets diretamente, sem re-buscar o texto.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Texto da entidade (ex: "Elon Musk")
    pub text: String,
    /// Tipo da entidade (ex: "PER")
    #[serde(rename = "type")]
    pub entity_type: String,
    /// Posição de byte inicial no texto original
    pub start: usize,
    /// Posição de byte final no texto original (exclusiva)
    pub end: usize,
    /// Número de palavras que compõem a entidade
    pub words: usize,
}
