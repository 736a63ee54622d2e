//! # Recursos Embutidos de Demonstração
//!
//! Vocabulário WordPiece reduzido, conjunto de labels CoNLL, gazetteers e textos
//! de exemplo. Permitem rodar a interface sem baixar um modelo: o vocabulário
//! cobre qualquer palavra ASCII (caracteres isolados + peças `##`), e os
//! gazetteers alimentam o [`crate::model::GazetteerClassifier`].

use std::collections::BTreeMap;

use crate::tokenizer::{CLS_TOKEN, PAD_TOKEN, SEP_TOKEN, UNK_TOKEN};

/// Labels do modelo embutido, na ordem dos ids (esquema CoNLL-2003)
pub const BUILTIN_LABELS: &[&str] = &[
    "O", "B-PER", "I-PER", "B-ORG", "I-ORG", "B-LOC", "I-LOC", "B-MISC", "I-MISC",
];

/// Palavras inteiras frequentes do vocabulário embutido
const COMMON_WORDS: &[&str] = &[
    "the", "of", "and", "to", "in", "at", "for", "on", "with", "from", "by",
    "is", "was", "are", "were", "be", "has", "have", "had", "it", "its", "his", "her",
    "their", "they", "he", "she", "we", "this", "that", "new", "first", "last", "after",
    "before", "will", "would", "said", "announced", "works", "work", "worked", "founded",
    "ceo", "president", "mission", "company", "city", "near", "visited", "met", "mr",
    "mrs", "dr", "space", "mars", "moon", "california", "london", "paris", "berlin",
    "york", "united", "nations", "states", "apple", "google", "microsoft", "tesla",
    "elon", "musk", "ada", "love", "lace", "marie", "curie", "nobel", "prize", "world",
    "cup", "university", "bank", "group", "inc", "corp", "ltd", "headquarters",
];

/// Sufixos frequentes (peças de continuação)
const COMMON_SUFFIXES: &[&str] = &[
    "##es", "##ed", "##ing", "##er", "##ers", "##ly", "##ion", "##tion", "##al",
    "##ic", "##ity", "##ment", "##ness", "##ian", "##an", "##land", "##ton", "##ford",
];

/// Vocabulário WordPiece embutido (id = posição na lista).
pub fn builtin_vocab() -> Vec<String> {
    let mut vocab: Vec<String> = [PAD_TOKEN, UNK_TOKEN, CLS_TOKEN, SEP_TOKEN, "[MASK]"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    // Pontuação ASCII: cada sinal é uma palavra própria após a pré-tokenização
    vocab.extend((b'!'..=b'~').map(char::from).filter(|c| !c.is_ascii_alphanumeric()).map(String::from));

    let alphanumerics: Vec<char> = ('a'..='z').chain('0'..='9').collect();
    vocab.extend(alphanumerics.iter().map(|c| c.to_string()));
    vocab.extend(alphanumerics.iter().map(|c| format!("##{c}")));

    vocab.extend(COMMON_WORDS.iter().map(|s| s.to_string()));
    vocab.extend(COMMON_SUFFIXES.iter().map(|s| s.to_string()));
    vocab
}

/// Gazetteers embutidos: tipo → formas de superfície conhecidas.
pub fn builtin_gazetteer() -> BTreeMap<String, Vec<String>> {
    let entries: &[(&str, &[&str])] = &[
        (
            "PER",
            &[
                "Elon Musk", "Ada Lovelace", "Marie Curie", "Alan Turing", "Grace Hopper",
                "Barack Obama", "Angela Merkel", "Tim Cook", "Satya Nadella", "Sundar Pichai",
                "Lula", "Paris Hilton",
            ],
        ),
        (
            "ORG",
            &[
                "SpaceX", "Tesla", "NASA", "Google", "Apple", "Microsoft", "OpenAI",
                "United Nations", "European Union", "Petrobras", "FIFA", "Hugging Face",
            ],
        ),
        (
            "LOC",
            &[
                "California", "Mars", "Texas", "London", "Paris", "Berlin", "New York",
                "San Francisco", "Brazil", "São Paulo", "Europe", "Moon",
            ],
        ),
        (
            "MISC",
            &["Nobel Prize", "World Cup", "Falcon 9", "Starship", "Python", "Rust"],
        ),
    ];

    entries
        .iter()
        .map(|(ty, names)| (ty.to_string(), names.iter().map(|n| n.to_string()).collect()))
        .collect()
}

/// Textos de demonstração: (domínio, texto)
pub fn demo_texts() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "Tecnologia",
            "Elon Musk, the CEO of SpaceX, announced a new mission to Mars from their headquarters in California.",
        ),
        (
            "Ciência",
            "Marie Curie received the Nobel Prize twice, and Ada Lovelace wrote the first program in London.",
        ),
        (
            "Negócios",
            "Tim Cook met Satya Nadella in San Francisco before Apple and Microsoft Corp signed the deal.",
        ),
        (
            "Política",
            "President Lula visited Berlin, where he met Chancellor Angela Merkel and officials from the European Union.",
        ),
        (
            "Repetição",
            "Paris Hilton flew to Paris, and the Paris office of Google welcomed her.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocab_has_specials_and_no_duplicates() {
        let vocab = builtin_vocab();
        assert_eq!(vocab[1], UNK_TOKEN);
        let mut sorted = vocab.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), vocab.len(), "vocabulário embutido tem duplicatas");
    }

    #[test]
    fn test_gazetteer_types_are_in_label_set() {
        for ty in builtin_gazetteer().keys() {
            assert!(BUILTIN_LABELS.contains(&format!("B-{ty}").as_str()));
        }
    }
}
