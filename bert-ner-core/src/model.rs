//! # Modelo de Classificação de Tokens
//!
//! O modelo agrega três peças:
//! - **Tokenizador** de sub-palavras com offsets (`tokenizers`);
//! - **Conjunto de labels** (`id2label`), que é configuração e não código;
//! - **Classificador**: qualquer implementação de [`TokenClassifier`] que devolva
//!   um id de label por sub-palavra (o equivalente ao `argmax` dos logits).
//!
//! O classificador embutido ([`GazetteerClassifier`]) usa gazetteers e regras
//! simples, o suficiente para a demonstração funcionar sem pesos neurais.
//!
//! ## Ciclo de Vida
//!
//! O modelo é carregado **uma vez** por processo ([`init_global`]) e depois só
//! é lido. Não há invalidação nem recarga.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::{Arc, LazyLock, OnceLock};

use regex::Regex;
use tracing::info;

use crate::config::{
    hub_snapshot, read_json, read_text, ModelConfig, ModelSource, GAZETTEER_FILE, TOKENIZER_FILE, VOCAB_FILE,
};
use crate::demo;
use crate::error::{ModelError, Result};
use crate::tagger::Tag;
use crate::tokenizer::{split_words, SubwordToken, SubwordTokenizer};

const BUILTIN_MODEL_NAME: &str = "builtin-gazetteer";

/// Conjunto de labels do modelo, indexado pelo id de saída.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    labels: Vec<String>,
    index: HashMap<String, usize>,
    outside: usize,
}

impl LabelSet {
    /// Constrói a partir da lista de labels em ordem de id.
    ///
    /// Exige a label `O` e proíbe duplicatas.
    pub fn new(labels: Vec<String>) -> Result<Self> {
        let mut index = HashMap::with_capacity(labels.len());
        for (id, label) in labels.iter().enumerate() {
            if index.insert(label.clone(), id).is_some() {
                return Err(ModelError::InvalidLabelMap(format!("label duplicada: {label}")));
            }
        }
        let outside = index
            .get("O")
            .copied()
            .ok_or_else(|| ModelError::InvalidLabelMap("label \"O\" ausente".into()))?;
        Ok(Self { labels, index, outside })
    }

    /// Constrói a partir do `id2label` do `config.json` (chaves "0", "1", ...).
    pub fn from_id2label(id2label: &BTreeMap<String, String>) -> Result<Self> {
        let mut pairs = Vec::with_capacity(id2label.len());
        for (key, label) in id2label {
            let id: usize = key
                .trim()
                .parse()
                .map_err(|_| ModelError::InvalidLabelMap(format!("id não numérico: {key:?}")))?;
            pairs.push((id, label.clone()));
        }
        pairs.sort_by_key(|(id, _)| *id);

        for (expected, (id, _)) in pairs.iter().enumerate() {
            if *id != expected {
                return Err(ModelError::InvalidLabelMap(format!(
                    "ids devem ser contíguos a partir de 0 (esperado {expected}, encontrado {id})"
                )));
            }
        }

        Self::new(pairs.into_iter().map(|(_, label)| label).collect())
    }

    /// Labels CoNLL do modelo embutido.
    pub fn builtin() -> Self {
        let labels: Vec<String> = demo::BUILTIN_LABELS.iter().map(|s| s.to_string()).collect();
        let index = labels.iter().enumerate().map(|(id, l)| (l.clone(), id)).collect();
        Self { labels, index, outside: 0 }
    }

    /// Label de um id. Ids desconhecidos viram `O`.
    pub fn label(&self, id: usize) -> &str {
        self.labels.get(id).map_or("O", String::as_str)
    }

    pub fn tag(&self, id: usize) -> Tag {
        Tag::parse(self.label(id))
    }

    pub fn id_of(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    pub fn outside_id(&self) -> usize {
        self.outside
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Tipos de entidade distintos, na ordem em que aparecem.
    pub fn entity_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = Vec::new();
        for label in &self.labels {
            // Mesmo critério do parsing: labels inválidas não contam
            if Tag::parse(label).is_outside() {
                continue;
            }
            if let Some((_, ty)) = label.trim().split_once('-') {
                if !types.contains(&ty) {
                    types.push(ty);
                }
            }
        }
        types
    }
}

/// Um classificador de tokens: um id de label por sub-palavra.
///
/// É a fronteira com a inferência. Implementações devem ser somente leitura
/// depois de construídas, pois são compartilhadas entre requisições.
pub trait TokenClassifier: Send + Sync {
    fn labels(&self) -> &LabelSet;

    /// Retorna um id de label para cada token (mesma ordem e tamanho).
    fn predict(&self, text: &str, tokens: &[SubwordToken]) -> Vec<usize>;
}

/// Títulos que precedem nomes de pessoas
const PERSON_TITLES: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sir", "president", "senator", "chancellor",
    "minister", "ceo", "founder", "judge", "governor", "mayor", "king", "queen",
];

/// Sufixos que fecham nomes de organizações
const ORG_SUFFIXES: &[&str] = &[
    "inc", "corp", "corporation", "ltd", "llc", "plc", "gmbh", "group", "bank",
    "university", "institute", "foundation", "agency",
];

/// Palavras que antecedem locais
const LOCATION_CUES: &[&str] = &["in", "near", "across", "throughout"];

/// CamelCase interno (SpaceX, OpenAI) ou sigla (NASA, IBM)
static ORG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Z]{2,}|[A-Z][a-z]+[A-Z][A-Za-z]*)$").expect("padrão de organização válido")
});

/// Classificador heurístico baseado em gazetteers e regras de contexto.
///
/// Trabalha no nível da palavra e projeta o resultado nas sub-palavras: a
/// primeira peça recebe a tag da palavra, as demais a tag de continuação
/// (`I-X`), como um modelo BERT treinado com rótulos propagados.
pub struct GazetteerClassifier {
    labels: LabelSet,
    /// (palavras em minúsculas, tipo), das entradas mais longas para as mais curtas
    entries: Vec<(Vec<String>, String)>,
}

impl GazetteerClassifier {
    /// As entradas são divididas em palavras pela mesma pré-tokenização do texto.
    pub fn new(labels: LabelSet, gazetteer: &BTreeMap<String, Vec<String>>) -> Result<Self> {
        let mut entries: Vec<(Vec<String>, String)> = Vec::new();
        for (ty, names) in gazetteer {
            for name in names {
                let words: Vec<String> = split_words(name)?
                    .into_iter()
                    .map(|(s, e)| name[s..e].to_lowercase())
                    .collect();
                if !words.is_empty() {
                    entries.push((words, ty.clone()));
                }
            }
        }
        entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Ok(Self { labels, entries })
    }

    pub fn builtin() -> Result<Self> {
        Self::new(LabelSet::builtin(), &demo::builtin_gazetteer())
    }

    /// Atribui uma tag BIO a cada palavra.
    pub fn tag_words(&self, words: &[&str]) -> Vec<Tag> {
        let n = words.len();
        let lower: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();
        let mut tags = vec![Tag::Outside; n];

        // 1. Gazetteers (n-gramas, o mais longo primeiro)
        let mut i = 0;
        while i < n {
            match self.gazetteer_match(&lower[i..]) {
                Some((len, ty)) => {
                    mark(&mut tags, i, len, ty);
                    i += len;
                }
                None => i += 1,
            }
        }

        // 2. Título + nomes capitalizados: "Dr. Jane Doe" → PER
        for i in 0..n {
            if PERSON_TITLES.contains(&lower[i].as_str()) {
                let from = if words.get(i + 1) == Some(&".") { i + 2 } else { i + 1 };
                let len = capitalized_run(words, &tags, from);
                if len > 0 {
                    mark(&mut tags, from, len, "PER");
                }
            }
        }

        // 3. Sufixo de organização: "Acme Corp" → ORG
        for i in 1..n {
            if !ORG_SUFFIXES.contains(&lower[i].as_str()) || !is_capitalized(words[i]) || !tags[i].is_outside() {
                continue;
            }
            if tags[i - 1].entity_type() == Some("ORG") {
                tags[i] = Tag::Inside("ORG".into());
                continue;
            }
            let mut from = i;
            while from > 0 && tags[from - 1].is_outside() && is_capitalized(words[from - 1]) {
                from -= 1;
            }
            if from < i {
                mark(&mut tags, from, i - from + 1, "ORG");
            }
        }

        // 4. Indicador de local: "in Lisbon" → LOC
        for i in 0..n {
            if LOCATION_CUES.contains(&lower[i].as_str()) {
                let len = capitalized_run(words, &tags, i + 1);
                if len > 0 {
                    mark(&mut tags, i + 1, len, "LOC");
                }
            }
        }

        // 5. Padrão de forma: CamelCase / sigla → ORG
        for i in 0..n {
            if tags[i].is_outside()
                && !PERSON_TITLES.contains(&lower[i].as_str())
                && ORG_PATTERN.is_match(words[i])
            {
                tags[i] = Tag::Begin("ORG".into());
            }
        }

        tags
    }

    fn gazetteer_match(&self, words: &[String]) -> Option<(usize, &str)> {
        self.entries
            .iter()
            .find(|(entry, _)| words.len() >= entry.len() && words[..entry.len()] == entry[..])
            .map(|(entry, ty)| (entry.len(), ty.as_str()))
    }

    fn label_id(&self, tag: &Tag) -> usize {
        self.labels.id_of(&tag.label()).unwrap_or(self.labels.outside_id())
    }
}

impl TokenClassifier for GazetteerClassifier {
    fn labels(&self) -> &LabelSet {
        &self.labels
    }

    fn predict(&self, text: &str, tokens: &[SubwordToken]) -> Vec<usize> {
        // Agrupa as peças por palavra: (início, fim) em bytes
        let mut words: Vec<(usize, usize)> = Vec::new();
        for token in tokens {
            match words.last_mut() {
                Some(last) if !token.is_word_start => last.1 = token.end,
                _ => words.push((token.start, token.end)),
            }
        }

        let surfaces: Vec<&str> = words.iter().map(|&(s, e)| text.get(s..e).unwrap_or_default()).collect();
        let word_tags = self.tag_words(&surfaces);

        let mut ids = Vec::with_capacity(tokens.len());
        let mut word = 0usize;
        for (i, token) in tokens.iter().enumerate() {
            if token.is_word_start && i > 0 {
                word += 1;
            }
            let tag = match word_tags.get(word) {
                Some(tag) if token.is_word_start => tag.clone(),
                Some(tag) => tag.continuation(),
                None => Tag::Outside,
            };
            ids.push(self.label_id(&tag));
        }
        ids
    }
}

/// Marca `len` palavras a partir de `start` como uma entidade do tipo `ty`.
fn mark(tags: &mut [Tag], start: usize, len: usize, ty: &str) {
    for (offset, tag) in tags[start..start + len].iter_mut().enumerate() {
        *tag = if offset == 0 {
            Tag::Begin(ty.to_string())
        } else {
            Tag::Inside(ty.to_string())
        };
    }
}

fn is_capitalized(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase)
}

/// Quantas palavras capitalizadas e ainda sem tag seguem a partir de `from`.
fn capitalized_run(words: &[&str], tags: &[Tag], from: usize) -> usize {
    (from..words.len())
        .take_while(|&i| tags[i].is_outside() && is_capitalized(words[i]))
        .count()
}

/// Modelo completo: tokenizador + classificador.
pub struct NerModel {
    name: String,
    tokenizer: SubwordTokenizer,
    classifier: Box<dyn TokenClassifier>,
}

impl NerModel {
    pub fn new(name: impl Into<String>, tokenizer: SubwordTokenizer, classifier: impl TokenClassifier + 'static) -> Self {
        Self {
            name: name.into(),
            tokenizer,
            classifier: Box::new(classifier),
        }
    }

    /// Modelo embutido de demonstração.
    pub fn builtin() -> Result<Self> {
        Ok(Self::new(
            BUILTIN_MODEL_NAME,
            SubwordTokenizer::builtin()?,
            GazetteerClassifier::builtin()?,
        ))
    }

    pub fn load(source: &ModelSource) -> Result<Self> {
        let model = match source {
            ModelSource::Builtin => Self::builtin()?,
            ModelSource::Directory(dir) => Self::from_dir(dir)?,
            ModelSource::Hub(repo_id) => Self::from_hub(repo_id)?,
        };
        info!(
            model = %model.name,
            labels = model.labels().len(),
            vocab = model.tokenizer.vocab_size(),
            max_length = model.tokenizer.max_length(),
            "modelo carregado"
        );
        Ok(model)
    }

    /// Carrega `config.json`, `tokenizer.json` (ou `vocab.txt`) e, se houver,
    /// `gazetteer.json` de um diretório.
    ///
    /// Sem `gazetteer.json`, usa os gazetteers embutidos.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        Self::load_dir(dir, None)
    }

    /// Baixa o repositório do Hub (ou usa o cache) e carrega o snapshot.
    ///
    /// O nome do modelo é sempre o id do repositório.
    pub fn from_hub(repo_id: &str) -> Result<Self> {
        let snapshot = hub_snapshot(repo_id)?;
        Self::load_dir(&snapshot, Some(repo_id.to_string()))
    }

    fn load_dir(dir: &Path, name: Option<String>) -> Result<Self> {
        let config = ModelConfig::load(dir)?;
        let labels = LabelSet::from_id2label(&config.id2label)?;

        let tokenizer_path = dir.join(TOKENIZER_FILE);
        let tokenizer = if tokenizer_path.exists() {
            SubwordTokenizer::from_file(&tokenizer_path, config.max_length)?
        } else {
            let vocab = read_text(&dir.join(VOCAB_FILE))?;
            SubwordTokenizer::from_vocab_text(&vocab, config.do_lower_case, config.max_length)?
        };

        let gazetteer_path = dir.join(GAZETTEER_FILE);
        let gazetteer = if gazetteer_path.exists() {
            read_json(&gazetteer_path)?
        } else {
            demo::builtin_gazetteer()
        };

        let name = name
            .or_else(|| config.name.clone())
            .unwrap_or_else(|| dir.display().to_string());
        Ok(Self::new(name, tokenizer, GazetteerClassifier::new(labels, &gazetteer)?))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tokenizer(&self) -> &SubwordTokenizer {
        &self.tokenizer
    }

    pub fn labels(&self) -> &LabelSet {
        self.classifier.labels()
    }

    /// Uma tag por token. Tokens sem predição (classificador devolveu menos ids) ficam `O`.
    pub fn predict_tags(&self, text: &str, tokens: &[SubwordToken]) -> Vec<Tag> {
        let ids = self.classifier.predict(text, tokens);
        let labels = self.labels();
        (0..tokens.len())
            .map(|i| ids.get(i).map_or(Tag::Outside, |&id| labels.tag(id)))
            .collect()
    }
}

impl fmt::Debug for NerModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NerModel")
            .field("name", &self.name)
            .field("labels", &self.labels().len())
            .field("vocab", &self.tokenizer.vocab_size())
            .finish()
    }
}

static GLOBAL_MODEL: OnceLock<Arc<NerModel>> = OnceLock::new();

/// Carrega o modelo do processo na primeira chamada; as seguintes devolvem o mesmo.
///
/// Se duas threads inicializarem ao mesmo tempo, vale o primeiro modelo gravado.
pub fn init_global(source: &ModelSource) -> Result<Arc<NerModel>> {
    if let Some(model) = GLOBAL_MODEL.get() {
        return Ok(Arc::clone(model));
    }
    let model = Arc::new(NerModel::load(source)?);
    Ok(Arc::clone(GLOBAL_MODEL.get_or_init(|| model)))
}

/// O modelo do processo, se já inicializado.
pub fn global() -> Option<Arc<NerModel>> {
    GLOBAL_MODEL.get().cloned()
}
