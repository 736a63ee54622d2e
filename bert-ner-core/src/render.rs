//! # Destaque de Entidades (HTML)
//!
//! Gera o texto com cada entidade envolvida em um `<span>` colorido pelo tipo,
//! seguido da abreviação do tipo como etiqueta.
//!
//! A inserção é feita **por offset**: cada entidade carrega seu intervalo
//! `[start, end)` no texto original e o texto é montado da esquerda para a
//! direita. Nunca se procura o texto da entidade no texto original, o que
//! destacaria a ocorrência errada quando o mesmo nome aparece mais de uma vez
//! ("Paris Hilton flew to Paris").

use crate::tagger::Entity;

/// Cores por tipo de entidade
pub const ENTITY_COLORS: &[(&str, &str)] = &[
    ("PER", "#ffc107"),  // amarelo
    ("ORG", "#007bff"),  // azul
    ("LOC", "#28a745"),  // verde
    ("MISC", "#dc3545"), // vermelho
];

/// Cor para tipos fora da tabela
pub const FALLBACK_COLOR: &str = "#adb5bd";

/// Mensagem exibida quando a análise não encontra entidades
pub const NO_ENTITIES_MESSAGE: &str = "No entities were found in the text.";

/// Cor CSS para um tipo de entidade
pub fn entity_color(entity_type: &str) -> &'static str {
    ENTITY_COLORS
        .iter()
        .find(|(ty, _)| *ty == entity_type)
        .map_or(FALLBACK_COLOR, |&(_, color)| color)
}

/// HTML de uma única entidade.
pub fn entity_markup(text: &str, entity_type: &str) -> String {
    format!(
        concat!(
            r#"<span class="entity" style="background-color: {color}; color: white; padding: 0.2em 0.4em; "#,
            r#"margin: 0 0.2em; border-radius: 0.3em; font-weight: bold;">{text} "#,
            r#"<span style="font-size: 0.8em; opacity: 0.7;">{ty}</span></span>"#,
        ),
        color = entity_color(entity_type),
        text = escape_html(text),
        ty = escape_html(entity_type),
    )
}

/// Texto completo com as entidades destacadas.
///
/// Entidades são processadas por `start` crescente. Uma entidade que se
/// sobrepõe a outra já inserida, ou cujo span não fatia o texto, é ignorada.
pub fn highlight_html(text: &str, entities: &[Entity]) -> String {
    let mut ordered: Vec<&Entity> = entities.iter().collect();
    ordered.sort_by_key(|e| (e.start, e.end));

    let mut out = String::with_capacity(text.len() * 2);
    let mut cursor = 0;

    for entity in ordered {
        if entity.start < cursor || entity.start >= entity.end {
            continue;
        }
        let (Some(before), Some(surface)) = (text.get(cursor..entity.start), text.get(entity.start..entity.end)) else {
            continue;
        };
        out.push_str(&escape_html(before));
        out.push_str(&entity_markup(surface, &entity.entity_type));
        cursor = entity.end;
    }

    out.push_str(&escape_html(text.get(cursor..).unwrap_or_default()));
    out
}

/// Lista HTML das entidades: texto em negrito e tipo na cor da legenda.
///
/// Sem entidades, devolve um parágrafo com [`NO_ENTITIES_MESSAGE`].
pub fn entity_list_html(entities: &[Entity]) -> String {
    if entities.is_empty() {
        return format!(r#"<p class="info">{NO_ENTITIES_MESSAGE}</p>"#);
    }
    let mut out = String::from("<ul class=\"entity-list\">");
    for entity in entities {
        out.push_str(&format!(
            r#"<li><strong>{}</strong> (<code style="color: {};">{}</code>)</li>"#,
            escape_html(&entity.text),
            entity_color(&entity.entity_type),
            escape_html(&entity.entity_type),
        ));
    }
    out.push_str("</ul>");
    out
}

/// Escapa os caracteres especiais de HTML.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}
