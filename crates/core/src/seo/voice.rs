//! Conversational copy for voice assistants and featured snippets.
//!
//! Every generator skips missing venue data instead of interpolating it, so
//! no output ever contains a placeholder for an absent value.

use serde::Serialize;

use crate::content::{Faq, PriceRange, Review, ReviewSummary, Venue};

pub const CONVERSATIONAL_MAX: usize = 300;
pub const VOICE_TITLE_MAX: usize = 60;
pub const SPEAKABLE_MAX: usize = 250;
pub const SNIPPET_MAX: usize = 320;

pub fn price_description(price: PriceRange) -> &'static str {
    match price {
        PriceRange::Budget => "económico",
        PriceRange::Moderate => "de precio moderado",
        PriceRange::Upscale => "de precio elevado",
        PriceRange::Luxury => "de alta gama",
    }
}

/// Shorten `text` to at most `max` characters, cutting at a word boundary
/// and ending with an ellipsis.
pub fn truncate_at_word(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let budget: String = text.chars().take(max - 1).collect();
    let cut = match budget.rfind(char::is_whitespace) {
        Some(i) if i > 0 => &budget[..i],
        _ => budget.as_str(),
    };
    let cut = cut.trim_end_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | ':' | '.' | '-'));
    format!("{cut}…")
}

/// Scores with a Spanish decimal comma: `8,5`, `9`.
pub fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{score:.0}")
    } else {
        format!("{score:.1}").replace('.', ",")
    }
}

/// "a, b y c"
fn join_spanish(items: &[&str]) -> String {
    match items {
        [] => String::new(),
        [one] => one.to_string(),
        [init @ .., last] => format!("{} y {last}", init.join(", ")),
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

pub fn generate_conversational_description(venue: &Venue) -> String {
    let mut text = format!("{} es un restaurante", venue.title);
    if let Some(price) = venue.price_range {
        text.push(' ');
        text.push_str(price_description(price));
    }
    text.push_str(&format!(" en {}", venue.city.title));
    if let Some(n) = non_empty(venue.address.as_ref().and_then(|a| a.neighborhood.as_deref())) {
        text.push_str(&format!(", en el barrio de {n}"));
    }
    text.push('.');

    let categories: Vec<String> = venue.categories.iter().map(|c| c.title.to_lowercase()).collect();
    if !categories.is_empty() {
        let refs: Vec<&str> = categories.iter().map(String::as_str).collect();
        text.push_str(&format!(" Su especialidad: {}.", join_spanish(&refs)));
    }
    if let Some(rating) = venue.rating() {
        text.push_str(&format!(" En nuestra última reseña obtuvo un {} sobre 10.", format_score(rating)));
    }
    if let Some(street) = non_empty(venue.address.as_ref().and_then(|a| a.street.as_deref())) {
        text.push_str(&format!(" Está en {street}."));
    }
    if let Some(description) = non_empty(venue.description.as_deref()) {
        text.push(' ');
        text.push_str(description);
    }
    truncate_at_word(&text, CONVERSATIONAL_MAX)
}

/// Lowercase local-intent phrases, deduplicated case-insensitively.
pub fn generate_local_search_keywords(venue: &Venue) -> Vec<String> {
    let title = venue.title.trim();
    let city = venue.city.title.trim();
    let mut candidates = vec![title.to_string()];

    if !city.is_empty() {
        candidates.push(format!("{title} {city}"));
        candidates.push(format!("restaurantes en {city}"));
        candidates.push(format!("dónde comer en {city}"));
    }
    if let Some(n) = non_empty(venue.address.as_ref().and_then(|a| a.neighborhood.as_deref())) {
        candidates.push(format!("restaurantes en {n}"));
        if !city.is_empty() {
            candidates.push(format!("{n} {city}"));
        }
    }
    if let Some(postal) = non_empty(venue.address.as_ref().and_then(|a| a.postal_code.as_deref())) {
        candidates.push(format!("restaurantes {postal}"));
    }
    for category in &venue.categories {
        let cat = category.title.trim();
        if cat.is_empty() {
            continue;
        }
        if city.is_empty() {
            candidates.push(cat.to_string());
        } else {
            candidates.push(format!("{cat} en {city}"));
            candidates.push(format!("mejor {cat} {city}"));
        }
    }
    if let (Some(price), false) = (venue.price_range, city.is_empty()) {
        candidates.push(format!("restaurante {} en {city}", price_description(price)));
    }

    let mut seen = std::collections::HashSet::new();
    candidates
        .into_iter()
        .map(|k| k.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase())
        .filter(|k| !k.is_empty() && !k.contains("undefined") && !k.contains("null"))
        .filter(|k| seen.insert(k.clone()))
        .collect()
}

pub fn generate_voice_title(venue: &Venue) -> String {
    let title = match venue.price_range {
        Some(price) => format!(
            "{}: restaurante {} en {}",
            venue.title,
            price_description(price),
            venue.city.title
        ),
        None => format!("{}: restaurante en {}", venue.title, venue.city.title),
    };
    truncate_at_word(&title, VOICE_TITLE_MAX)
}

/// Questions people ask assistants about a venue, answered from its data.
/// `review` is the latest published review, if any.
pub fn generate_voice_faqs(venue: &Venue, review: Option<&ReviewSummary>) -> Vec<Faq> {
    let name = &venue.title;
    let mut faqs = Vec::new();

    let location = match non_empty(venue.address.as_ref().and_then(|a| a.street.as_deref())) {
        Some(street) => format!("{name} está en {street}, {}.", venue.city.title),
        None => format!("{name} está en {}.", venue.city.title),
    };
    faqs.push(Faq {
        question: format!("¿Dónde está {name}?"),
        answer: location,
    });

    if let Some(price) = venue.price_range {
        faqs.push(Faq {
            question: format!("¿Es caro comer en {name}?"),
            answer: format!("{name} es un restaurante {} ({price}).", price_description(price)),
        });
    }
    if !venue.categories.is_empty() {
        let names: Vec<String> = venue.categories.iter().map(|c| c.title.to_lowercase()).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        faqs.push(Faq {
            question: format!("¿Qué tipo de cocina tiene {name}?"),
            answer: format!("{name} ofrece {}.", join_spanish(&refs)),
        });
    }
    if !venue.opening_hours.is_empty() {
        let slots: Vec<String> = venue.opening_hours.iter().map(|h| h.describe()).collect();
        faqs.push(Faq {
            question: format!("¿Cuál es el horario de {name}?"),
            answer: format!("Abre {}.", slots.join("; ")),
        });
    }
    if let Some(phone) = non_empty(venue.phone.as_deref()) {
        faqs.push(Faq {
            question: format!("¿Cómo puedo reservar en {name}?"),
            answer: format!("Puedes reservar llamando al {phone}."),
        });
    }
    if let Some(review) = review {
        let mut answer = format!(
            "En nuestra reseña obtiene un {} sobre 10.",
            format_score(review.ratings.overall())
        );
        if let Some(tldr) = non_empty(review.tldr.as_deref()) {
            answer.push(' ');
            answer.push_str(tldr);
        }
        faqs.push(Faq {
            question: format!("¿Merece la pena {name}?"),
            answer,
        });
    }
    faqs
}

/// Short spoken summary, marked up as `speakable` on review pages.
pub fn generate_speakable_summary(review: &Review) -> String {
    let mut text = format!(
        "{} obtiene un {} sobre 10 en {}.",
        review.venue.title,
        format_score(review.overall()),
        review.venue.city.title
    );
    if let Some(tldr) = non_empty(review.tldr.as_deref()) {
        text.push(' ');
        text.push_str(tldr);
    }
    truncate_at_word(&text, SPEAKABLE_MAX)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeaturedSnippet {
    pub question: String,
    pub answer: String,
    pub highlights: Vec<String>,
}

/// Question/answer block shaped for answer boxes: the score breakdown and
/// up to three pros.
pub fn generate_featured_snippet(review: &Review) -> FeaturedSnippet {
    let r = &review.ratings;
    let mut answer = format!(
        "{} obtiene un {} sobre 10: comida {}, servicio {}, ambiente {} y calidad-precio {}.",
        review.venue.title,
        format_score(r.overall()),
        format_score(r.food),
        format_score(r.service),
        format_score(r.ambience),
        format_score(r.value)
    );
    if let Some(tldr) = non_empty(review.tldr.as_deref()) {
        answer.push(' ');
        answer.push_str(tldr);
    }
    FeaturedSnippet {
        question: format!("¿Qué tal se come en {}?", review.venue.title),
        answer: truncate_at_word(&answer, SNIPPET_MAX),
        highlights: review
            .pros
            .iter()
            .filter(|p| !p.trim().is_empty())
            .take(3)
            .cloned()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::review::fixtures::review;
    use crate::content::venue::fixtures::venue;
    use crate::content::{Address, Category, CityRef};

    #[test]
    fn price_descriptions() {
        assert_eq!(price_description(PriceRange::Budget), "económico");
        assert_eq!(price_description(PriceRange::Moderate), "de precio moderado");
        assert_eq!(price_description(PriceRange::Upscale), "de precio elevado");
        assert_eq!(price_description(PriceRange::Luxury), "de alta gama");
    }

    #[test]
    fn conversational_description_mentions_moderate_price() {
        let v = venue();
        let text = generate_conversational_description(&v);
        assert!(text.contains("de precio moderado"), "{text}");
        assert!(text.starts_with("Casa Lucio es un restaurante de precio moderado en Madrid"));
        assert!(text.chars().count() <= CONVERSATIONAL_MAX);
    }

    #[test]
    fn conversational_description_is_bounded() {
        let mut v = venue();
        v.description = Some("Muy bueno. ".repeat(60));
        let text = generate_conversational_description(&v);
        assert!(text.chars().count() <= CONVERSATIONAL_MAX);
        assert!(text.ends_with('…'));
    }

    #[test]
    fn keywords_have_no_duplicates_or_placeholders() {
        let mut v = venue();
        v.categories.push(Category {
            title: "TAPAS".into(),
            slug: "tapas-2".into(),
            description: None,
        });
        let keywords = generate_local_search_keywords(&v);
        let mut lower: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
        let before = lower.len();
        lower.sort();
        lower.dedup();
        assert_eq!(lower.len(), before);
        assert!(keywords.iter().all(|k| !k.contains("undefined") && !k.contains("null")));
        assert!(keywords.contains(&"tapas en madrid".to_string()));
        assert!(keywords.contains(&"restaurantes en la latina".to_string()));
    }

    #[test]
    fn keywords_skip_missing_parts() {
        let mut v = venue();
        v.address = Some(Address::default());
        v.categories.clear();
        v.price_range = None;
        v.city = CityRef {
            title: String::new(),
            slug: "x".into(),
        };
        assert_eq!(generate_local_search_keywords(&v), vec!["casa lucio"]);
    }

    #[test]
    fn voice_title_fits() {
        let mut v = venue();
        assert_eq!(generate_voice_title(&v), "Casa Lucio: restaurante de precio moderado en Madrid");
        v.title = "Restaurante con un nombre larguísimo que no cabe".into();
        assert!(generate_voice_title(&v).chars().count() <= VOICE_TITLE_MAX);
    }

    #[test]
    fn voice_faqs_only_cover_known_facts() {
        let mut v = venue();
        let faqs = generate_voice_faqs(&v, None);
        assert_eq!(faqs.len(), 5);
        assert_eq!(faqs[0].answer, "Casa Lucio está en Calle Cava Baja 35, Madrid.");

        v.price_range = None;
        v.phone = None;
        v.opening_hours.clear();
        v.categories.clear();
        assert_eq!(generate_voice_faqs(&v, None).len(), 1);
    }

    #[test]
    fn review_summaries() {
        let r = review();
        let speakable = generate_speakable_summary(&r);
        assert!(speakable.starts_with("Casa Lucio obtiene un 8,1 sobre 10 en Madrid."));

        let snippet = generate_featured_snippet(&r);
        assert_eq!(snippet.question, "¿Qué tal se come en Casa Lucio?");
        assert!(snippet.answer.contains("ambiente 8,5"));
        assert_eq!(snippet.highlights.len(), 2);
    }

    #[test]
    fn truncation_cuts_at_words() {
        assert_eq!(truncate_at_word("hola mundo", 20), "hola mundo");
        assert_eq!(truncate_at_word("hola mundo cruel", 12), "hola mundo…");
        assert_eq!(truncate_at_word("supercalifragilístico", 6), "super…");
        assert_eq!(format_score(9.0), "9");
        assert_eq!(format_score(8.5), "8,5");
    }
}
