use serde::Serialize;

use super::voice::truncate_at_word;

pub const TITLE_MIN: usize = 10;
pub const TITLE_MAX: usize = 60;
pub const DESCRIPTION_MIN: usize = 120;
pub const DESCRIPTION_MAX: usize = 160;

const TITLE_FALLBACK: &str = "Guía gastronómica";

const DESCRIPTION_FILLERS: [&str; 2] = [
    "Reseñas honestas, guías y rankings para descubrir dónde comer bien en España.",
    "Direcciones, horarios, precios y platos recomendados por nuestro equipo editorial.",
];

/// Tags for `<head>`. Construct through [`PageMeta::new`] so the title and
/// description lengths hold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageMeta {
    pub title: String,
    pub description: String,
    pub canonical: String,
    pub image: Option<String>,
    pub og_type: &'static str,
    pub noindex: bool,
    pub keywords: Vec<String>,
}

impl PageMeta {
    pub fn new(title: &str, description: &str, site_name: &str, canonical: String) -> Self {
        Self {
            title: fit_title(title, site_name),
            description: fit_description(description),
            canonical,
            image: None,
            og_type: "website",
            noindex: false,
            keywords: Vec::new(),
        }
    }

    pub fn with_image(mut self, image: Option<String>) -> Self {
        self.image = image;
        self
    }

    pub fn article(mut self) -> Self {
        self.og_type = "article";
        self
    }

    pub fn noindex(mut self) -> Self {
        self.noindex = true;
        self
    }

    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords;
        self
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn squash(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A title of 10 to 60 characters: `"{title} | {site}"` when it fits, the
/// bare title when only that fits, otherwise the title cut at a word.
pub fn fit_title(title: &str, site_name: &str) -> String {
    let title = squash(title);
    let branded = format!("{title} | {site_name}");
    let len = char_len(&title);

    let fitted = if char_len(&branded) <= TITLE_MAX && !title.is_empty() {
        branded
    } else if len > TITLE_MAX {
        truncate_at_word(&title, TITLE_MAX)
    } else if title.is_empty() {
        truncate_at_word(&format!("{site_name} | {TITLE_FALLBACK}"), TITLE_MAX)
    } else {
        title
    };

    if char_len(&fitted) >= TITLE_MIN {
        return fitted;
    }
    truncate_at_word(&format!("{fitted} | {TITLE_FALLBACK}"), TITLE_MAX)
}

/// A description of 120 to 160 characters: short text is padded with
/// generic site copy, long text is cut at a word.
pub fn fit_description(text: &str) -> String {
    let mut description = squash(text);
    for filler in DESCRIPTION_FILLERS {
        if char_len(&description) >= DESCRIPTION_MIN {
            break;
        }
        if !description.is_empty() && !description.ends_with(['.', '!', '?', '…']) {
            description.push('.');
        }
        if !description.is_empty() {
            description.push(' ');
        }
        description.push_str(filler);
    }

    if char_len(&description) <= DESCRIPTION_MAX {
        return description;
    }
    let cut = truncate_at_word(&description, DESCRIPTION_MAX);
    if char_len(&cut) >= DESCRIPTION_MIN {
        return cut;
    }
    // A single very long word: cut mid-word.
    let hard: String = description.chars().take(DESCRIPTION_MAX - 1).collect();
    format!("{hard}…")
}
