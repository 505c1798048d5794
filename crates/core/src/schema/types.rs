use super::{Field, Rule, SchemaType};

use Rule::*;

pub const EDITORIAL_TYPES: [&str; 5] = ["guide", "list", "news", "offer", "dishGuide"];

pub const DOCUMENT_TYPES: [&str; 14] = [
    "city",
    "category",
    "author",
    "venue",
    "review",
    "post",
    "guide",
    "list",
    "news",
    "offer",
    "dishGuide",
    "featuredItem",
    "qrCode",
    "sanity.imageAsset",
];

const PRICE_RANGES: &[&str] = &["€", "€€", "€€€", "€€€€"];
const FEATURED_TARGETS: &[&str] = &["review", "venue", "category", "collection", "guide"];

/// Look up the schema for a document type.
pub fn schema_for(doc_type: &str) -> Option<SchemaType> {
    let schema = match doc_type {
        "city" => simple("city", "Ciudad", "title"),
        "category" => simple("category", "Categoría", "title"),
        "author" => SchemaType {
            name: "author",
            title: "Autor",
            fields: vec![
                Field::new("name", vec![Required, MinLength(2), MaxLength(80)]),
                Field::new("slug", vec![Slug]),
                Field::new("bio", vec![MaxLength(600)]),
            ],
            exactly_one_of: None,
        },
        "venue" => venue(),
        "review" => review(),
        "post" => post(),
        "guide" | "list" | "news" | "offer" | "dishGuide" => editorial(doc_type),
        "featuredItem" => featured_item(),
        "qrCode" => SchemaType {
            name: "qrCode",
            title: "Código QR",
            fields: vec![
                Field::new("venue", vec![Required, Reference]),
                Field::new("label", vec![MaxLength(80)]),
                Field::new("scans", vec![Range { min: 0.0, max: f64::MAX }]),
                Field::new("downloads", vec![Range { min: 0.0, max: f64::MAX }]),
            ],
            exactly_one_of: None,
        },
        "sanity.imageAsset" => SchemaType {
            name: "sanity.imageAsset",
            title: "Imagen",
            fields: vec![
                Field::new("url", vec![Required]),
                Field::new("mimeType", vec![Required]),
                Field::new("size", vec![Range { min: 0.0, max: f64::MAX }]),
            ],
            exactly_one_of: None,
        },
        _ => return None,
    };
    Some(schema)
}

fn simple(name: &'static str, title: &'static str, title_field: &'static str) -> SchemaType {
    SchemaType {
        name,
        title,
        fields: vec![
            Field::new(title_field, vec![Required, MinLength(2), MaxLength(80)]),
            Field::new("slug", vec![Required, Slug]),
            Field::new("description", vec![MaxLength(600)]),
        ],
        exactly_one_of: None,
    }
}

fn images(path: &'static str, max: usize) -> Field {
    Field::new(
        path,
        vec![
            MaxItems(max),
            Items(vec![Field::new("alt", vec![MaxLength(160)])]),
        ],
    )
}

fn faq() -> Field {
    Field::new(
        "faq",
        vec![
            MaxItems(20),
            Items(vec![
                Field::new("question", vec![Required, MaxLength(200)]),
                Field::new("answer", vec![Required, MaxLength(1200)]),
            ]),
        ],
    )
}

fn venue() -> SchemaType {
    SchemaType {
        name: "venue",
        title: "Restaurante",
        fields: vec![
            Field::new("title", vec![Required, MinLength(2), MaxLength(100)]),
            Field::new("slug", vec![Required, Slug]),
            Field::new("city", vec![Required, Reference]),
            Field::new("description", vec![MaxLength(1000)]),
            Field::new("address.street", vec![MaxLength(200)]),
            Field::new("address.postalCode", vec![MaxLength(10)]),
            Field::new("geo.lat", vec![Range { min: -90.0, max: 90.0 }]),
            Field::new("geo.lng", vec![Range { min: -180.0, max: 180.0 }]),
            Field::new("priceRange", vec![OneOf(PRICE_RANGES)]),
            Field::new(
                "categories",
                vec![MaxItems(5), Items(vec![Field::new("_ref", vec![Required])])],
            ),
            Field::new(
                "openingHours",
                vec![Items(vec![
                    Field::new("days", vec![Required, MinItems(1)]),
                    Field::new("opens", vec![Required]),
                    Field::new("closes", vec![Required]),
                ])],
            ),
            images("images", 30),
            Field::new("social.website", vec![Url]),
            Field::new("social.instagram", vec![Url]),
            Field::new("social.facebook", vec![Url]),
            faq(),
        ],
        exactly_one_of: None,
    }
}

fn review() -> SchemaType {
    let rating = || vec![Required, Range { min: 0.0, max: 10.0 }];
    SchemaType {
        name: "review",
        title: "Reseña",
        fields: vec![
            Field::new("title", vec![Required, MinLength(5), MaxLength(120)]),
            Field::new("slug", vec![Required, Slug]),
            Field::new("venue", vec![Required, Reference]),
            Field::new("ratings.food", rating()),
            Field::new("ratings.service", rating()),
            Field::new("ratings.ambience", rating()),
            Field::new("ratings.value", rating()),
            Field::new("tldr", vec![MaxLength(280)]),
            Field::new("pros", vec![MaxItems(10)]),
            Field::new("cons", vec![MaxItems(10)]),
            Field::new("author", vec![Reference]),
            images("gallery", 30),
            faq(),
        ],
        exactly_one_of: None,
    }
}

fn post() -> SchemaType {
    SchemaType {
        name: "post",
        title: "Artículo",
        fields: vec![
            Field::new("title", vec![Required, MinLength(5), MaxLength(120)]),
            Field::new("slug", vec![Required, Slug]),
            Field::new("excerpt", vec![MaxLength(300)]),
            Field::new("author", vec![Reference]),
            Field::new("tags", vec![MaxItems(10)]),
            faq(),
        ],
        exactly_one_of: None,
    }
}

fn editorial(doc_type: &str) -> SchemaType {
    let (name, title, min_items, max_items) = match doc_type {
        "guide" => ("guide", "Guía", 0, 50),
        "list" => ("list", "Ranking", 3, 50),
        "news" => ("news", "Noticia", 0, 20),
        "offer" => ("offer", "Oferta", 0, 10),
        _ => ("dishGuide", "Guía de plato", 0, 30),
    };

    let mut fields = vec![
        Field::new("title", vec![Required, MinLength(5), MaxLength(120)]),
        Field::new("slug", vec![Required, Slug]),
        Field::new("excerpt", vec![MaxLength(300)]),
        Field::new(
            "items",
            vec![
                MinItems(min_items),
                MaxItems(max_items),
                Items(vec![
                    Field::new("venue", vec![Required, Reference]),
                    Field::new("position", vec![Range { min: 1.0, max: 100.0 }]),
                    Field::new("highlight", vec![MaxLength(120)]),
                    Field::new("note", vec![MaxLength(600)]),
                ]),
            ],
        ),
        faq(),
        Field::new("seo.metaTitle", vec![MaxLength(60)]),
        Field::new("seo.metaDescription", vec![MaxLength(160)]),
        Field::new("stats.views", vec![Range { min: 0.0, max: f64::MAX }]),
        Field::new("stats.shares", vec![Range { min: 0.0, max: f64::MAX }]),
        Field::new("stats.bookmarks", vec![Range { min: 0.0, max: f64::MAX }]),
    ];
    match name {
        "offer" => {
            fields.push(Field::new("discount", vec![Required, MaxLength(50)]));
            fields.push(Field::new("terms", vec![MaxLength(600)]));
        }
        "dishGuide" => fields.push(Field::new("dish", vec![Required, MaxLength(80)])),
        "news" => fields.push(Field::new("source", vec![Url])),
        _ => {}
    }

    SchemaType {
        name,
        title,
        fields,
        exactly_one_of: None,
    }
}

fn featured_item() -> SchemaType {
    SchemaType {
        name: "featuredItem",
        title: "Destacado",
        fields: vec![
            Field::new("titleOverride", vec![MaxLength(80)]),
            Field::new("descriptionOverride", vec![MaxLength(200)]),
            Field::new("order", vec![Range { min: 0.0, max: 1000.0 }]),
            Field::new("review", vec![Reference]),
            Field::new("venue", vec![Reference]),
            Field::new("category", vec![Reference]),
            Field::new("collection", vec![Reference]),
            Field::new("guide", vec![Reference]),
        ],
        exactly_one_of: Some(FEATURED_TARGETS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_type_has_a_schema() {
        for t in DOCUMENT_TYPES {
            let schema = schema_for(t).unwrap_or_else(|| panic!("missing schema for {t}"));
            assert_eq!(schema.name, t);
        }
        assert!(schema_for("nope").is_none());
    }

    #[test]
    fn offers_require_a_discount() {
        let schema = schema_for("offer").unwrap();
        assert!(schema
            .fields
            .iter()
            .any(|f| f.path == "discount" && f.rules.contains(&Rule::Required)));
    }
}
