//! Server-side HTML.

pub mod components;
pub mod layout;

pub use layout::{render_page, Page};
pub use sobremesa_core::portable_text::escape_html as escape;

/// `escape` for values that may be missing.
pub fn escape_opt(text: Option<&str>) -> String {
    text.map(escape).unwrap_or_default()
}

/// Spanish long date, e.g. `2 de mayo de 2024`.
pub fn spanish_date(date: chrono::NaiveDate) -> String {
    use chrono::Datelike;
    const MONTHS: [&str; 12] = [
        "enero",
        "febrero",
        "marzo",
        "abril",
        "mayo",
        "junio",
        "julio",
        "agosto",
        "septiembre",
        "octubre",
        "noviembre",
        "diciembre",
    ];
    format!("{} de {} de {}", date.day(), MONTHS[date.month0() as usize], date.year())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn dates_read_in_spanish() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        assert_eq!(spanish_date(date), "2 de mayo de 2024");
    }
}
