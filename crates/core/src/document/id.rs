//! Document ID conventions:
//! - Published: `{id}`
//! - Draft: `drafts.{id}`
//! - Version: `versions.{releaseId}.{id}`

const DRAFT_PREFIX: &str = "drafts.";
const VERSION_PREFIX: &str = "versions.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentIdKind {
    Published(String),
    Draft(String),
    Version { release_id: String, base_id: String },
}

impl DocumentIdKind {
    /// Parse a document ID into its kind.
    pub fn parse(id: &str) -> Self {
        if let Some(base) = id.strip_prefix(DRAFT_PREFIX) {
            DocumentIdKind::Draft(base.to_string())
        } else if let Some(rest) = id.strip_prefix(VERSION_PREFIX) {
            if let Some((release_id, base_id)) = rest.split_once('.') {
                DocumentIdKind::Version {
                    release_id: release_id.to_string(),
                    base_id: base_id.to_string(),
                }
            } else {
                // Malformed version ID — treat as published
                DocumentIdKind::Published(id.to_string())
            }
        } else {
            DocumentIdKind::Published(id.to_string())
        }
    }

    /// Get the base (published) document ID regardless of prefix.
    pub fn base_id(&self) -> &str {
        match self {
            DocumentIdKind::Published(id) => id,
            DocumentIdKind::Draft(id) => id,
            DocumentIdKind::Version { base_id, .. } => base_id,
        }
    }

    /// Get the full document ID with its prefix.
    pub fn full_id(&self) -> String {
        match self {
            DocumentIdKind::Published(id) => id.clone(),
            DocumentIdKind::Draft(id) => format!("{DRAFT_PREFIX}{id}"),
            DocumentIdKind::Version {
                release_id,
                base_id,
            } => format!("{VERSION_PREFIX}{release_id}.{base_id}"),
        }
    }

    pub fn is_draft(&self) -> bool {
        matches!(self, DocumentIdKind::Draft(_))
    }

    pub fn is_published(&self) -> bool {
        matches!(self, DocumentIdKind::Published(_))
    }

    pub fn is_version(&self) -> bool {
        matches!(self, DocumentIdKind::Version { .. })
    }

    /// Draft id for the same base document.
    pub fn draft_of(id: &str) -> String {
        format!("{DRAFT_PREFIX}{}", DocumentIdKind::parse(id).base_id())
    }
}

/// Characters allowed in document ids: ASCII alphanumerics, `-`, `_` and `.`.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 128
        && !id.starts_with('.')
        && !id.ends_with('.')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_published_id() {
        let kind = DocumentIdKind::parse("venue-casa-lucio");
        assert_eq!(kind, DocumentIdKind::Published("venue-casa-lucio".to_string()));
        assert_eq!(kind.base_id(), "venue-casa-lucio");
        assert_eq!(kind.full_id(), "venue-casa-lucio");
        assert!(kind.is_published());
    }

    #[test]
    fn parse_draft_id() {
        let kind = DocumentIdKind::parse("drafts.review-42");
        assert_eq!(kind, DocumentIdKind::Draft("review-42".to_string()));
        assert_eq!(kind.base_id(), "review-42");
        assert_eq!(kind.full_id(), "drafts.review-42");
        assert!(kind.is_draft());
        assert_eq!(DocumentIdKind::draft_of("review-42"), "drafts.review-42");
        assert_eq!(DocumentIdKind::draft_of("drafts.review-42"), "drafts.review-42");
    }

    #[test]
    fn parse_version_id() {
        let kind = DocumentIdKind::parse("versions.spring-menu.guide-7");
        assert_eq!(
            kind,
            DocumentIdKind::Version {
                release_id: "spring-menu".to_string(),
                base_id: "guide-7".to_string(),
            }
        );
        assert_eq!(kind.base_id(), "guide-7");
        assert_eq!(kind.full_id(), "versions.spring-menu.guide-7");
        assert!(kind.is_version());
    }

    #[test]
    fn valid_ids() {
        assert!(is_valid_id("venue-1"));
        assert!(is_valid_id("drafts.venue_1"));
        assert!(!is_valid_id(""));
        assert!(!is_valid_id("con espacio"));
        assert!(!is_valid_id(".hidden"));
    }
}
