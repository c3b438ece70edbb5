//! Paper identifier classification
//!
//! Callers hand us DOIs, arXiv ids, OpenAlex work ids and provider-native
//! ids in many spellings. Each rule is a pure predicate plus a normalizer,
//! evaluated in priority order; the first match wins.

use crate::errors::SourceError;
use regex_lite::Regex;
use std::sync::OnceLock;

/// Normalized lookup derived from a caller supplied identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaperLookup {
    /// Bare DOI, e.g. `10.1038/nature12373`
    Doi(String),
    /// arXiv id without marker, e.g. `2301.07041v2`
    Arxiv(String),
    /// OpenAlex work id, e.g. `W2741809807`
    OpenAlex(String),
    /// Provider-native id, passed through verbatim
    Native(String),
}

impl PaperLookup {
    /// Path segment understood by the Semantic Scholar Graph API
    pub fn upstream_id(&self) -> String {
        match self {
            PaperLookup::Doi(doi) => format!("DOI:{}", doi),
            PaperLookup::Arxiv(id) => format!("ARXIV:{}", id),
            PaperLookup::OpenAlex(id) | PaperLookup::Native(id) => id.clone(),
        }
    }
}

/// A single classification rule
pub struct IdentifierRule {
    pub name: &'static str,
    pub matches: fn(&str) -> bool,
    pub normalize: fn(&str) -> PaperLookup,
}

/// Ordered identifier rules
pub struct IdentifierRules {
    rules: Vec<IdentifierRule>,
}

impl Default for IdentifierRules {
    fn default() -> Self {
        Self {
            rules: vec![
                IdentifierRule { name: "doi", matches: is_doi, normalize: |s| PaperLookup::Doi(strip_doi_prefix(s).to_string()) },
                IdentifierRule { name: "arxiv", matches: is_arxiv, normalize: |s| PaperLookup::Arxiv(strip_arxiv_marker(s).to_string()) },
                IdentifierRule { name: "openalex", matches: is_openalex, normalize: |s| PaperLookup::OpenAlex(strip_openalex_prefix(s).to_string()) },
                IdentifierRule { name: "native", matches: is_native, normalize: |s| PaperLookup::Native(s.to_string()) },
            ],
        }
    }
}

impl IdentifierRules {
    /// Classify an identifier
    pub fn classify(&self, input: &str) -> Result<PaperLookup, SourceError> {
        let trimmed = input.trim();

        self.rules
            .iter()
            .find(|rule| (rule.matches)(trimmed))
            .map(|rule| {
                tracing::debug!(rule = rule.name, input = trimmed, "Classified paper identifier");
                (rule.normalize)(trimmed)
            })
            .ok_or_else(|| SourceError::InvalidIdentifier {
                input: input.to_string(),
            })
    }
}

/// Classify with the default rules
pub fn classify(input: &str) -> Result<PaperLookup, SourceError> {
    IdentifierRules::default().classify(input)
}

const DOI_PREFIXES: &[&str] = &[
    "https://doi.org/",
    "http://doi.org/",
    "https://dx.doi.org/",
    "http://dx.doi.org/",
    "doi:",
];

const OPENALEX_PREFIXES: &[&str] = &["https://openalex.org/", "http://openalex.org/"];

fn strip_prefix_ignore_case<'a>(input: &'a str, prefix: &str) -> Option<&'a str> {
    let head = input.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &input[prefix.len()..])
}

fn strip_doi_prefix(input: &str) -> &str {
    DOI_PREFIXES
        .iter()
        .find_map(|p| strip_prefix_ignore_case(input, p))
        .unwrap_or(input)
        .trim()
}

fn strip_openalex_prefix(input: &str) -> &str {
    OPENALEX_PREFIXES
        .iter()
        .find_map(|p| strip_prefix_ignore_case(input, p))
        .unwrap_or(input)
}

fn arxiv_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\d{4}\.\d{4,5}(v\d+)?$").expect("arXiv id pattern is valid")
    })
}

/// Marker-stripped arXiv id, if the input carries an explicit marker
fn arxiv_marked(input: &str) -> Option<&str> {
    let markers = [
        "https://arxiv.org/abs/",
        "http://arxiv.org/abs/",
        "arxiv.org/abs/",
        "arxiv:",
    ];
    markers
        .iter()
        .find_map(|m| strip_prefix_ignore_case(input, m))
        .map(str::trim)
}

fn strip_arxiv_marker(input: &str) -> &str {
    arxiv_marked(input).unwrap_or(input)
}

pub fn is_doi(input: &str) -> bool {
    let doi = strip_doi_prefix(input);
    doi.starts_with("10.") && doi.contains('/') && !doi.chars().any(char::is_whitespace)
}

pub fn is_arxiv(input: &str) -> bool {
    match arxiv_marked(input) {
        Some(id) => !id.is_empty() && !id.chars().any(char::is_whitespace),
        None => arxiv_pattern().is_match(input),
    }
}

pub fn is_openalex(input: &str) -> bool {
    let id = strip_openalex_prefix(input);
    id.len() > 1 && id.starts_with('W') && id[1..].chars().all(|c| c.is_ascii_digit())
}

pub fn is_native(input: &str) -> bool {
    !input.is_empty()
        && input
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, ':' | '.' | '_' | '-'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doi_spellings() {
        for input in [
            "10.1038/nature12373",
            "doi:10.1038/nature12373",
            "DOI:10.1038/nature12373",
            "https://doi.org/10.1038/nature12373",
            "http://dx.doi.org/10.1038/nature12373",
        ] {
            assert_eq!(
                classify(input).unwrap(),
                PaperLookup::Doi("10.1038/nature12373".into()),
                "input {input}"
            );
        }
    }

    #[test]
    fn test_arxiv_spellings() {
        assert_eq!(classify("2301.07041").unwrap(), PaperLookup::Arxiv("2301.07041".into()));
        assert_eq!(classify("arXiv:1706.03762v5").unwrap(), PaperLookup::Arxiv("1706.03762v5".into()));
        assert_eq!(
            classify("https://arxiv.org/abs/1706.03762").unwrap(),
            PaperLookup::Arxiv("1706.03762".into())
        );
        assert_eq!(classify("arxiv:hep-th/9901001").unwrap(), PaperLookup::Arxiv("hep-th/9901001".into()));
    }

    #[test]
    fn test_openalex_ids() {
        assert_eq!(classify("W2741809807").unwrap(), PaperLookup::OpenAlex("W2741809807".into()));
        assert_eq!(
            classify("https://openalex.org/W2741809807").unwrap(),
            PaperLookup::OpenAlex("W2741809807".into())
        );
        // Not a work id, falls through to native
        assert_eq!(classify("Wabc").unwrap(), PaperLookup::Native("Wabc".into()));
    }

    #[test]
    fn test_native_ids() {
        let s2 = "649def34f8be52c8b66281af98ae884c09aef38b";
        assert_eq!(classify(s2).unwrap(), PaperLookup::Native(s2.into()));
        assert_eq!(classify("CorpusId:215416146").unwrap(), PaperLookup::Native("CorpusId:215416146".into()));
        assert_eq!(classify("  P0  ").unwrap(), PaperLookup::Native("P0".into()));
    }

    #[test]
    fn test_invalid_identifiers() {
        for input in ["", "   ", "two words", "a/b?c", "10.1038 /x"] {
            assert!(
                matches!(classify(input), Err(SourceError::InvalidIdentifier { .. })),
                "input {input:?}"
            );
        }
    }

    #[test]
    fn test_rule_order() {
        // A DOI containing an arXiv-looking suffix is still a DOI
        assert!(matches!(classify("10.48550/arXiv.2301.07041"), Ok(PaperLookup::Doi(_))));
    }

    #[test]
    fn test_upstream_ids() {
        assert_eq!(PaperLookup::Doi("10.1/x".into()).upstream_id(), "DOI:10.1/x");
        assert_eq!(PaperLookup::Arxiv("2301.07041".into()).upstream_id(), "ARXIV:2301.07041");
        assert_eq!(PaperLookup::Native("abc".into()).upstream_id(), "abc");
    }

    #[test]
    fn test_predicates_are_independent() {
        assert!(is_doi("doi:10.1/x"));
        assert!(!is_doi("2301.07041"));
        assert!(is_arxiv("2301.07041v3"));
        assert!(!is_arxiv("230.07041"));
        assert!(is_openalex("W1"));
        assert!(!is_native("has space"));
    }
}
