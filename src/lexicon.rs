//! Suspicious-phrase lexicon and matcher.
//!
//! Matching is plain case-insensitive substring containment: "fee" matches
//! inside "coffee". Results follow lexicon order, not text order.

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Built-in phrases, in match-reporting order.
pub const SUSPICIOUS_KEYWORDS: &[&str] = &[
    "fee",
    "registration",
    "activation",
    "pay",
    "invest",
    "investment",
    "earn",
    "weekly",
    "daily",
    "per day",
    "per week",
    "buy software",
    "software fee",
    "verification fee",
    "activation amount",
    "pay 999",
    "pay 499",
    "pay 799",
    "pay 1299",
    "pay 1500",
];

static BUILTIN: Lazy<Lexicon> =
    Lazy::new(|| Lexicon::new(SUSPICIOUS_KEYWORDS.iter().map(|s| s.to_string())));

/// Ordered, duplicate-free list of lower-case phrases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexicon {
    phrases: Vec<String>,
}

impl Lexicon {
    /// Build from raw entries: trimmed, lower-cased, empties dropped,
    /// duplicates removed keeping the first occurrence.
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut phrases: Vec<String> = Vec::new();
        for e in entries {
            let p = e.trim().to_lowercase();
            if !p.is_empty() && !phrases.contains(&p) {
                phrases.push(p);
            }
        }
        Self { phrases }
    }

    pub fn builtin() -> &'static Lexicon {
        &BUILTIN
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// Phrases contained in `text`, in lexicon order, each at most once.
    pub fn find_matches(&self, text: &str) -> Vec<String> {
        let t = text.to_lowercase();
        self.phrases
            .iter()
            .filter(|p| t.contains(p.as_str()))
            .cloned()
            .collect()
    }

    /// Load a lexicon file (JSON array or TOML `phrases = [...]`).
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading lexicon from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let entries = parse_lexicon(&content, ext.as_str())?;
        let lex = Self::new(entries);
        if lex.is_empty() {
            return Err(anyhow!("lexicon at {} has no usable phrases", path.display()));
        }
        Ok(lex)
    }

    /// Load from `path` when given; fall back to the built-in list on any error.
    pub fn load_or_builtin(path: Option<&Path>) -> Self {
        match path {
            None => Self::builtin().clone(),
            Some(p) => Self::load_from(p).unwrap_or_else(|e| {
                warn!(error = %e, "lexicon load failed, using built-in phrases");
                Self::builtin().clone()
            }),
        }
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::builtin().clone()
    }
}

/// Match `text` against the built-in lexicon.
pub fn find_matches(text: &str) -> Vec<String> {
    Lexicon::builtin().find_matches(text)
}

fn parse_lexicon(s: &str, hint_ext: &str) -> Result<Vec<String>> {
    if hint_ext == "toml" {
        return parse_toml(s);
    }
    if let Ok(v) = serde_json::from_str::<Vec<String>>(s) {
        return Ok(v);
    }
    parse_toml(s).map_err(|_| anyhow!("unsupported lexicon format"))
}

fn parse_toml(s: &str) -> Result<Vec<String>> {
    #[derive(Deserialize)]
    struct TomlLexicon {
        phrases: Vec<String>,
    }
    let v: TomlLexicon = toml::from_str(s)?;
    Ok(v.phrases)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn registration_scam_hits_in_lexicon_order() {
        let text = "Work From Home Job Pay 999 registration charges. Weekly 25,000 income guaranteed.";
        let m = find_matches(text);
        assert_eq!(m, vec!["registration", "pay", "weekly", "pay 999"]);
    }

    #[test]
    fn clean_post_has_no_hits() {
        let text = "Python Developer Looking for Python developer with Django experience. \
                    2+ years required. Apply on company site.";
        assert!(find_matches(text).is_empty());
    }

    #[test]
    fn substring_semantics_are_literal() {
        // Known false positive, kept on purpose.
        assert_eq!(find_matches("Free coffee on Fridays"), vec!["fee"]);
    }

    #[test]
    fn repetition_does_not_change_the_match_set() {
        let t = "Earn daily! Pay 499 activation amount.";
        let once: BTreeSet<_> = find_matches(t).into_iter().collect();
        let twice: BTreeSet<_> = find_matches(&format!("{t}{t}")).into_iter().collect();
        assert_eq!(once, twice);
        assert_eq!(find_matches(t), find_matches(&format!("{t} {t}")));
    }

    #[test]
    fn new_dedups_and_normalizes() {
        let lex = Lexicon::new(
            [" Fee ", "", "FEE", "per day", "fee"]
                .iter()
                .map(|s| s.to_string()),
        );
        assert_eq!(lex.phrases(), &["fee".to_string(), "per day".to_string()]);
    }

    #[test]
    fn loads_json_and_toml_and_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("lex.json");
        fs::write(&json, r#"["Wire transfer", "gift card"]"#).unwrap();
        let toml_p = dir.path().join("lex.toml");
        fs::write(&toml_p, r#"phrases = ["upfront", "Upfront"]"#).unwrap();

        let a = Lexicon::load_from(&json).unwrap();
        assert_eq!(a.find_matches("Send a WIRE TRANSFER today"), vec!["wire transfer"]);
        let b = Lexicon::load_from(&toml_p).unwrap();
        assert_eq!(b.len(), 1);

        let missing = dir.path().join("nope.json");
        let c = Lexicon::load_or_builtin(Some(&missing));
        assert_eq!(c.len(), SUSPICIOUS_KEYWORDS.len());
    }
}
