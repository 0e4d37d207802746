//! HTML highlighting of matched keywords for the review UI.
//!
//! The text is escaped first (`&`, `<`, `>`), then each keyword is wrapped
//! case-insensitively, longest keyword first so that "pay 999" is marked
//! before "pay" gets a chance to split it.

use regex::Regex;

pub const MARK_OPEN: &str = r#"<mark style="background:#ffb3b3;color:#000">"#;
pub const MARK_CLOSE: &str = "</mark>";

pub fn highlight(text: &str, keywords: &[String]) -> String {
    let mut out = html_escape::encode_text(text).into_owned();

    let mut kws: Vec<&str> = keywords
        .iter()
        .map(String::as_str)
        .filter(|k| !k.is_empty())
        .collect();
    // Stable: equal lengths keep lexicon order.
    kws.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));

    for kw in kws {
        let pattern = format!("(?i){}", regex::escape(kw));
        let Ok(re) = Regex::new(&pattern) else {
            continue;
        };
        out = re
            .replace_all(&out, |caps: &regex::Captures| {
                format!("{MARK_OPEN}{}{MARK_CLOSE}", &caps[0])
            })
            .into_owned();
    }
    out
}
