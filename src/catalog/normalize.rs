use std::sync::LazyLock;

use itertools::Itertools;
use regex::Regex;
use url::Url;

use super::{Bot, Models};
use crate::parser::labels::Field;
use crate::parser::lines::fold_label;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)https?://[^\s<>"'«»“”]+"#).unwrap());

/// Punctuation that ends a sentence rather than a URL.
const URL_TRAILING: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '}', '،', '؛'];

/// Hyphen and dash variants Word's autocorrect may put in a model name.
const DASHES: &[char] = &['-', '\u{2010}', '\u{2011}', '\u{2012}', '\u{2013}', '\u{2014}', '\u{2212}'];

/// Tokens removed from a raw model name before matching.
const MODEL_NOISE: &[&str] = &["chatgpt", "gpt", "جيبيتي", "النموذج", "نموذج", "model"];

/// Return the trimmed value if it is an absolute `http`/`https` URL with a host.
pub fn to_safe_url(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let parsed = Url::parse(value).ok()?;
    let has_host = parsed.host_str().is_some_and(|h| !h.is_empty());
    if matches!(parsed.scheme(), "http" | "https") && has_host {
        Some(value.to_string())
    } else {
        None
    }
}

/// Byte offset of the first valid URL in `text`.
pub fn url_start(text: &str) -> Option<usize> {
    URL_RE
        .find_iter(text)
        .find(|m| to_safe_url(m.as_str().trim_end_matches(URL_TRAILING)).is_some())
        .map(|m| m.start())
}

/// All valid absolute URLs in a line of free text, in order, deduplicated.
pub fn extract_urls(text: &str) -> Vec<String> {
    URL_RE
        .find_iter(text)
        .filter_map(|m| to_safe_url(m.as_str().trim_end_matches(URL_TRAILING)))
        .unique()
        .collect()
}

/// Canonical model key: `4o`, `4o-mini`, `5`, or the cleaned token.
/// An empty name means the default model, `4o`.
pub fn normalize_model_key(raw: &str) -> String {
    let mut token: String = fold_label(raw)
        .chars()
        .filter(|c| !c.is_whitespace() && !DASHES.contains(c))
        .collect();
    for noise in MODEL_NOISE {
        token = token.replace(noise, "");
    }
    match token.as_str() {
        "" | "4" | "4o" => "4o".to_string(),
        "4omini" | "4omin" => "4o-mini".to_string(),
        _ => token,
    }
}

/// Raw buffers for the bot currently being parsed.
#[derive(Debug, Default)]
pub struct BotDraft {
    title: String,
    about: Vec<String>,
    limits: Vec<String>,
    example: Vec<String>,
    models: Models,
    extra_links: Vec<String>,
}

impl BotDraft {
    pub fn new(title: impl Into<String>) -> Self {
        BotDraft {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn push_text(&mut self, field: Field, line: &str) {
        let buffer = match field {
            Field::About => &mut self.about,
            Field::Limits => &mut self.limits,
            Field::Example => &mut self.example,
        };
        buffer.push(line.to_string());
    }

    /// Assign a model URL. Returns false when the value is not a valid URL.
    pub fn set_model(&mut self, key: &str, value: &str) -> bool {
        match to_safe_url(value) {
            Some(url) => {
                self.models.insert(key.to_string(), url);
                true
            }
            None => false,
        }
    }

    /// Queue an unnamed link collected under the links marker.
    pub fn push_link(&mut self, url: String) {
        if !self.extra_links.contains(&url) {
            self.extra_links.push(url);
        }
    }

    /// Join text buffers, fold extra links into the model map under
    /// `link-N` keys and pick the primary link.
    pub fn finalize(self) -> Bot {
        let mut models = self.models;
        let mut n = 1;
        for url in self.extra_links {
            if models.contains_url(&url) {
                continue;
            }
            while models.contains_key(&format!("link-{n}")) {
                n += 1;
            }
            models.insert(format!("link-{n}"), url);
            n += 1;
        }

        let url = primary_link(&models);
        Bot {
            title: self.title,
            about: collapse(&self.about),
            limits: collapse(&self.limits),
            example: collapse(&self.example),
            models,
            url,
        }
    }
}

/// `4o`, then `5`, then the first model in insertion order.
pub fn primary_link(models: &Models) -> String {
    models
        .get("4o")
        .or_else(|| models.get("5"))
        .or_else(|| models.iter().next().map(|(_, v)| v))
        .unwrap_or_default()
        .to_string()
}

fn collapse(lines: &[String]) -> String {
    lines.iter().join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_validation() {
        assert_eq!(
            to_safe_url(" https://example.com/a "),
            Some("https://example.com/a".to_string())
        );
        assert_eq!(to_safe_url("http://x.example"), Some("http://x.example".to_string()));
        assert_eq!(to_safe_url("ftp://x"), None);
        assert_eq!(to_safe_url("not a url"), None);
        assert_eq!(to_safe_url(""), None);
        assert_eq!(to_safe_url("https://"), None);
        assert_eq!(to_safe_url("mailto:a@b.c"), None);
    }

    #[test]
    fn model_keys() {
        for raw in ["GPT-4O", "gpt4o", "٤o", "4", "", "  4o ", "Gpt 4o"] {
            assert_eq!(normalize_model_key(raw), "4o", "raw={raw:?}");
        }
        assert_eq!(normalize_model_key("4o-mini"), "4o-mini");
        assert_eq!(normalize_model_key("GPT-4o mini"), "4o-mini");
        assert_eq!(normalize_model_key("gpt-5"), "5");
        assert_eq!(normalize_model_key("٥"), "5");
        assert_eq!(normalize_model_key("O3-Pro"), "o3pro");
        assert_eq!(normalize_model_key("نموذج 5"), "5");
    }

    #[test]
    fn model_keys_from_word_typography() {
        // En dash, non-breaking hyphen, minus sign, harakat on the digit.
        for raw in ["GPT\u{2013}4o", "GPT\u{2011}4o", "gpt\u{2212}4o", "\u{0664}\u{064F}o", "ـ4ـo"] {
            assert_eq!(normalize_model_key(raw), "4o", "raw={raw:?}");
        }
        assert_eq!(normalize_model_key("GPT\u{2013}4o\u{2013}mini"), "4o-mini");
    }

    #[test]
    fn url_start_is_case_insensitive() {
        assert_eq!(url_start("4o HTTPS://x.example/a"), Some(3));
        assert_eq!(url_start("4o ftp://x.example"), None);
        assert_eq!(url_start("http:// then https://y.example"), Some(13));
    }

    #[test]
    fn extracts_several_urls() {
        let urls = extract_urls(
            "see https://a.example/x, and (https://b.example/y). ftp://c.example https://a.example/x",
        );
        assert_eq!(urls, vec!["https://a.example/x", "https://b.example/y"]);
    }

    #[test]
    fn finalize_joins_and_trims() {
        let mut draft = BotDraft::new("Bot");
        draft.push_text(Field::About, "first");
        draft.push_text(Field::About, "second ");
        let bot = draft.finalize();
        assert_eq!(bot.about, "first\nsecond");
        assert_eq!(bot.limits, "");
        assert!(!bot.has_link());
    }

    #[test]
    fn primary_link_order() {
        let mut draft = BotDraft::new("Bot");
        draft.set_model("o1", "https://o1.example");
        draft.set_model("5", "https://five.example");
        assert_eq!(draft.finalize().url, "https://five.example");

        let mut draft = BotDraft::new("Bot");
        draft.set_model("o1", "https://o1.example");
        draft.set_model("5", "https://five.example");
        draft.set_model("4o", "https://four.example");
        assert_eq!(draft.finalize().url, "https://four.example");

        let mut draft = BotDraft::new("Bot");
        draft.set_model("o1", "https://o1.example");
        assert_eq!(draft.finalize().url, "https://o1.example");
    }

    #[test]
    fn invalid_model_url_dropped() {
        let mut draft = BotDraft::new("Bot");
        assert!(!draft.set_model("4o", "ftp://x"));
        let bot = draft.finalize();
        assert!(bot.models.is_empty());
        assert_eq!(bot.url, "");
    }

    #[test]
    fn extra_links_get_free_synthetic_keys() {
        let mut draft = BotDraft::new("Bot");
        draft.set_model("link-1", "https://named.example");
        draft.set_model("4o", "https://four.example");
        draft.push_link("https://four.example".into());
        draft.push_link("https://extra.example/a".into());
        draft.push_link("https://extra.example/a".into());
        draft.push_link("https://extra.example/b".into());
        let bot = draft.finalize();
        let pairs: Vec<_> = bot.models.iter().collect();
        assert_eq!(
            pairs,
            vec![
                ("link-1", "https://named.example"),
                ("4o", "https://four.example"),
                ("link-2", "https://extra.example/a"),
                ("link-3", "https://extra.example/b"),
            ]
        );
        assert_eq!(bot.models.len(), 4);
    }
}
