use serde_json::Value;

use super::json_bots;
use super::normalize::normalize_model_key;
use crate::parser::labels::Labels;

/// Keys that may hold a direct link on hand-edited or older catalogs.
const URL_KEYS: &[&str] = &["الرابط", "رابط", "الرابط المباشر", "url", "link", "links", "primaryUrl", "directUrl"];
/// Model map keys beyond the configured output key.
const MODEL_KEYS: &[&str] = &["النماذج", "model", "models"];

const MAX_MISSING: usize = 10;
const MAX_SAMPLES: usize = 5;
const SAMPLE_WIDTH: usize = 120;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub title: String,
    pub about: String,
    pub limits: String,
    pub example: String,
    pub link: String,
}

/// Field coverage of a JSON catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub packages: usize,
    pub total: usize,
    pub with_about: usize,
    pub with_limits: usize,
    pub with_example: usize,
    pub with_link: usize,
    pub missing_links: Vec<String>,
    pub samples: Vec<Sample>,
}

impl Summary {
    pub fn from_catalog(root: &Value, labels: &Labels) -> Self {
        let about_keys = with_output_key(&labels.keys.about, &labels.about);
        let limit_keys = with_output_key(&labels.keys.limits, &labels.limits);
        let example_keys = with_output_key(&labels.keys.example, &labels.example);
        let model_keys: Vec<&str> = std::iter::once(labels.keys.models.as_str())
            .chain(MODEL_KEYS.iter().copied())
            .collect();

        let mut summary = Summary {
            packages: root
                .get("packages")
                .and_then(Value::as_array)
                .map_or(0, Vec::len),
            ..Default::default()
        };

        for bot in json_bots(root) {
            summary.total += 1;
            let title = bot.get("botTitle").and_then(Value::as_str).unwrap_or("");
            let about = pick_text(bot, &about_keys);
            let limits = pick_text(bot, &limit_keys);
            let example = pick_text(bot, &example_keys);
            let models = pick_models(bot, &model_keys);
            let link = pick_link(bot, &models);

            summary.with_about += usize::from(!about.is_empty());
            summary.with_limits += usize::from(!limits.is_empty());
            summary.with_example += usize::from(!example.is_empty());
            if !link.is_empty() {
                summary.with_link += 1;
            } else if summary.missing_links.len() < MAX_MISSING {
                summary.missing_links.push(title.to_string());
            }

            let has_text = !(about.is_empty() && limits.is_empty() && example.is_empty());
            if has_text && summary.samples.len() < MAX_SAMPLES {
                summary.samples.push(Sample {
                    title: title.to_string(),
                    about: truncate(&about, SAMPLE_WIDTH),
                    limits: truncate(&limits, SAMPLE_WIDTH),
                    example: truncate(&example, SAMPLE_WIDTH),
                    link,
                });
            }
        }
        summary
    }

    pub fn print(&self) {
        println!("Packages:                    {}", self.packages);
        println!("Bots total:                  {}", self.total);
        println!("About (non-empty):           {}", self.with_about);
        println!("Limits (non-empty):          {}", self.with_limits);
        println!("Example (non-empty):         {}", self.with_example);
        println!("Bots with at least one link: {}", self.with_link);
        println!("Bots missing links:          {}", self.total - self.with_link);

        if !self.missing_links.is_empty() {
            println!("\n--- Missing link samples ---");
            for title in &self.missing_links {
                println!("  - {}", title);
            }
        }
        if !self.samples.is_empty() {
            println!("\n--- Samples ---");
            for s in &self.samples {
                println!("- {}", s.title);
                for (label, value) in [("About", &s.about), ("Limits", &s.limits), ("Example", &s.example)] {
                    if !value.is_empty() {
                        println!("  {}: {}", label, value);
                    }
                }
                let link = if s.link.is_empty() { "(missing)" } else { s.link.as_str() };
                println!("  Link: {}", link);
            }
        }
    }
}

pub(crate) fn with_output_key<'a>(key: &'a str, synonyms: &'a [String]) -> Vec<&'a str> {
    std::iter::once(key)
        .chain(synonyms.iter().map(String::as_str))
        .collect()
}

/// First non-empty string among `keys`.
pub(crate) fn pick_text(bot: &Value, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|k| bot.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Model map under any of `keys`; a bare string counts as the `4o` link.
/// Falls back to any object field holding http values.
pub(crate) fn pick_models(bot: &Value, keys: &[&str]) -> Vec<(String, String)> {
    for key in keys {
        match bot.get(*key) {
            Some(Value::Object(map)) => {
                let cleaned = string_entries(map);
                if !cleaned.is_empty() {
                    return cleaned;
                }
            }
            Some(Value::String(s)) if !s.trim().is_empty() => {
                return vec![("4o".to_string(), s.trim().to_string())];
            }
            _ => {}
        }
    }
    bot.as_object()
        .into_iter()
        .flat_map(|obj| obj.values())
        .filter_map(Value::as_object)
        .map(string_entries)
        .find(|entries| entries.iter().any(|(_, v)| v.starts_with("http")))
        .unwrap_or_default()
}

fn string_entries(map: &serde_json::Map<String, Value>) -> Vec<(String, String)> {
    map.iter()
        .filter_map(|(k, v)| {
            let v = v.as_str()?.trim();
            (!v.is_empty()).then(|| (k.clone(), v.to_string()))
        })
        .collect()
}

fn pick_link(bot: &Value, models: &[(String, String)]) -> String {
    let direct = pick_text(bot, URL_KEYS);
    if !direct.is_empty() {
        return direct;
    }
    ["4o", "4o-mini", "5"]
        .iter()
        .find_map(|want| {
            models
                .iter()
                .find(|(k, _)| normalize_model_key(k) == *want)
                .map(|(_, v)| v.clone())
        })
        .or_else(|| models.first().map(|(_, v)| v.clone()))
        .unwrap_or_default()
}

fn truncate(s: &str, max: usize) -> String {
    let flat = s.trim().replace('\n', " ");
    if flat.chars().count() <= max {
        flat
    } else {
        let truncated: String = flat.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fixture_summary() {
        let text = std::fs::read_to_string("tests/fixtures/existing_catalog.json").unwrap();
        let root: Value = serde_json::from_str(&text).unwrap();
        let s = Summary::from_catalog(&root, &Labels::default());
        assert_eq!(s.packages, 2);
        assert_eq!(s.total, 3);
        assert_eq!(s.with_about, 3);
        assert_eq!(s.with_limits, 0);
        assert_eq!(s.with_example, 1);
        assert_eq!(s.with_link, 2);
        assert_eq!(s.missing_links, vec!["الباحث"]);
        assert_eq!(s.samples.len(), 3);
        assert_eq!(s.samples[2].link, "https://example.org/logo");
    }

    #[test]
    fn link_from_model_keys() {
        let bot = json!({ "botTitle": "b", "models": { "GPT-5": "https://five.example", "o1": "https://o1.example" } });
        let models = pick_models(&bot, &["النموذج", "models"]);
        assert_eq!(pick_link(&bot, &models), "https://five.example");
    }

    #[test]
    fn string_links_field_counts_as_link() {
        let root = json!({ "packages": [{ "package": "P", "categories": [{ "category": "C", "bots": [
            { "botTitle": "a", "links": "https://a.example" },
            { "botTitle": "b", "links": {} }
        ]}]}]});
        let s = Summary::from_catalog(&root, &Labels::default());
        assert_eq!(s.with_link, 1);
        assert_eq!(s.missing_links, vec!["b"]);
    }

    #[test]
    fn models_found_under_unknown_key() {
        let bot = json!({ "botTitle": "b", "روابط النماذج": { "x": "https://x.example" } });
        let models = pick_models(&bot, &["النموذج"]);
        assert_eq!(models, vec![("x".to_string(), "https://x.example".to_string())]);
    }

    #[test]
    fn truncation() {
        assert_eq!(truncate("a\nb", 10), "a b");
        assert_eq!(truncate("ابجدهوز", 3), "ابج...");
    }
}
