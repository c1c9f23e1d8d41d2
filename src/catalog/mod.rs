pub mod merge;
pub mod normalize;
pub mod render;
pub mod report;

use serde_json::{json, Map, Value};

use crate::parser::labels::OutputKeys;

/// Insertion-ordered model key → URL mapping. Re-inserting a key replaces
/// its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Models(Vec<(String, String)>);

impl Models {
    pub fn insert(&mut self, key: String, url: String) {
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = url,
            None => self.0.push((key, url)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn contains_url(&self, url: &str) -> bool {
        self.0.iter().any(|(_, v)| v == url)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect();
        Value::Object(map)
    }
}

/// A finalized bot record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bot {
    pub title: String,
    pub about: String,
    pub limits: String,
    pub example: String,
    pub models: Models,
    /// Primary link, empty when the bot has no valid model URL.
    pub url: String,
}

impl Bot {
    pub fn has_link(&self) -> bool {
        !self.url.is_empty()
    }

    /// Output shape: localized canonical keys, then English aliases for the
    /// front end, then `url` (only when set) and `hasLink`.
    pub fn to_json(&self, keys: &OutputKeys) -> Value {
        let models = self.models.to_json();
        let mut entry = Map::new();
        entry.insert("botTitle".into(), json!(self.title));
        entry.insert(keys.models.clone(), models.clone());
        entry.insert(keys.about.clone(), json!(self.about));
        entry.insert(keys.limits.clone(), json!(self.limits));
        entry.insert(keys.example.clone(), json!(self.example));
        for alias in ["model", "models", "links"] {
            entry.insert(alias.into(), models.clone());
        }
        for (alias, value) in [
            ("about", &self.about),
            ("description", &self.about),
            ("limits", &self.limits),
            ("constraints", &self.limits),
            ("example", &self.example),
            ("examples", &self.example),
        ] {
            entry.insert(alias.into(), json!(value));
        }
        if self.has_link() {
            entry.insert("url".into(), json!(self.url));
        }
        entry.insert("hasLink".into(), json!(self.has_link()));
        Value::Object(entry)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub bots: Vec<Bot>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub name: String,
    pub categories: Vec<Category>,
}

impl Package {
    pub fn bot_count(&self) -> usize {
        self.categories.iter().map(|c| c.bots.len()).sum()
    }
}

/// Hierarchy produced by one parse pass. Package ids are assigned at merge
/// time, not here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    pub packages: Vec<Package>,
}

impl Catalog {
    pub fn bot_count(&self) -> usize {
        self.packages.iter().map(Package::bot_count).sum()
    }

    pub fn category_count(&self) -> usize {
        self.packages.iter().map(|p| p.categories.len()).sum()
    }
}

/// Total bots in a JSON catalog (`packages[].categories[].bots[]`).
pub fn json_bot_count(root: &Value) -> usize {
    json_bots(root).count()
}

pub fn json_bots(root: &Value) -> impl Iterator<Item = &Value> {
    root.get("packages")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|p| p.get("categories").and_then(Value::as_array))
        .flatten()
        .filter_map(|c| c.get("bots").and_then(Value::as_array))
        .flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn models_overwrite_in_place() {
        let mut m = Models::default();
        m.insert("5".into(), "https://a.example".into());
        m.insert("4o".into(), "https://b.example".into());
        m.insert("5".into(), "https://c.example".into());
        let keys: Vec<_> = m.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["5", "4o"]);
        assert_eq!(m.get("5"), Some("https://c.example"));
    }

    #[test]
    fn bot_json_shape() {
        let mut models = Models::default();
        models.insert("4o".into(), "https://example.com/x".into());
        let bot = Bot {
            title: "Summarizer".into(),
            about: "Summarizes.".into(),
            models,
            url: "https://example.com/x".into(),
            ..Default::default()
        };
        let v = bot.to_json(&OutputKeys::default());
        let keys: Vec<&str> = v.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "botTitle", "النموذج", "نبذة", "حدود", "مثال", "model", "models", "links",
                "about", "description", "limits", "constraints", "example", "examples",
                "url", "hasLink",
            ]
        );
        assert_eq!(v["models"]["4o"], "https://example.com/x");
        assert_eq!(v["description"], "Summarizes.");
        assert_eq!(v["hasLink"], true);
    }

    #[test]
    fn bot_without_link_has_no_url_key() {
        let v = Bot { title: "x".into(), ..Default::default() }.to_json(&OutputKeys::default());
        assert!(v.get("url").is_none());
        assert_eq!(v["hasLink"], false);
        assert_eq!(v["النموذج"], json!({}));
    }
}
