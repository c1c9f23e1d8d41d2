use serde::Deserialize;

use super::lines::fold_label;

/// Text field a content line can be routed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    About,
    Limits,
    Example,
}

/// What an `@label` marker selects once its label is folded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelKind {
    Field(Field),
    Links,
    /// Model marker; carries whatever followed the model token inside the label
    /// itself (`@نموذج4o` → `"4o"`).
    Model(String),
    Unknown,
}

/// Keys used for the canonical (localized) bot fields in the output JSON.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputKeys {
    pub models: String,
    pub about: String,
    pub limits: String,
    pub example: String,
}

impl Default for OutputKeys {
    fn default() -> Self {
        OutputKeys {
            models: "النموذج".into(),
            about: "نبذة".into(),
            limits: "حدود".into(),
            example: "مثال".into(),
        }
    }
}

/// Marker prefixes, field synonyms, sentinel names and output keys.
///
/// The first entry of each list is the one used when rendering a catalog back
/// into marker text.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Labels {
    pub package_markers: Vec<String>,
    pub category_markers: Vec<String>,
    pub about: Vec<String>,
    pub limits: Vec<String>,
    pub example: Vec<String>,
    pub links: Vec<String>,
    pub model: Vec<String>,
    pub package_fallback: String,
    pub category_fallback: String,
    pub keys: OutputKeys,
}

impl Default for Labels {
    fn default() -> Self {
        fn list(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }
        Labels {
            package_markers: list(&["العنوان الرئيسي", "Main Title"]),
            category_markers: list(&["العنوان الفرعي", "Sub Title"]),
            about: list(&["نبذة", "النبذة", "الوصف", "about", "description"]),
            limits: list(&["حدود", "الحدود", "القيود", "limits", "constraints"]),
            example: list(&["مثال", "أمثلة", "الأمثلة", "example", "examples"]),
            links: list(&["روابط", "الروابط", "links"]),
            model: list(&["النموذج", "نموذج", "model"]),
            package_fallback: "أدوات متنوعة".into(),
            category_fallback: "غير مصنف".into(),
            keys: OutputKeys::default(),
        }
    }
}

impl Labels {
    /// Value of a package marker line (`العنوان الرئيسي: name`), if it is one.
    pub fn package_value<'a>(&self, line: &'a str) -> Option<&'a str> {
        strip_marker(line, &self.package_markers)
    }

    /// Value of a category marker line (`العنوان الفرعي: name`), if it is one.
    pub fn category_value<'a>(&self, line: &'a str) -> Option<&'a str> {
        strip_marker(line, &self.category_markers)
    }

    pub fn classify_label(&self, label: &str) -> LabelKind {
        let folded = fold_label(label);
        if folded.is_empty() {
            return LabelKind::Unknown;
        }
        let matches = |synonyms: &[String]| synonyms.iter().any(|s| fold_label(s) == folded);

        if matches(&self.about) {
            LabelKind::Field(Field::About)
        } else if matches(&self.limits) {
            LabelKind::Field(Field::Limits)
        } else if matches(&self.example) {
            LabelKind::Field(Field::Example)
        } else if matches(&self.links) {
            LabelKind::Links
        } else if let Some(rest) = self.strip_model_token(&folded) {
            LabelKind::Model(rest.to_string())
        } else {
            LabelKind::Unknown
        }
    }

    /// Remove a leading model token from an already folded label.
    fn strip_model_token<'a>(&self, folded: &'a str) -> Option<&'a str> {
        // Longest first so "النموذج" is not read as "ال" + "نموذج".
        let mut tokens: Vec<String> = self.model.iter().map(|t| fold_label(t)).collect();
        tokens.sort_by_key(|t| std::cmp::Reverse(t.chars().count()));
        tokens
            .iter()
            .filter(|t| !t.is_empty())
            .find_map(|t| folded.strip_prefix(t.as_str()))
    }
}

/// `prefix` + optional spaces + `:` → trimmed remainder. Prefixes match
/// exactly, so `sub title: ...` inside a field stays text.
fn strip_marker<'a>(line: &'a str, prefixes: &[String]) -> Option<&'a str> {
    prefixes.iter().find_map(|prefix| {
        let rest = line.strip_prefix(prefix.as_str())?.trim_start();
        let value = rest
            .strip_prefix(':')
            .or_else(|| rest.strip_prefix('：'))?;
        Some(value.trim())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_marker_arabic_and_english() {
        let labels = Labels::default();
        assert_eq!(labels.package_value("العنوان الرئيسي: أدوات الكتابة"), Some("أدوات الكتابة"));
        assert_eq!(labels.package_value("Main Title: Writing Tools"), Some("Writing Tools"));
        assert_eq!(labels.package_value("Main Title : x"), Some("x"));
        assert_eq!(labels.package_value("Main Titles are great"), None);
        assert_eq!(labels.category_value("العنوان الفرعي:"), Some(""));
    }

    #[test]
    fn marker_prefix_casing_is_exact() {
        let labels = Labels::default();
        assert_eq!(labels.package_value("main title: x"), None);
        assert_eq!(labels.category_value("sub title: keep it short"), None);
        assert_eq!(labels.category_value("Sub Title: Assistants"), Some("Assistants"));
    }

    #[test]
    fn field_synonyms() {
        let labels = Labels::default();
        assert_eq!(labels.classify_label("النبذة"), LabelKind::Field(Field::About));
        assert_eq!(labels.classify_label("About"), LabelKind::Field(Field::About));
        assert_eq!(labels.classify_label("القيود"), LabelKind::Field(Field::Limits));
        assert_eq!(labels.classify_label("امثلة"), LabelKind::Field(Field::Example));
        assert_eq!(labels.classify_label("روابط"), LabelKind::Links);
        assert_eq!(labels.classify_label("ملاحظة"), LabelKind::Unknown);
    }

    #[test]
    fn model_label_keeps_attached_suffix() {
        let labels = Labels::default();
        assert_eq!(labels.classify_label("نموذج"), LabelKind::Model(String::new()));
        assert_eq!(labels.classify_label("النموذج"), LabelKind::Model(String::new()));
        assert_eq!(labels.classify_label("Model4o"), LabelKind::Model("4o".into()));
        // Diacritics on the label are ignored.
        assert_eq!(labels.classify_label("نَمُوذَج"), LabelKind::Model(String::new()));
    }
}
