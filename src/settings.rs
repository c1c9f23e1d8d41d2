use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config, Environment, File, Source};
use serde::Deserialize;

use crate::parser::labels::Labels;

/// Optional config file in the working directory (`bots_catalog.toml`, `.json`, ...).
const CONFIG_NAME: &str = "bots_catalog";
const ENV_PREFIX: &str = "BOTS";

const DEFAULT_DOC_PATH: &str = "pytoncode/metadata_doc.docx";
const DEFAULT_JSON_PATH: &str = "public/new_bots.json";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub doc_path: PathBuf,
    pub json_path: PathBuf,
    #[serde(default)]
    pub labels: Labels,
}

impl Settings {
    /// Defaults, then `bots_catalog.*` if present, then `BOTS_*` environment
    /// variables (`BOTS_DOC_PATH`, `BOTS_JSON_PATH`).
    pub fn load() -> Result<Self> {
        Self::build(File::with_name(CONFIG_NAME).required(false))
    }

    fn build<S>(file: S) -> Result<Self>
    where
        S: Source + Send + Sync + 'static,
    {
        Config::builder()
            .set_default("doc_path", DEFAULT_DOC_PATH)?
            .set_default("json_path", DEFAULT_JSON_PATH)?
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .context("Failed to load settings")?
            .try_deserialize()
            .context("Invalid settings")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn defaults_without_file() {
        let s = Settings::build(File::from_str("", FileFormat::Toml)).unwrap();
        assert_eq!(s.doc_path, PathBuf::from(DEFAULT_DOC_PATH));
        assert_eq!(s.json_path, PathBuf::from(DEFAULT_JSON_PATH));
        assert_eq!(s.labels.keys.about, "نبذة");
    }

    #[test]
    fn file_overrides_paths_and_labels() {
        let toml = r#"
json_path = "out/bots.json"

[labels]
package_markers = ["Package"]
category_fallback = "Misc"

[labels.keys]
about = "summary"
"#;
        let s = Settings::build(File::from_str(toml, FileFormat::Toml)).unwrap();
        assert_eq!(s.doc_path, PathBuf::from(DEFAULT_DOC_PATH));
        assert_eq!(s.json_path, PathBuf::from("out/bots.json"));
        assert_eq!(s.labels.package_markers, vec!["Package"]);
        assert_eq!(s.labels.category_fallback, "Misc");
        assert_eq!(s.labels.keys.about, "summary");
        // Unset label fields keep their defaults.
        assert_eq!(s.labels.keys.limits, "حدود");
        assert_eq!(s.labels.package_fallback, "أدوات متنوعة");
    }
}
