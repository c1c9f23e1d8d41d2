use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use super::Catalog;
use crate::parser::labels::OutputKeys;
use crate::parser::lines::normalize_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Add what is new, overwrite what changed, never delete.
    Additive,
    /// Only touch bots that already exist in the catalog.
    UpdateExisting,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MergeStats {
    pub packages_added: usize,
    pub packages_reused: usize,
    pub categories_added: usize,
    pub bots_added: usize,
    pub bots_updated: usize,
    /// Bots with no existing counterpart in update-only mode.
    pub bots_skipped: usize,
}

impl MergeStats {
    pub fn print(&self) {
        println!(
            "Packages: {} reused, {} added | Categories added: {}",
            self.packages_reused, self.packages_added, self.categories_added
        );
        println!(
            "Bots: {} added, {} updated, {} skipped",
            self.bots_added, self.bots_updated, self.bots_skipped
        );
    }
}

/// Read a catalog that must exist and have a `packages` array.
pub fn load_catalog(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog {}", path.display()))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;
    if !value.get("packages").is_some_and(Value::is_array) {
        bail!("{} has no \"packages\" array", path.display());
    }
    Ok(value)
}

/// Read a catalog to merge into. Missing or malformed files give an empty
/// baseline (`Value::Null`).
pub fn load_catalog_or_empty(path: &Path) -> Value {
    if !path.exists() {
        debug!(path = %path.display(), "no existing catalog");
        return Value::Null;
    }
    match load_catalog(path) {
        Ok(value) => value,
        Err(err) => {
            warn!("{:#}; merging into an empty catalog", err);
            Value::Null
        }
    }
}

pub fn write_catalog(path: &Path, catalog: &Value) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(catalog)?;
    fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Merge a freshly parsed hierarchy into an existing catalog.
///
/// Packages and categories match on normalized name, bots on normalized
/// title. Matched packages keep their `packageId`; new ones get
/// `max + 1` in first-seen order. Matched bots only take the non-empty
/// fields of the new record. Existing order is kept and new entries are
/// appended.
pub fn merge(
    existing: Value,
    parsed: &Catalog,
    keys: &OutputKeys,
    mode: MergeMode,
) -> (Value, MergeStats) {
    let mut root = match existing {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let mut packages = match root.get_mut("packages") {
        Some(Value::Array(items)) => std::mem::take(items),
        _ => Vec::new(),
    };
    let mut stats = MergeStats::default();
    match mode {
        MergeMode::Additive => add_or_update(&mut packages, parsed, keys, &mut stats),
        MergeMode::UpdateExisting => update_existing(&mut packages, parsed, keys, &mut stats),
    }

    info!(
        added = stats.bots_added,
        updated = stats.bots_updated,
        skipped = stats.bots_skipped,
        "merged catalog"
    );
    root.insert("packages".into(), Value::Array(packages));
    (Value::Object(root), stats)
}

/// Append unmatched packages, categories and bots; update matched bots.
fn add_or_update(packages: &mut Vec<Value>, parsed: &Catalog, keys: &OutputKeys, stats: &mut MergeStats) {
    let mut next_id = packages.iter().filter_map(package_id).max().unwrap_or(0) + 1;
    for package in &parsed.packages {
        let name = normalize_name(&package.name);
        let idx = match find_by(packages, "package", &name, normalize_name) {
            Some(i) => {
                stats.packages_reused += 1;
                i
            }
            None => {
                packages.push(json!({
                    "package": package.name,
                    "packageId": next_id,
                    "categories": [],
                }));
                debug!(package = %package.name, id = next_id, "new package");
                next_id += 1;
                stats.packages_added += 1;
                packages.len() - 1
            }
        };
        if package_id(&packages[idx]).is_none() {
            packages[idx]["packageId"] = json!(next_id);
            next_id += 1;
        }
        let Some(entry) = packages[idx].as_object_mut() else {
            continue;
        };
        let categories = array_field(entry, "categories");

        for category in &package.categories {
            let name = normalize_name(&category.name);
            let cat_idx = match find_by(categories, "category", &name, normalize_name) {
                Some(i) => i,
                None => {
                    categories.push(json!({ "category": category.name, "bots": [] }));
                    stats.categories_added += 1;
                    categories.len() - 1
                }
            };
            let Some(cat_entry) = categories[cat_idx].as_object_mut() else {
                continue;
            };
            let bots = array_field(cat_entry, "bots");

            for bot in &category.bots {
                let fresh = bot.to_json(keys);
                match find_by(bots, "botTitle", &normalize_title(&bot.title), normalize_title) {
                    Some(i) => {
                        if let (Some(target), Value::Object(source)) = (bots[i].as_object_mut(), &fresh) {
                            overwrite_non_empty(target, source);
                            stats.bots_updated += 1;
                        }
                    }
                    None => {
                        bots.push(fresh);
                        stats.bots_added += 1;
                    }
                }
            }
        }
    }
}

/// Update bots already in the catalog. A bot is looked up under its own
/// package and category first, then by title anywhere in the catalog.
fn update_existing(packages: &mut [Value], parsed: &Catalog, keys: &OutputKeys, stats: &mut MergeStats) {
    for package in &parsed.packages {
        let package_name = normalize_name(&package.name);
        if find_by(packages, "package", &package_name, normalize_name).is_some() {
            stats.packages_reused += 1;
        }
        for category in &package.categories {
            let category_name = normalize_name(&category.name);
            for bot in &category.bots {
                let title = normalize_title(&bot.title);
                let slot = locate_bot(packages, Some((&package_name, &category_name)), &title)
                    .or_else(|| locate_bot(packages, None, &title));
                let Some((p, c, b)) = slot else {
                    debug!(bot = %bot.title, "not in catalog, skipped");
                    stats.bots_skipped += 1;
                    continue;
                };
                if let (Some(target), Value::Object(source)) = (
                    packages[p]["categories"][c]["bots"][b].as_object_mut(),
                    &bot.to_json(keys),
                ) {
                    overwrite_non_empty(target, source);
                    stats.bots_updated += 1;
                }
            }
        }
    }
}

/// `(package, category, bot)` indices of the first bot titled `title`,
/// optionally restricted to a normalized package/category path.
fn locate_bot(packages: &[Value], path: Option<(&str, &str)>, title: &str) -> Option<(usize, usize, usize)> {
    let named = |item: &Value, field: &str, want: Option<&str>| {
        want.map_or(true, |want| {
            item.get(field)
                .and_then(Value::as_str)
                .is_some_and(|s| normalize_name(s) == want)
        })
    };
    packages
        .iter()
        .enumerate()
        .filter(|(_, p)| named(*p, "package", path.map(|(pkg, _)| pkg)))
        .flat_map(|(pi, p)| {
            items(p, "categories")
                .enumerate()
                .filter(move |(_, c)| named(*c, "category", path.map(|(_, cat)| cat)))
                .flat_map(move |(ci, c)| {
                    items(c, "bots")
                        .enumerate()
                        .filter(move |(_, b)| {
                            b.get("botTitle")
                                .and_then(Value::as_str)
                                .is_some_and(|t| normalize_title(t) == title)
                        })
                        .map(move |(bi, _)| (pi, ci, bi))
                })
        })
        .next()
}

fn items<'v>(value: &'v Value, key: &str) -> impl Iterator<Item = &'v Value> {
    value.get(key).and_then(Value::as_array).into_iter().flatten()
}

fn package_id(package: &Value) -> Option<i64> {
    package.get("packageId").and_then(Value::as_i64)
}

fn normalize_title(title: &str) -> String {
    normalize_name(normalize_name(title).trim_start_matches(['#', '@']))
}

fn find_by(items: &[Value], field: &str, key: &str, normalize: fn(&str) -> String) -> Option<usize> {
    items.iter().position(|item| {
        item.get(field)
            .and_then(Value::as_str)
            .is_some_and(|s| normalize(s) == key)
    })
}

/// The array stored under `key`, replacing a missing or non-array value.
fn array_field<'m>(map: &'m mut Map<String, Value>, key: &str) -> &'m mut Vec<Value> {
    let slot = map.entry(key).or_insert(Value::Null);
    if !slot.is_array() {
        *slot = Value::Array(Vec::new());
    }
    match slot {
        Value::Array(items) => items,
        _ => unreachable!("slot replaced with an array above"),
    }
}

fn overwrite_non_empty(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, value) in source {
        let present = match value {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::String(s) => !s.trim().is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Object(map) => !map.is_empty(),
            Value::Number(_) => true,
        };
        if present {
            target.insert(key.clone(), value.clone());
        }
    }
}
