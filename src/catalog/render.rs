use serde_json::Value;

use super::report::{pick_models, pick_text, with_output_key};
use crate::parser::labels::Labels;
use crate::parser::lines::{is_decoration, normalize_line, ESCAPE};

const SEPARATOR: &str = "________________________________________";

/// Render a JSON catalog back into marker text, one line per paragraph.
/// Synthetic `link-N` models go under the links marker; every other model
/// gets its own model marker followed by its URL. Text lines that would read
/// as markers or separators are escaped with a leading `\`.
pub fn render(root: &Value, labels: &Labels) -> String {
    let main = first(&labels.package_markers, "Main Title");
    let sub = first(&labels.category_markers, "Sub Title");
    let model = first(&labels.model, "model");
    let links = first(&labels.links, "links");
    let fields = [
        (first(&labels.about, "about"), with_output_key(&labels.keys.about, &labels.about)),
        (first(&labels.limits, "limits"), with_output_key(&labels.keys.limits, &labels.limits)),
        (first(&labels.example, "example"), with_output_key(&labels.keys.example, &labels.example)),
    ];
    let model_keys = [labels.keys.models.as_str(), "model", "models", "links"];

    let mut out: Vec<String> = Vec::new();
    for package in array(root, "packages") {
        out.push(format!("{}: {}", main, str_field(package, "package")));
        for category in array(package, "categories") {
            out.push(format!("{}: {}", sub, str_field(category, "category")));
            for bot in array(category, "bots") {
                out.push(format!("#{}", str_field(bot, "botTitle")));
                for (marker, keys) in &fields {
                    let text = pick_text(bot, keys);
                    if !text.is_empty() {
                        out.push(format!("@{}", marker));
                        out.extend(text.lines().map(|line| text_line(line, labels)));
                    }
                }

                let (synthetic, named): (Vec<_>, Vec<_>) = pick_models(bot, &model_keys)
                    .into_iter()
                    .partition(|(k, _)| k.starts_with("link-"));
                for (key, url) in named {
                    out.push(format!("@{} {}", model, key));
                    out.push(url);
                }
                if !synthetic.is_empty() {
                    out.push(format!("@{}", links));
                    out.extend(synthetic.into_iter().map(|(_, url)| url));
                }
                out.push(SEPARATOR.to_string());
            }
        }
    }
    let mut text = out.join("\n");
    text.push('\n');
    text
}

fn text_line(line: &str, labels: &Labels) -> String {
    let normalized = normalize_line(line);
    let structural = normalized.starts_with(['#', '@', ESCAPE])
        || labels.package_value(&normalized).is_some()
        || labels.category_value(&normalized).is_some()
        || (!normalized.is_empty() && is_decoration(&normalized));
    if structural {
        format!("{ESCAPE}{normalized}")
    } else {
        line.to_string()
    }
}

fn first<'a>(items: &'a [String], fallback: &'a str) -> &'a str {
    items.first().map_or(fallback, String::as_str)
}

fn array<'v>(value: &'v Value, key: &str) -> impl Iterator<Item = &'v Value> {
    value.get(key).and_then(Value::as_array).into_iter().flatten()
}

fn str_field<'v>(value: &'v Value, key: &str) -> &'v str {
    value.get(key).and_then(Value::as_str).unwrap_or("")
}
