use tracing::debug;

use super::labels::{Field, LabelKind, Labels};
use super::lines::{classify_line, is_decoration, normalize_name, Line};
use super::ParseError;
use crate::catalog::normalize::{extract_urls, normalize_model_key, url_start, BotDraft};
use crate::catalog::{Catalog, Category, Package};

/// Where the next content line goes.
#[derive(Debug, Clone, PartialEq, Eq)]
enum FieldState {
    Idle,
    Text(Field),
    Links,
    /// The next content line is the URL for this model key.
    PendingModel(String),
}

/// Bot under construction plus the category it will be filed under.
#[derive(Debug)]
struct OpenBot {
    package: usize,
    category: usize,
    draft: BotDraft,
}

/// Counters for input that was tolerated rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub lines: usize,
    pub bot_headers: usize,
    /// `@` markers seen while no bot was open.
    pub orphan_markers: usize,
    /// `@` markers whose label matched nothing.
    pub unknown_labels: usize,
    /// Model or link values that were not valid absolute URLs.
    pub dropped_urls: usize,
    /// Content lines with nowhere to go.
    pub discarded_lines: usize,
    /// Separator and punctuation-only lines.
    pub decoration_lines: usize,
}

impl ParseStats {
    pub fn print(&self) {
        println!(
            "Lines: {} ({} separators skipped, {} discarded)",
            self.lines, self.decoration_lines, self.discarded_lines
        );
        println!(
            "Markers: {} bot headers, {} orphan, {} unknown labels; {} invalid URLs dropped",
            self.bot_headers, self.orphan_markers, self.unknown_labels, self.dropped_urls
        );
    }
}

/// Single-pass line classifier. Holds indices into its own package vector
/// instead of references, so every boundary simply resets the cursor.
pub struct Classifier<'a> {
    labels: &'a Labels,
    packages: Vec<Package>,
    current_package: Option<usize>,
    current_category: Option<usize>,
    open_bot: Option<OpenBot>,
    state: FieldState,
    stats: ParseStats,
}

impl<'a> Classifier<'a> {
    pub fn new(labels: &'a Labels) -> Self {
        Classifier {
            labels,
            packages: Vec::new(),
            current_package: None,
            current_category: None,
            open_bot: None,
            state: FieldState::Idle,
            stats: ParseStats::default(),
        }
    }

    /// Feed one normalized line. `line_no` is only used for error reporting.
    pub fn feed(&mut self, line_no: usize, line: &str) -> Result<(), ParseError> {
        self.stats.lines += 1;
        match classify_line(line, self.labels) {
            Line::Package(name) => {
                self.flush();
                self.current_package = Some(self.package_index(&name));
                self.current_category = None;
            }
            Line::Category(name) => {
                let package = self.current_package.ok_or_else(|| ParseError::MissingMainTitle {
                    marker: "sub-title",
                    line_no,
                    text: line.to_string(),
                })?;
                self.flush();
                self.current_category = Some(self.category_index(package, &name));
            }
            Line::Bot(title) => {
                let package = self.current_package.ok_or_else(|| ParseError::MissingMainTitle {
                    marker: "bot title",
                    line_no,
                    text: line.to_string(),
                })?;
                self.flush();
                let category = match self.current_category {
                    Some(c) => c,
                    None => {
                        let c = self.category_index(package, "");
                        self.current_category = Some(c);
                        c
                    }
                };
                self.stats.bot_headers += 1;
                self.open_bot = Some(OpenBot {
                    package,
                    category,
                    draft: BotDraft::new(title),
                });
            }
            Line::Marker { label, rest } => self.marker(&label, &rest),
            Line::Content(text) => self.content(&text),
            Line::Literal(text) => self.route(&text),
        }
        Ok(())
    }

    fn marker(&mut self, label: &str, rest: &str) {
        let Some(open) = self.open_bot.as_mut() else {
            debug!(label, "marker outside of a bot ignored");
            self.stats.orphan_markers += 1;
            return;
        };

        self.state = match self.labels.classify_label(label) {
            LabelKind::Field(field) => {
                if !rest.is_empty() {
                    open.draft.push_text(field, rest);
                }
                FieldState::Text(field)
            }
            LabelKind::Links => {
                for url in extract_urls(rest) {
                    open.draft.push_link(url);
                }
                FieldState::Links
            }
            LabelKind::Model(attached) => {
                let urls = extract_urls(rest);
                let name = url_start(rest).map_or(rest, |pos| &rest[..pos]);
                let key = normalize_model_key(&format!(
                    "{attached}{}",
                    name.trim().trim_end_matches([':', '：'])
                ));
                match urls.into_iter().next() {
                    Some(url) => {
                        open.draft.set_model(&key, &url);
                        FieldState::Idle
                    }
                    None => FieldState::PendingModel(key),
                }
            }
            LabelKind::Unknown => {
                debug!(label, "unrecognized field label ignored");
                self.stats.unknown_labels += 1;
                FieldState::Idle
            }
        };
    }

    fn content(&mut self, text: &str) {
        if is_decoration(text) {
            self.stats.decoration_lines += 1;
            return;
        }
        self.route(text);
    }

    /// Hand a content line to whatever the open bot is collecting.
    fn route(&mut self, text: &str) {
        let Some(open) = self.open_bot.as_mut() else {
            self.stats.discarded_lines += 1;
            return;
        };

        match std::mem::replace(&mut self.state, FieldState::Idle) {
            FieldState::PendingModel(key) => {
                if !open.draft.set_model(&key, text) {
                    debug!(key = %key, value = text, "model value is not a valid URL");
                    self.stats.dropped_urls += 1;
                }
            }
            FieldState::Links => {
                let urls = extract_urls(text);
                if urls.is_empty() {
                    debug!(value = text, "no URL in links line");
                    self.stats.dropped_urls += 1;
                }
                for url in urls {
                    open.draft.push_link(url);
                }
                self.state = FieldState::Links;
            }
            FieldState::Text(field) => {
                open.draft.push_text(field, text);
                self.state = FieldState::Text(field);
            }
            FieldState::Idle => self.stats.discarded_lines += 1,
        }
    }

    /// Finalize the open bot, if any, into its category. A second call with
    /// nothing open is a no-op.
    pub fn flush(&mut self) {
        self.state = FieldState::Idle;
        if let Some(open) = self.open_bot.take() {
            let bot = open.draft.finalize();
            self.packages[open.package].categories[open.category].bots.push(bot);
        }
    }

    pub fn finish(mut self) -> (Catalog, ParseStats) {
        self.flush();
        (
            Catalog {
                packages: self.packages,
            },
            self.stats,
        )
    }

    fn package_index(&mut self, name: &str) -> usize {
        let name = match normalize_name(name) {
            n if n.is_empty() => self.labels.package_fallback.clone(),
            n => n,
        };
        if let Some(i) = self.packages.iter().position(|p| normalize_name(&p.name) == name) {
            return i;
        }
        self.packages.push(Package {
            name,
            categories: Vec::new(),
        });
        self.packages.len() - 1
    }

    fn category_index(&mut self, package: usize, name: &str) -> usize {
        let name = match normalize_name(name) {
            n if n.is_empty() => self.labels.category_fallback.clone(),
            n => n,
        };
        let categories = &mut self.packages[package].categories;
        if let Some(i) = categories.iter().position(|c| normalize_name(&c.name) == name) {
            return i;
        }
        categories.push(Category {
            name,
            bots: Vec::new(),
        });
        categories.len() - 1
    }
}
