use std::sync::LazyLock;

use regex::Regex;

use super::labels::Labels;

static MARKS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\u{200B}-\u{200F}\u{202A}-\u{202E}\u{2066}-\u{2069}\u{FEFF}]").unwrap()
});
static SPACES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

const QUOTE_CHARS: &[char] = &['"', '\'', '«', '»', '“', '”', '‟', '❝', '❞', '＂', '‘', '’'];

/// Non-ASCII characters that count as decoration on otherwise empty lines.
const EXTRA_PUNCTUATION: &[char] = &[
    '،', '؛', '؟', '«', '»', '“', '”', '‘', '’', '—', '–', '…', '•', 'ـ', '·',
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Package(String),
    Category(String),
    Bot(String),
    Marker { label: String, rest: String },
    Content(String),
    /// `\`-escaped content: taken as text even if it looks like a marker or
    /// a separator.
    Literal(String),
}

/// Prefix that makes the rest of a line plain content.
pub const ESCAPE: char = '\\';

/// Split raw paragraphs on embedded line breaks and normalize each piece,
/// keeping the 1-based paragraph number. Pieces that are empty after
/// normalization are dropped.
pub fn split_paragraphs<S: AsRef<str>>(paragraphs: &[S]) -> Vec<(usize, String)> {
    paragraphs
        .iter()
        .enumerate()
        .flat_map(|(i, p)| {
            p.as_ref()
                .split(['\n', '\r'])
                .map(normalize_line)
                .filter(|l| !l.is_empty())
                .map(move |l| (i + 1, l))
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Strip directional/zero-width marks, surrounding whitespace and quotes.
pub fn normalize_line(raw: &str) -> String {
    let cleaned = MARKS_RE.replace_all(raw, "");
    cleaned
        .trim_matches(|c: char| c.is_whitespace() || QUOTE_CHARS.contains(&c))
        .to_string()
}

/// Normalization used to compare package, category and bot names.
pub fn normalize_name(raw: &str) -> String {
    let line = normalize_line(raw);
    SPACES_RE.replace_all(&line, " ").into_owned()
}

/// Case and diacritic-insensitive form of a marker label: lower-cased,
/// harakat and tatweel removed, alef variants unified, Eastern Arabic digits
/// mapped to ASCII, trailing colons dropped.
pub fn fold_label(raw: &str) -> String {
    let folded: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '\u{064B}'..='\u{065F}' | '\u{0670}' | 'ـ'))
        .map(|c| match c {
            'أ' | 'إ' | 'آ' | 'ٱ' => 'ا',
            _ => ascii_digit(c),
        })
        .flat_map(char::to_lowercase)
        .collect();
    folded.trim_end_matches([':', '：']).trim_end().to_string()
}

/// Map Arabic-Indic and Extended Arabic-Indic digits to ASCII.
fn ascii_digit(c: char) -> char {
    match c {
        '\u{0660}'..='\u{0669}' => char::from(b'0' + (c as u32 - 0x0660) as u8),
        '\u{06F0}'..='\u{06F9}' => char::from(b'0' + (c as u32 - 0x06F0) as u8),
        _ => c,
    }
}

/// Lines made only of whitespace and punctuation (separators, stray bullets).
pub fn is_decoration(line: &str) -> bool {
    line.chars().all(|c| {
        c.is_whitespace() || c.is_ascii_punctuation() || EXTRA_PUNCTUATION.contains(&c)
    })
}

/// Classify one normalized line. An escaped line is always content; markers
/// are then checked in priority order: package, category, bot header, `@`
/// field/model marker.
pub fn classify_line(line: &str, labels: &Labels) -> Line {
    if let Some(text) = line.strip_prefix(ESCAPE) {
        return Line::Literal(text.to_string());
    }
    if let Some(value) = labels.package_value(line) {
        return Line::Package(normalize_line(value));
    }
    if let Some(value) = labels.category_value(line) {
        return Line::Category(normalize_line(value));
    }
    if let Some(title) = line.strip_prefix('#') {
        return Line::Bot(normalize_line(title.trim_start_matches('#')));
    }
    if let Some(body) = line.strip_prefix('@') {
        let (label, rest) = split_marker(body.trim_start_matches('@').trim_start());
        return Line::Marker {
            label: label.to_string(),
            rest: rest.to_string(),
        };
    }
    Line::Content(line.to_string())
}

/// `label[: ]rest` → (label, rest). The label ends at the first whitespace or
/// colon so that URLs in the remainder are left intact.
fn split_marker(body: &str) -> (&str, &str) {
    let end = body
        .find(|c: char| c.is_whitespace() || c == ':' || c == '：')
        .unwrap_or(body.len());
    let rest = body[end..].trim_start_matches(|c: char| c.is_whitespace() || c == ':' || c == '：');
    (&body[..end], rest.trim_end())
}
