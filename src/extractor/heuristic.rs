//! Line-scanning extractor
//!
//! Tuned to the answer shape the fact-find prompt asks for: `key: value`
//! lines and JSON-ish goal objects. Not a general parser; unknown shapes
//! simply yield nothing.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

use super::{ExtractedInfo, Extractor, FieldKind, FieldValue, GoalSection, SectionFields};

lazy_static! {
    static ref ISO_DATE: Regex = Regex::new(r"\d{4}-\d{2}-\d{2}").expect("valid date pattern");
}

/// Closes one entry of a JSON object; ends a goal section scan
const SECTION_TERMINATOR: &str = "},";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Case-insensitive, line-oriented extractor
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicExtractor;

impl HeuristicExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for HeuristicExtractor {
    fn extract(&self, text: &str) -> ExtractedInfo {
        let lowered = text.to_lowercase();
        let mut lines = lowered.lines();
        let mut info = ExtractedInfo::default();

        while let Some(next) = lines.next() {
            let mut line = next;

            if line.contains("name") {
                if let Some((first, last)) = parse_name(line) {
                    info.first_name = Some(first);
                    info.last_name = Some(last);
                }
            }

            if line.contains("email") {
                if let Some(email) = line.split_whitespace().last() {
                    info.email = Some(email.to_string());
                }
            }

            if line.contains("date_of_birth") {
                if let Some(dob) = parse_date_of_birth(line) {
                    info.date_of_birth = Some(dob);
                }
            }

            // A section scan may advance `line`; later sections test the
            // line the scan stopped on.
            for section in GoalSection::ALL {
                if line.contains(section.marker()) {
                    let (fields, last_line) = scan_section(section, line, &mut lines);
                    trace!(section = section.key(), fields = fields.len(), "Scanned goal section");
                    info.sections.insert(section, fields);
                    line = last_line;
                }
            }
        }

        info
    }
}

/// First and last name from the last two tokens after the final colon
fn parse_name(line: &str) -> Option<(String, String)> {
    let value = line.rsplit(':').next()?;
    let tokens: Vec<&str> = value.split_whitespace().collect();
    if tokens.len() < 2 {
        return None;
    }

    let first = strip_name_token(tokens[tokens.len() - 2]);
    let last = strip_name_token(tokens[tokens.len() - 1]);
    if first.is_empty() || last.is_empty() {
        return None;
    }

    Some((first.to_string(), last.to_string()))
}

/// Drops one leading punctuation char, a trailing comma, then one
/// trailing punctuation char: `"ada` -> `ada`, `lovelace",` -> `lovelace`.
/// Any non-alphanumeric, non-space char counts, so curly quotes go too.
fn strip_name_token(token: &str) -> &str {
    let mut token = token;
    if let Some(c) = token.chars().next().filter(|c| is_name_punctuation(*c)) {
        token = &token[c.len_utf8()..];
    }
    token = token.strip_suffix(',').unwrap_or(token);
    if let Some(c) = token.chars().next_back().filter(|c| is_name_punctuation(*c)) {
        token = &token[..token.len() - c.len_utf8()];
    }
    token
}

fn is_name_punctuation(c: char) -> bool {
    !c.is_alphanumeric() && !c.is_whitespace()
}

fn parse_date_of_birth(line: &str) -> Option<NaiveDate> {
    match ISO_DATE.find(line) {
        Some(found) => parse_date(found.as_str()),
        None => line.split_whitespace().last().and_then(parse_date),
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

/// First `YYYY-MM-DD` anywhere in the line
fn find_date(line: &str) -> Option<NaiveDate> {
    ISO_DATE.find(line).and_then(|found| parse_date(found.as_str()))
}

/// Pull lines until one closes the object entry or input runs out.
///
/// Returns the gathered fields and the line the scan stopped on.
fn scan_section<'a, I>(
    section: GoalSection,
    opening: &'a str,
    lines: &mut I,
) -> (SectionFields, &'a str)
where
    I: Iterator<Item = &'a str>,
{
    let mut fields = SectionFields::default();
    let mut line = opening;

    while !line.contains(SECTION_TERMINATOR) {
        let Some(next) = lines.next() else {
            break;
        };
        line = next;

        for &(key, kind) in section.fields() {
            if !line.contains(key) {
                continue;
            }
            if let Some(value) = parse_field(line, key, kind) {
                fields.insert(key, value);
            }
        }
    }

    (fields, line)
}

fn parse_field(line: &str, key: &str, kind: FieldKind) -> Option<FieldValue> {
    match kind {
        FieldKind::Text => {
            let raw = value_after_key(line, key)?;
            let text = raw.trim_end_matches(',').trim().trim_matches('"').trim();
            if text.is_empty() {
                None
            } else {
                Some(FieldValue::Text(text.to_string()))
            }
        }
        FieldKind::Number => {
            let raw = value_after_key(line, key)?;
            let number = raw
                .split(',')
                .next()?
                .trim()
                .trim_end_matches('}')
                .trim()
                .trim_matches('"');
            number.parse::<f64>().ok().map(FieldValue::Number)
        }
        FieldKind::Date => find_date(line).map(FieldValue::Date),
    }
}

/// Text after `key` and its colon, with the key's closing quote skipped
fn value_after_key<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let start = line.find(key)? + key.len();
    let rest = line[start..].trim_start_matches('"').trim_start();
    let rest = rest.strip_prefix(':')?;
    Some(rest.trim())
}
