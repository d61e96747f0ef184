//! Core data types for parsed notes

use crate::error::{ParserError, ParserResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Half-open byte range `[start, end)` into a note body.
///
/// Offsets always sit on UTF-8 character boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start after end");
        Self { start, end }
    }

    /// Zero-length span at `offset`
    pub fn point(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether the two ranges share at least one position.
    ///
    /// A zero-length span at `p` intersects every span strictly containing `p`.
    pub fn intersects(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Slice `text` by this span
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }
}

/// Frontmatter format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrontmatterFormat {
    /// YAML frontmatter (---)
    Yaml,
    /// TOML frontmatter (+++)
    Toml,
}

impl FrontmatterFormat {
    /// Delimiter line for this format
    pub fn delimiter(&self) -> &'static str {
        match self {
            Self::Yaml => "---",
            Self::Toml => "+++",
        }
    }

    pub(crate) fn from_delimiter(line: &str) -> Option<Self> {
        match line.trim_end() {
            "---" => Some(Self::Yaml),
            "+++" => Some(Self::Toml),
            _ => None,
        }
    }
}

/// Keys accepted as the alias list, in lookup order
pub const ALIAS_KEYS: [&str; 3] = ["aliases", "alias", "aka"];

/// Frontmatter metadata block
///
/// Keeps the original block text so an untouched header is written back
/// byte-for-byte. Properties are parsed eagerly; a block that fails to parse
/// is kept verbatim and refuses modification.
#[derive(Debug, Clone, PartialEq)]
pub struct Frontmatter {
    /// Raw frontmatter content (without delimiters)
    pub raw: String,

    /// Frontmatter format
    pub format: FrontmatterFormat,

    /// Original block including delimiter lines
    block: String,

    properties: Map<String, Value>,

    parse_error: Option<String>,

    dirty: bool,
}

impl Frontmatter {
    /// Parse a frontmatter block.
    ///
    /// `raw` is the content between the delimiters, `block` the full
    /// original text including both delimiter lines.
    pub fn parse(raw: impl Into<String>, block: impl Into<String>, format: FrontmatterFormat) -> Self {
        let raw = raw.into();
        let (properties, parse_error) = match parse_properties(&raw, format) {
            Ok(props) => (props, None),
            Err(e) => (Map::new(), Some(e.to_string())),
        };

        Self {
            raw,
            format,
            block: block.into(),
            properties,
            parse_error,
            dirty: false,
        }
    }

    /// Empty YAML frontmatter for notes that had none
    pub fn empty_yaml() -> Self {
        Self {
            raw: String::new(),
            format: FrontmatterFormat::Yaml,
            block: String::new(),
            properties: Map::new(),
            parse_error: None,
            dirty: false,
        }
    }

    /// Parsed properties in source order
    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    /// Parse failure message, if the block was not valid YAML/TOML
    pub fn parse_error(&self) -> Option<&str> {
        self.parse_error.as_deref()
    }

    pub fn is_valid(&self) -> bool {
        self.parse_error.is_none()
    }

    /// The parse failure as an error, for callers that report it
    pub fn check(&self) -> ParserResult<()> {
        match &self.parse_error {
            Some(msg) => Err(ParserError::frontmatter(msg.clone())),
            None => Ok(()),
        }
    }

    /// Whether properties changed since parsing
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Get a scalar property rendered as a string.
    ///
    /// Numbers and booleans are stringified so numeric ids
    /// (`id: 20230501120000`) come back as text.
    pub fn get_string(&self, key: &str) -> Option<String> {
        match self.properties.get(key)? {
            Value::String(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Get an array property; a single string is treated as a one-element list
    pub fn get_array(&self, key: &str) -> Option<Vec<String>> {
        match self.properties.get(key)? {
            Value::Array(items) => Some(
                items
                    .iter()
                    .filter_map(|v| match v {
                        Value::String(s) => Some(s.trim().to_string()),
                        Value::Number(n) => Some(n.to_string()),
                        _ => None,
                    })
                    .filter(|s| !s.is_empty())
                    .collect(),
            ),
            Value::String(s) if !s.trim().is_empty() => Some(vec![s.trim().to_string()]),
            _ => None,
        }
    }

    /// Get a boolean property
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.properties.get(key)?.as_bool()
    }

    /// Check if a property exists
    pub fn has(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// Aliases from `aliases`, `alias` or `aka`, deduplicated, first occurrence wins
    pub fn aliases(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for key in ALIAS_KEYS {
            for alias in self.get_array(key).unwrap_or_default() {
                if !out.contains(&alias) {
                    out.push(alias);
                }
            }
        }
        out
    }

    /// Replace the alias list.
    ///
    /// Writes to whichever alias key the note already uses, `aliases` otherwise,
    /// and drops the other alias keys.
    pub fn set_aliases(&mut self, aliases: &[String]) -> ParserResult<()> {
        if let Some(err) = &self.parse_error {
            return Err(ParserError::frontmatter(format!(
                "refusing to modify unparseable frontmatter: {err}"
            )));
        }

        let key = ALIAS_KEYS
            .iter()
            .find(|k| self.properties.contains_key(**k))
            .copied()
            .unwrap_or("aliases");

        // Fold the other alias spellings into the kept key
        for other in ALIAS_KEYS.iter().filter(|k| **k != key) {
            self.properties.shift_remove(*other);
        }

        let value = Value::Array(aliases.iter().cloned().map(Value::String).collect());
        self.properties.insert(key.to_string(), value);
        self.dirty = true;
        Ok(())
    }

    /// Render the block including delimiters.
    ///
    /// Returns the original text when nothing changed.
    pub fn render(&self) -> ParserResult<String> {
        if !self.dirty {
            return Ok(self.block.clone());
        }

        let body = match self.format {
            FrontmatterFormat::Yaml => {
                serde_yaml::to_string(&self.properties).map_err(|e| ParserError::render(e.to_string()))?
            }
            FrontmatterFormat::Toml => {
                toml::to_string(&self.properties).map_err(|e| ParserError::render(e.to_string()))?
            }
        };

        let delimiter = self.format.delimiter();
        let mut out = String::with_capacity(body.len() + 8);
        out.push_str(delimiter);
        out.push('\n');
        out.push_str(&body);
        if !body.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(delimiter);
        out.push('\n');
        Ok(out)
    }
}

fn parse_properties(raw: &str, format: FrontmatterFormat) -> ParserResult<Map<String, Value>> {
    let value = match format {
        FrontmatterFormat::Yaml => {
            if raw.trim().is_empty() {
                return Ok(Map::new());
            }
            serde_yaml::from_str::<Value>(raw).map_err(|e| ParserError::frontmatter(e.to_string()))?
        }
        FrontmatterFormat::Toml => {
            let table: toml::Table =
                toml::from_str(raw).map_err(|e| ParserError::frontmatter(e.to_string()))?;
            serde_json::to_value(table).map_err(|e| ParserError::frontmatter(e.to_string()))?
        }
    };

    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(ParserError::frontmatter(format!(
            "frontmatter must be a mapping, found {}",
            value_kind(&other)
        ))),
    }
}

/// Human name of a property value's type
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

/// Wikilink reference [[target|alias]]
///
/// Represents a link to another note in the vault.
/// Supports both simple [[target]] and aliased [[target|alias]] forms,
/// heading/block references and embeds ![[target]].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Wikilink {
    /// Target note name or id (without .md extension)
    pub target: String,

    /// Optional display alias
    pub alias: Option<String>,

    /// Byte range of the whole construct, including `!` for embeds
    pub span: Span,

    /// Whether this is an embed (![[note]])
    pub is_embed: bool,

    /// Block reference (#^block-id)
    pub block_ref: Option<String>,

    /// Heading reference (#heading)
    pub heading_ref: Option<String>,
}

impl Wikilink {
    /// Get the display text (alias or target)
    pub fn display(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.target)
    }

    /// Parse a wikilink from its inner text (e.g., "Note#heading|Alias")
    pub fn parse(text: &str, span: Span, is_embed: bool) -> Self {
        let (target_part, alias) = match text.split_once('|') {
            Some((t, a)) => (t, Some(a.trim().to_string())),
            None => (text, None),
        };

        let (target, heading_ref, block_ref) = match target_part.split_once('#') {
            Some((t, ref_part)) => match ref_part.strip_prefix('^') {
                Some(block) => (t, None, Some(block.to_string())),
                None => (t, Some(ref_part.to_string()), None),
            },
            None => (target_part, None, None),
        };

        Self {
            target: target.trim().to_string(),
            alias,
            span,
            is_embed,
            block_ref,
            heading_ref,
        }
    }

    /// Whether `name` can be written as a link target. `#`, `^` and `|`
    /// would be read back as heading, block or alias separators.
    pub fn can_target(name: &str) -> bool {
        !name.trim().is_empty() && !name.contains(['#', '^', '|', '[', ']'])
    }

    /// Whether `text` can be written as link display text
    pub fn can_display(text: &str) -> bool {
        !text.trim().is_empty() && !text.contains('|') && !text.contains("]]") && !text.contains("[[")
    }

    /// Markup for a link to `target`, with `display` as alias when it differs
    pub fn markup(target: &str, display: &str) -> String {
        if target == display {
            format!("[[{target}]]")
        } else {
            format!("[[{target}|{display}]]")
        }
    }
}

/// Regular markdown link `[text](url)` or image `![alt](url)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineLink {
    pub text: String,
    pub url: String,
    pub span: Span,
    pub is_image: bool,
}

/// Link reference definition line `[key|alias]: target "title"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceDefinition {
    pub key: String,
    pub alias: Option<String>,
    pub target: String,
    pub title: Option<String>,
    /// The whole line, without its line terminator
    pub span: Span,
    /// 1-based line number
    pub line: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wikilink_parse_forms() {
        let link = Wikilink::parse("Note#Section|Shown", Span::new(0, 22), false);
        assert_eq!(link.target, "Note");
        assert_eq!(link.heading_ref.as_deref(), Some("Section"));
        assert_eq!(link.display(), "Shown");

        let block = Wikilink::parse("Note#^abc123", Span::new(0, 16), true);
        assert_eq!(block.block_ref.as_deref(), Some("abc123"));
        assert!(block.is_embed);
        assert_eq!(block.display(), "Note");
    }

    #[test]
    fn test_reserved_characters_in_markup() {
        for name in ["C#", "Note^1", "a|b", "[x]"] {
            assert!(!Wikilink::can_target(name), "{name}");
        }
        assert!(Wikilink::can_target("C++"));
        assert!(Wikilink::can_target("b/Kubernetes"));

        assert!(Wikilink::can_display("C#"));
        assert!(!Wikilink::can_display("a|b"));
        assert!(!Wikilink::can_display("x]]y"));

        // A permitted pair reads back unchanged
        let markup = Wikilink::markup("Languages", "C#");
        let inner = &markup[2..markup.len() - 2];
        let link = Wikilink::parse(inner, Span::new(0, markup.len()), false);
        assert_eq!(link.target, "Languages");
        assert_eq!(link.display(), "C#");
        assert_eq!(link.heading_ref, None);
    }

    #[test]
    fn test_wikilink_markup_omits_redundant_alias() {
        assert_eq!(Wikilink::markup("20230101120000", "SSO"), "[[20230101120000|SSO]]");
        assert_eq!(Wikilink::markup("Note", "Note"), "[[Note]]");
    }

    #[test]
    fn test_span_intersection_rules() {
        let zone = Span::new(5, 10);
        assert!(Span::new(8, 12).intersects(&zone));
        assert!(!Span::new(10, 12).intersects(&zone));
        assert!(!Span::new(0, 5).intersects(&zone));

        let point = Span::point(6);
        assert!(Span::new(4, 8).intersects(&point));
        assert!(!Span::new(6, 8).intersects(&point));
    }

    #[test]
    fn test_numeric_id_read_as_string() {
        let fm = Frontmatter::parse("id: 20230501120000\n", "", FrontmatterFormat::Yaml);
        assert_eq!(fm.get_string("id").as_deref(), Some("20230501120000"));
    }

    #[test]
    fn test_alias_key_variants_normalized() {
        let fm = Frontmatter::parse(
            "alias: SSO\naka: [Single Sign On, SSO]\n",
            "",
            FrontmatterFormat::Yaml,
        );
        assert_eq!(fm.aliases(), vec!["SSO".to_string(), "Single Sign On".to_string()]);
    }

    #[test]
    fn test_set_aliases_keeps_existing_key_and_order() {
        let raw = "title: Login\nalias: [SSO]\ntags: [auth]\n";
        let block = format!("---\n{raw}---\n");
        let mut fm = Frontmatter::parse(raw, block, FrontmatterFormat::Yaml);
        fm.set_aliases(&["SSO".to_string(), "シングルサインオン".to_string()])
            .unwrap();

        let rendered = fm.render().unwrap();
        assert!(rendered.starts_with("---\ntitle: Login\nalias:\n"));
        assert!(rendered.contains("- シングルサインオン"));
        assert!(rendered.trim_end().ends_with("---"));
        assert!(!rendered.contains("aliases"));
    }

    #[test]
    fn test_invalid_frontmatter_refuses_modification() {
        let mut fm = Frontmatter::parse("title: [unclosed", "---\ntitle: [unclosed\n---\n", FrontmatterFormat::Yaml);
        assert!(!fm.is_valid());
        assert!(fm.set_aliases(&["x".to_string()]).is_err());
        assert_eq!(fm.render().unwrap(), "---\ntitle: [unclosed\n---\n");
    }

    #[test]
    fn test_toml_frontmatter_properties() {
        let fm = Frontmatter::parse(
            "title = \"Rust\"\naliases = [\"rustlang\"]\n",
            "",
            FrontmatterFormat::Toml,
        );
        assert_eq!(fm.get_string("title").as_deref(), Some("Rust"));
        assert_eq!(fm.aliases(), vec!["rustlang".to_string()]);
    }
}
