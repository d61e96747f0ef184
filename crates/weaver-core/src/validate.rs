//! Frontmatter validation
//!
//! Checks note headers for the problems that make the linker skip or
//! misread a note: blocks that do not parse, blocks that never close,
//! required keys that are absent, and alias or title values of the wrong
//! shape.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use weaver_parser::{
    locate_frontmatter, value_kind, FrontmatterBounds, NoteFile, ParserError, ALIAS_KEYS,
};

/// Keys whose value must be a single scalar
const SCALAR_KEYS: [&str; 2] = ["id", "title"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HeaderProblem {
    /// The file could not be read at all
    Unreadable { message: String },
    /// The header block is not valid YAML or TOML
    Unparseable { message: String },
    /// Opening delimiter with no closing one
    UnterminatedHeader,
    /// No header, but keys are required
    MissingHeader,
    MissingField { key: String },
    MalformedField { key: String, found: String },
    DuplicateAlias { alias: String },
}

impl HeaderProblem {
    pub fn severity(&self) -> IssueSeverity {
        match self {
            Self::Unreadable { .. }
            | Self::Unparseable { .. }
            | Self::UnterminatedHeader
            | Self::MalformedField { .. } => IssueSeverity::Error,
            Self::MissingHeader | Self::MissingField { .. } | Self::DuplicateAlias { .. } => {
                IssueSeverity::Warning
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Unreadable { message } => format!("unreadable: {message}"),
            Self::Unparseable { message } => format!("header does not parse: {message}"),
            Self::UnterminatedHeader => "header is never closed".to_string(),
            Self::MissingHeader => "no frontmatter".to_string(),
            Self::MissingField { key } => format!("missing `{key}`"),
            Self::MalformedField { key, found } => format!("`{key}` has the wrong type ({found})"),
            Self::DuplicateAlias { alias } => format!("alias \"{alias}\" listed more than once"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderIssue {
    pub path: PathBuf,
    pub severity: IssueSeverity,
    pub problem: HeaderProblem,
}

impl HeaderIssue {
    pub fn new(path: impl Into<PathBuf>, problem: HeaderProblem) -> Self {
        Self {
            path: path.into(),
            severity: problem.severity(),
            problem,
        }
    }

    /// Issue for a note that failed to load
    pub fn from_error(path: impl Into<PathBuf>, err: &ParserError) -> Self {
        let message = err.to_string();
        let problem = if err.is_recoverable() {
            HeaderProblem::Unparseable { message }
        } else {
            HeaderProblem::Unreadable { message }
        };
        Self::new(path, problem)
    }
}

/// Check one note's header. `required` keys must be present and non-empty.
pub fn validate_note(note: &NoteFile, required: &[String]) -> Vec<HeaderIssue> {
    let path = note.path.as_path();
    let issue = |problem| HeaderIssue::new(path, problem);

    let Some(fm) = &note.frontmatter else {
        if let FrontmatterBounds::Unterminated { .. } = locate_frontmatter(&note.body) {
            return vec![issue(HeaderProblem::UnterminatedHeader)];
        }
        if required.is_empty() {
            return Vec::new();
        }
        return vec![issue(HeaderProblem::MissingHeader)];
    };

    if let Err(err) = fm.check() {
        return vec![issue(HeaderProblem::Unparseable {
            message: err.to_string(),
        })];
    }

    let props = fm.properties();
    let mut issues = Vec::new();

    for key in required {
        if props.get(key).map_or(true, is_blank) {
            issues.push(issue(HeaderProblem::MissingField { key: key.clone() }));
        }
    }

    for key in SCALAR_KEYS {
        if let Some(value) = props.get(key) {
            if !matches!(value, Value::Null | Value::String(_) | Value::Number(_)) {
                issues.push(issue(HeaderProblem::MalformedField {
                    key: key.to_string(),
                    found: value_kind(value).to_string(),
                }));
            }
        }
    }

    let mut seen = HashSet::new();
    for key in ALIAS_KEYS {
        let Some(value) = props.get(key) else {
            continue;
        };
        let aliases: Vec<&str> = match value {
            Value::Null => Vec::new(),
            Value::String(s) => vec![s.as_str()],
            Value::Array(items) => match items.iter().find(|v| !v.is_string()) {
                Some(bad) => {
                    issues.push(issue(HeaderProblem::MalformedField {
                        key: key.to_string(),
                        found: format!("sequence containing {}", value_kind(bad)),
                    }));
                    continue;
                }
                None => items.iter().filter_map(Value::as_str).collect(),
            },
            other => {
                issues.push(issue(HeaderProblem::MalformedField {
                    key: key.to_string(),
                    found: value_kind(other).to_string(),
                }));
                continue;
            }
        };
        for alias in aliases {
            let alias = alias.trim();
            if !alias.is_empty() && !seen.insert(alias.to_lowercase()) {
                issues.push(issue(HeaderProblem::DuplicateAlias {
                    alias: alias.to_string(),
                }));
            }
        }
    }

    issues
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Outcome of validating a set of notes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub files_checked: usize,
    pub valid_files: usize,
    pub issues: Vec<HeaderIssue>,
}

impl ValidationReport {
    /// Collect issues from per-file load results, in the order given
    pub fn build<'a>(
        results: impl IntoIterator<Item = (&'a Path, Result<&'a NoteFile, &'a ParserError>)>,
        required: &[String],
    ) -> Self {
        let mut report = Self::default();
        for (path, result) in results {
            let issues = match result {
                Ok(note) => validate_note(note, required),
                Err(err) => vec![HeaderIssue::from_error(path, err)],
            };
            report.files_checked += 1;
            if issues.is_empty() {
                report.valid_files += 1;
            }
            report.issues.extend(issues);
        }
        report
    }

    pub fn errors(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Error)
            .count()
    }

    pub fn warnings(&self) -> usize {
        self.issues.len() - self.errors()
    }

    /// Files with at least one issue
    pub fn invalid_files(&self) -> usize {
        self.files_checked - self.valid_files
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn problems(content: &str, required: &[&str]) -> Vec<HeaderProblem> {
        let note = NoteFile::parse("n.md", content);
        let required: Vec<String> = required.iter().map(|s| s.to_string()).collect();
        validate_note(&note, &required)
            .into_iter()
            .map(|i| i.problem)
            .collect()
    }

    #[test]
    fn test_clean_header() {
        let content = "---\nid: 20240101\ntitle: Rust\naliases: [rustlang]\n---\nBody\n";
        assert!(problems(content, &["id", "title"]).is_empty());
    }

    #[test]
    fn test_unparseable_header() {
        let found = problems("---\ntitle: [broken\n---\nBody\n", &[]);
        assert!(matches!(found.as_slice(), [HeaderProblem::Unparseable { .. }]));
    }

    #[test]
    fn test_unterminated_header() {
        let found = problems("---\ntitle: Rust\nBody with no close\n", &["title"]);
        assert_eq!(found, vec![HeaderProblem::UnterminatedHeader]);
    }

    #[test]
    fn test_missing_header_only_matters_with_required_keys() {
        assert!(problems("Just text\n", &[]).is_empty());
        assert_eq!(problems("Just text\n", &["title"]), vec![HeaderProblem::MissingHeader]);
    }

    #[test]
    fn test_missing_and_blank_fields() {
        let found = problems("---\ntitle: '  '\n---\n", &["id", "title"]);
        assert_eq!(
            found,
            vec![
                HeaderProblem::MissingField { key: "id".into() },
                HeaderProblem::MissingField { key: "title".into() },
            ]
        );
    }

    #[test]
    fn test_malformed_alias_and_title() {
        let found = problems("---\ntitle: [a, b]\naliases: {x: 1}\naka: [ok, 3]\n---\n", &[]);
        assert_eq!(
            found,
            vec![
                HeaderProblem::MalformedField {
                    key: "title".into(),
                    found: "sequence".into()
                },
                HeaderProblem::MalformedField {
                    key: "aliases".into(),
                    found: "mapping".into()
                },
                HeaderProblem::MalformedField {
                    key: "aka".into(),
                    found: "sequence containing number".into()
                },
            ]
        );
    }

    #[test]
    fn test_duplicate_alias_across_keys() {
        let found = problems("---\naliases: [SSO, Login]\nalias: sso\n---\n", &[]);
        assert_eq!(found, vec![HeaderProblem::DuplicateAlias { alias: "sso".into() }]);
    }

    #[test]
    fn test_toml_header() {
        let found = problems("+++\ntitle = \"Rust\"\naliases = 5\n+++\n", &["title"]);
        assert_eq!(
            found,
            vec![HeaderProblem::MalformedField {
                key: "aliases".into(),
                found: "number".into()
            }]
        );
    }

    #[test]
    fn test_load_errors_map_to_severity() {
        let issue = HeaderIssue::from_error("big.md", &ParserError::FileTooLarge { size: 10, max: 5 });
        assert!(matches!(issue.problem, HeaderProblem::Unreadable { .. }));
        assert_eq!(issue.severity, IssueSeverity::Error);

        let issue = HeaderIssue::from_error("bad.md", &ParserError::frontmatter("nope"));
        assert!(matches!(issue.problem, HeaderProblem::Unparseable { .. }));
    }

    #[test]
    fn test_report_counts() {
        let good = NoteFile::parse("good.md", "---\ntitle: A\n---\n");
        let bad = NoteFile::parse("bad.md", "---\naliases: 3\n---\n");
        let missing = NoteFile::parse("plain.md", "text");
        let err = ParserError::EncodingError;
        let results = vec![
            (good.path.as_path(), Ok(&good)),
            (bad.path.as_path(), Ok(&bad)),
            (missing.path.as_path(), Ok(&missing)),
            (Path::new("latin1.md"), Err(&err)),
        ];
        let report = ValidationReport::build(results, &["title".to_string()]);
        assert_eq!(report.files_checked, 4);
        assert_eq!(report.valid_files, 1);
        assert_eq!(report.invalid_files(), 3);
        // aliases malformed, title missing, no header, unreadable
        assert_eq!(report.errors(), 2);
        assert_eq!(report.warnings(), 2);
    }
}
