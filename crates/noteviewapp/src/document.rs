//! # Document Context
//!
//! A [`DocumentContext`] is everything rule matching and template rendering are
//! allowed to know about a note: its file builtins, the frontmatter mapping, its
//! raw outbound links and the tags found in its body. The core never reads files
//! itself; a host (see [`crate::vault::FsVault`]) builds contexts and hands them in.
//!
//! ## Raw Note Format
//!
//! ```text
//! ---               <-- optional YAML frontmatter fence
//! tags: [a, b]
//! ---
//! Body text #tag    <-- everything after the closing fence, trimmed
//! ```
//!
//! Invalid YAML is not an error: the note is treated as having no frontmatter
//! and a warning is logged, mirroring how note apps degrade.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::value::FilterValue;

pub type Frontmatter = Map<String, Value>;

static BODY_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[\s(,])#([\p{L}\p{N}_/\-]+)").expect("tag pattern is valid")
});
static WIKILINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!?\[\[([^\[\]]+?)\]\]").expect("wikilink pattern is valid"));
static MD_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\[[^\]]*\]\(([^)\s]+)(?:\s+"[^"]*")?\)"#).expect("link pattern is valid")
});

/// File builtins exposed as `file.*` fields.
///
/// Timestamps are milliseconds since the Unix epoch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    /// File name with extension (`Movie.md`)
    pub name: String,
    /// File name without extension (`Movie`)
    pub basename: String,
    /// Vault-relative path (`media/Movie.md`)
    pub path: String,
    /// Vault-relative parent folder (`media`), empty at the vault root
    pub folder: String,
    /// Extension without the dot (`md`)
    pub extension: String,
    pub size: u64,
    pub ctime: i64,
    pub mtime: i64,
}

impl FileInfo {
    /// Derives name, basename, folder and extension from a vault-relative path.
    pub fn from_path(path: &str) -> Self {
        let path = path.trim_start_matches('/').replace('\\', "/");
        let (folder, name) = match path.rfind('/') {
            Some(idx) => (path[..idx].to_string(), path[idx + 1..].to_string()),
            None => (String::new(), path.clone()),
        };
        let (basename, extension) = match name.rfind('.') {
            Some(idx) if idx > 0 => (name[..idx].to_string(), name[idx + 1..].to_string()),
            _ => (name.clone(), String::new()),
        };
        Self {
            name,
            basename,
            path,
            folder,
            extension,
            ..Default::default()
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    pub fn with_times(mut self, ctime: i64, mtime: i64) -> Self {
        self.ctime = ctime;
        self.mtime = mtime;
        self
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DocumentContext {
    pub file: FileInfo,
    pub frontmatter: Frontmatter,
    /// Raw outbound link targets as written (`Note`, `dir/Note#Heading`).
    pub links: Vec<String>,
    /// Tags found in the body, as written (may carry a leading `#`).
    pub body_tags: Vec<String>,
    /// Everything after the frontmatter, trimmed.
    pub body: String,
}

impl DocumentContext {
    pub fn new(file: FileInfo) -> Self {
        Self {
            file,
            ..Default::default()
        }
    }

    /// Builds a context from the raw text of a note.
    pub fn parse(file: FileInfo, raw: &str) -> Self {
        let (yaml, body) = split_frontmatter(raw);
        let frontmatter = match yaml {
            Some(yaml) => parse_frontmatter(yaml).unwrap_or_else(|e| {
                warn!(path = %file.path, error = %e, "ignoring invalid frontmatter");
                Frontmatter::new()
            }),
            None => Frontmatter::new(),
        };
        let body = body.trim().to_string();
        Self {
            links: extract_links(&body),
            body_tags: extract_body_tags(&body),
            body,
            frontmatter,
            file,
        }
    }

    pub fn with_frontmatter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.frontmatter.insert(key.into(), value.into());
        self
    }

    pub fn with_body_tag(mut self, tag: impl Into<String>) -> Self {
        self.body_tags.push(tag.into());
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.links.push(link.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Body tags plus frontmatter `tags`, `#` stripped, first occurrence wins.
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        let frontmatter_tags = self
            .frontmatter
            .get("tags")
            .map(frontmatter_tag_list)
            .unwrap_or_default();
        for tag in self.body_tags.iter().chain(frontmatter_tags.iter()) {
            let tag = tag.trim().trim_start_matches('#');
            if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_string());
            }
        }
        tags
    }

    /// Frontmatter `aliases` unioned with the legacy `alias` key.
    pub fn aliases(&self) -> Vec<FilterValue> {
        let mut out = Vec::new();
        for key in ["aliases", "alias"] {
            match self.frontmatter.get(key).map(FilterValue::from_json) {
                Some(FilterValue::List(items)) => out.extend(items),
                Some(FilterValue::Empty) | None => {}
                Some(scalar) => out.push(scalar),
            }
        }
        out
    }

    /// Wikilink targets written anywhere inside frontmatter values.
    pub fn frontmatter_links(&self) -> Vec<String> {
        let mut out = Vec::new();
        for value in self.frontmatter.values() {
            collect_wikilinks(value, &mut out);
        }
        out
    }
}

/// Splits `---` fenced YAML from the rest of the note.
pub fn split_frontmatter(raw: &str) -> (Option<&str>, &str) {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let Some(first_line_end) = raw.find('\n') else {
        return (None, raw);
    };
    if raw[..first_line_end].trim_end() != "---" {
        return (None, raw);
    }
    let yaml_start = first_line_end + 1;
    let mut offset = yaml_start;
    for line in raw[yaml_start..].split_inclusive('\n') {
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            let yaml = &raw[yaml_start..offset];
            let body = &raw[offset + line.len()..];
            return (Some(yaml), body);
        }
        offset += line.len();
    }
    (None, raw)
}

/// Parses a YAML frontmatter block into a string-keyed JSON map.
pub fn parse_frontmatter(yaml: &str) -> Result<Frontmatter, serde_yaml::Error> {
    if yaml.trim().is_empty() {
        return Ok(Frontmatter::new());
    }
    let parsed: serde_yaml::Value = serde_yaml::from_str(yaml)?;
    match yaml_to_json(parsed) {
        Value::Object(map) => Ok(map),
        _ => Ok(Frontmatter::new()),
    }
}

fn yaml_to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => {
            Value::Array(items.into_iter().map(yaml_to_json).collect())
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut map = Map::new();
            for (key, value) in mapping {
                let key = match key {
                    serde_yaml::Value::String(s) => s,
                    other => match yaml_to_json(other) {
                        Value::String(s) => s,
                        v => v.to_string(),
                    },
                };
                map.insert(key, yaml_to_json(value));
            }
            Value::Object(map)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

/// Inline `#tags` outside fenced code blocks. Purely numeric tags are ignored.
pub fn extract_body_tags(body: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    let mut in_fence = false;
    for line in body.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        for cap in BODY_TAG_RE.captures_iter(line) {
            let tag = cap[1].trim_end_matches('/');
            if tag.is_empty() || tag.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }
            let tag = format!("#{}", tag);
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
    }
    tags
}

/// Wikilink targets (`[[target|alias]]` → `target`) in order of appearance.
pub fn extract_wikilinks(text: &str) -> Vec<String> {
    WIKILINK_RE
        .captures_iter(text)
        .filter_map(|cap| {
            let target = cap[1].split('|').next().unwrap_or("").trim();
            (!target.is_empty()).then(|| target.to_string())
        })
        .collect()
}

/// Wikilinks plus relative markdown links; external URLs are skipped.
pub fn extract_links(body: &str) -> Vec<String> {
    let mut links = extract_wikilinks(body);
    for cap in MD_LINK_RE.captures_iter(body) {
        let target = &cap[1];
        if target.contains("://") || target.starts_with('#') || target.starts_with("mailto:") {
            continue;
        }
        let target = target.replace("%20", " ");
        if !links.contains(&target) {
            links.push(target);
        }
    }
    links
}

fn collect_wikilinks(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.extend(extract_wikilinks(s)),
        Value::Array(items) => items.iter().for_each(|v| collect_wikilinks(v, out)),
        _ => {}
    }
}

fn frontmatter_tag_list(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NOTE: &str = "---\ntitle: Dune\ntags: [books, \"#scifi/classic\"]\nauthor: \"[[Frank Herbert]]\"\n---\n\n# Dune\n\nRead with [[Reading List|my list]] and [notes](notes/dune%20notes.md). #review\n";

    #[test]
    fn file_info_from_path() {
        let info = FileInfo::from_path("media/books/Dune.md");
        assert_eq!(info.name, "Dune.md");
        assert_eq!(info.basename, "Dune");
        assert_eq!(info.folder, "media/books");
        assert_eq!(info.extension, "md");

        let root = FileInfo::from_path("Index.md");
        assert_eq!(root.folder, "");
    }

    #[test]
    fn split_frontmatter_finds_fences() {
        let (yaml, body) = split_frontmatter("---\na: 1\n---\nbody");
        assert_eq!(yaml, Some("a: 1\n"));
        assert_eq!(body, "body");
    }

    #[test]
    fn split_frontmatter_without_fence() {
        let (yaml, body) = split_frontmatter("just text\n---\n");
        assert!(yaml.is_none());
        assert_eq!(body, "just text\n---\n");
    }

    #[test]
    fn split_frontmatter_unclosed_is_body() {
        let (yaml, _) = split_frontmatter("---\na: 1\nno end");
        assert!(yaml.is_none());
    }

    #[test]
    fn parse_reads_everything() {
        let doc = DocumentContext::parse(FileInfo::from_path("Dune.md"), NOTE);
        assert_eq!(doc.frontmatter.get("title"), Some(&json!("Dune")));
        assert!(doc.body.starts_with("# Dune"));
        assert_eq!(doc.body_tags, vec!["#review"]);
        assert_eq!(doc.links, vec!["Reading List", "notes/dune notes.md"]);
        assert_eq!(doc.frontmatter_links(), vec!["Frank Herbert"]);
    }

    #[test]
    fn tags_union_strips_hash() {
        let doc = DocumentContext::parse(FileInfo::from_path("Dune.md"), NOTE);
        assert_eq!(doc.tags(), vec!["review", "books", "scifi/classic"]);
    }

    #[test]
    fn invalid_yaml_degrades_to_empty_frontmatter() {
        let doc = DocumentContext::parse(FileInfo::from_path("x.md"), "---\nkey: [unclosed\n---\nbody");
        assert!(doc.frontmatter.is_empty());
        assert_eq!(doc.body, "body");
    }

    #[test]
    fn body_tags_skip_code_and_numbers() {
        let tags = extract_body_tags("#one and #2024\n```\n#hidden\n```\n## Heading\ntext#notatag");
        assert_eq!(tags, vec!["#one"]);
    }

    #[test]
    fn aliases_union_both_keys() {
        let doc = DocumentContext::new(FileInfo::from_path("a.md"))
            .with_frontmatter("aliases", json!(["A1", "A2"]))
            .with_frontmatter("alias", json!("A3"));
        assert_eq!(
            doc.aliases(),
            vec![
                FilterValue::text("A1"),
                FilterValue::text("A2"),
                FilterValue::text("A3")
            ]
        );
    }

    #[test]
    fn frontmatter_tags_as_string() {
        let doc = DocumentContext::new(FileInfo::from_path("a.md"))
            .with_frontmatter("tags", json!("one, two three"));
        assert_eq!(doc.tags(), vec!["one", "two", "three"]);
    }
}
