//! Header-delimited section tokenizer.
//!
//! Splits a submission body into `(header, content)` sections. A header is a
//! `### Field` line or a `**Field:**` line; content runs to the next header or
//! the end of the body. Bold headers must name a known field. Lines inside
//! fenced code blocks are never headers, so a commands payload that happens
//! to contain `###` stays intact; an unterminated fence ends at the next
//! `###` line naming a known field.

/// Placeholder the issue forms put into optional fields left blank.
const NO_RESPONSE: &str = "_No response_";

/// Canonical submission fields the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Description,
    Category,
    Tags,
    Contact,
    Commands,
    Usage,
    Prerequisites,
    Limitations,
    Checklist,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::Name,
        Field::Description,
        Field::Category,
        Field::Tags,
        Field::Contact,
        Field::Commands,
        Field::Usage,
        Field::Prerequisites,
        Field::Limitations,
        Field::Checklist,
    ];

    /// Normalized header texts that resolve to this field.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Field::Name => &["name", "collection name", "collection title"],
            Field::Description => &["description", "collection description", "summary"],
            Field::Category => &["category", "collection category"],
            Field::Tags => &["tags", "keywords", "collection tags"],
            Field::Contact => &[
                "contact",
                "github username",
                "your github username",
                "username",
                "author",
            ],
            Field::Commands => &[
                "commands",
                "commands json",
                "command json",
                "commands (json)",
                "collection json",
            ],
            Field::Usage => &["usage", "usage instructions", "how to use"],
            Field::Prerequisites => &["prerequisites", "requirements"],
            Field::Limitations => &["limitations", "known limitations"],
            Field::Checklist => &["checklist", "submission checklist"],
        }
    }

    /// Resolve a free-form header or field name to a canonical field.
    pub fn resolve(name: &str) -> Option<Field> {
        let key = normalize_header(name);
        Field::ALL
            .into_iter()
            .find(|f| f.aliases().contains(&key.as_str()))
    }
}

/// One header and the text under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Normalized header text (lowercase, single-spaced, no trailing colon).
    pub header: String,
    pub content: String,
}

/// Lowercase, collapse whitespace, drop a trailing colon.
pub fn normalize_header(raw: &str) -> String {
    let joined = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    joined.trim_end_matches(':').trim().to_lowercase()
}

/// Recognize a header line, returning the header text and any inline content.
fn header_of(line: &str) -> Option<(String, String)> {
    let trimmed = line.trim();
    if let Some(rest) = trimmed.strip_prefix("###") {
        // `###` exactly, not `####`
        if rest.starts_with(' ') || rest.is_empty() {
            let name = rest.trim();
            if !name.is_empty() {
                return Some((normalize_header(name), String::new()));
            }
        }
        return None;
    }
    // **Field:** inline   or   **Field**: inline
    let rest = trimmed.strip_prefix("**")?;
    let close = rest.find("**")?;
    let inner = &rest[..close];
    let mut after = &rest[close + 2..];
    let labelled = if inner.trim_end().ends_with(':') {
        true
    } else if let Some(stripped) = after.strip_prefix(':') {
        after = stripped;
        true
    } else {
        false
    };
    // Only known fields; `**Note:** ...` inside a description is prose.
    if !labelled || Field::resolve(inner).is_none() {
        return None;
    }
    Some((normalize_header(inner), after.trim().to_string()))
}

/// A `###` line naming a known field. Closes an unterminated fence.
fn closes_fence(line: &str) -> bool {
    line.trim_start().starts_with("###")
        && header_of(line).is_some_and(|(h, _)| Field::resolve(&h).is_some())
}

fn finish(header: String, lines: &[&str], inline: &str) -> Section {
    let mut content = inline.to_string();
    let body = lines.join("\n");
    if !body.trim().is_empty() {
        if !content.is_empty() {
            content.push('\n');
        }
        content.push_str(&body);
    }
    let content = content.trim().to_string();
    let content = if content == NO_RESPONSE {
        String::new()
    } else {
        content
    };
    Section { header, content }
}

/// Split a body into sections in document order. Text before the first
/// header is dropped.
pub fn sections(body: &str) -> Vec<Section> {
    let mut out = Vec::new();
    let mut current: Option<(String, String)> = None;
    let mut lines: Vec<&str> = Vec::new();
    let mut in_fence = false;

    for line in body.lines() {
        let fence_marker = line.trim_start().starts_with("```");
        if in_fence && closes_fence(line) {
            log::debug!("unterminated code fence closed by {:?}", line.trim());
            in_fence = false;
        }
        if !in_fence && let Some((header, inline)) = header_of(line) {
            if let Some((h, i)) = current.take() {
                out.push(finish(h, &lines, &i));
            }
            lines.clear();
            current = Some((header, inline));
            continue;
        }
        if fence_marker {
            in_fence = !in_fence;
        }
        if current.is_some() {
            lines.push(line);
        }
    }
    if let Some((h, i)) = current.take() {
        out.push(finish(h, &lines, &i));
    }
    out
}

/// Content of the first section whose header matches `field_name`, either
/// directly or through the alias table. Empty when absent.
pub fn extract_field(body: &str, field_name: &str) -> String {
    let wanted = normalize_header(field_name);
    let resolved = Field::resolve(&wanted);
    sections(body)
        .into_iter()
        .find(|s| s.header == wanted || (resolved.is_some() && Field::resolve(&s.header) == resolved))
        .map(|s| s.content)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORM: &str = "\
### Collection Name

Reading Tools

### Description

Helpers for long articles.
Second line.

### Tags

_No response_

### Commands JSON

```json
{\"commands\": [{\"name\": \"a\", \"code\": \"// ### not a header\"}]}
```
";

    #[test]
    fn normalize_header_variants() {
        assert_eq!(normalize_header("  Collection   Name: "), "collection name");
        assert_eq!(normalize_header("TAGS"), "tags");
    }

    #[test]
    fn splits_hash_headers() {
        let s = sections(FORM);
        let headers: Vec<&str> = s.iter().map(|s| s.header.as_str()).collect();
        assert_eq!(
            headers,
            vec!["collection name", "description", "tags", "commands json"]
        );
        assert_eq!(s[1].content, "Helpers for long articles.\nSecond line.");
    }

    #[test]
    fn no_response_is_empty() {
        assert_eq!(extract_field(FORM, "tags"), "");
    }

    #[test]
    fn fenced_lines_are_not_headers() {
        let commands = extract_field(FORM, "commands");
        assert!(commands.contains("### not a header"));
        assert!(commands.starts_with("```json"));
    }

    #[test]
    fn bold_headers_with_inline_content() {
        let body = "**Name:** Quick Tools\n**Description**: Small helpers\nmore text\n**Category:** Utilities";
        assert_eq!(extract_field(body, "name"), "Quick Tools");
        assert_eq!(extract_field(body, "description"), "Small helpers\nmore text");
        assert_eq!(extract_field(body, "Category"), "Utilities");
    }

    #[test]
    fn bold_without_colon_is_text() {
        let body = "### Description\n**important** note";
        assert_eq!(extract_field(body, "description"), "**important** note");
    }

    #[test]
    fn bold_unknown_label_is_text() {
        let body = "### Description\n**Note:** prints the page.\n### Category\nUtilities";
        assert_eq!(extract_field(body, "description"), "**Note:** prints the page.");
        assert_eq!(extract_field(body, "category"), "Utilities");
    }

    #[test]
    fn unterminated_fence_ends_at_next_field() {
        let body = "### Usage\n```\nrun it\n\n### Commands JSON\n```json\n[]\n```\n### Tags\nx";
        assert_eq!(extract_field(body, "usage"), "```\nrun it");
        assert_eq!(extract_field(body, "commands"), "```json\n[]\n```");
        assert_eq!(extract_field(body, "tags"), "x");
    }

    #[test]
    fn fenced_unknown_hash_line_stays_in_fence() {
        let body = "### Usage\n```md\n### Step one\n```\n### Tags\nx";
        assert_eq!(extract_field(body, "usage"), "```md\n### Step one\n```");
        assert_eq!(extract_field(body, "tags"), "x");
    }

    #[test]
    fn aliases_resolve() {
        let body = "### GitHub Username\n@Someone";
        assert_eq!(extract_field(body, "contact"), "@Someone");
        assert_eq!(Field::resolve("Known Limitations"), Some(Field::Limitations));
        assert_eq!(Field::resolve("Favorite color"), None);
    }

    #[test]
    fn missing_field_is_empty() {
        assert_eq!(extract_field(FORM, "usage"), "");
        assert_eq!(extract_field("", "name"), "");
    }

    #[test]
    fn four_hashes_are_not_headers() {
        let body = "### Usage\n#### Step one\nclick it";
        assert_eq!(extract_field(body, "usage"), "#### Step one\nclick it");
    }
}
