use serde_yaml::Value;
use tracing::warn;

use crate::quartz::content::model::{
    Coordinates, Document, FieldValue, Frontmatter, FrontmatterStatus,
};

/// Splits a markdown file into its frontmatter and body and parses the
/// frontmatter as YAML.
///
/// A block that is not a YAML mapping is kept verbatim and flagged
/// [`FrontmatterStatus::Malformed`]; its parsed view is empty.
pub fn parse_document(file_name: &str, content: &str) -> Document {
    let Some((header, body)) = split_frontmatter(content) else {
        return Document::loaded(
            file_name,
            FrontmatterStatus::Absent,
            Frontmatter::new(),
            Vec::new(),
            content,
        );
    };

    let (status, frontmatter) = match parse_fields(&header.join("\n")) {
        Some(fields) => (FrontmatterStatus::Present, fields),
        None => {
            warn!(file = file_name, "frontmatter is not a YAML mapping; leaving it untouched");
            (FrontmatterStatus::Malformed, Frontmatter::new())
        }
    };

    Document::loaded(file_name, status, frontmatter, header, body)
}

/// Returns the lines between the `---` delimiters and everything after the
/// closing delimiter. `None` when the content does not open with `---` or the
/// block is never closed.
fn split_frontmatter(content: &str) -> Option<(Vec<String>, &str)> {
    let mut lines = content.split_inclusive('\n');
    let first = lines.next()?;
    if first.trim_start_matches('\u{feff}').trim_end() != "---" {
        return None;
    }

    let mut offset = first.len();
    let mut header = Vec::new();
    for line in lines {
        offset += line.len();
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            return Some((header, &content[offset..]));
        }
        header.push(trimmed.to_string());
    }
    None
}

fn parse_fields(yaml: &str) -> Option<Frontmatter> {
    if yaml.trim().is_empty() {
        return Some(Frontmatter::new());
    }
    let Value::Mapping(mapping) = serde_yaml::from_str::<Value>(yaml).ok()? else {
        return None;
    };

    let mut frontmatter = Frontmatter::new();
    for (key, value) in mapping {
        let Some(key) = scalar_text(&key) else {
            continue;
        };
        frontmatter.set(key, to_field_value(value));
    }
    Some(frontmatter)
}

fn to_field_value(value: Value) -> FieldValue {
    match value {
        Value::Null => FieldValue::Empty,
        Value::Bool(flag) => FieldValue::Flag(flag),
        Value::Sequence(items) => match coordinates(&items) {
            Some(coords) => FieldValue::Coordinates(coords),
            None => FieldValue::List(items.iter().filter_map(scalar_text).collect()),
        },
        other => match scalar_text(&other) {
            Some(text) => FieldValue::Text(text),
            None => FieldValue::Text(
                serde_yaml::to_string(&other)
                    .map(|text| text.trim().to_string())
                    .unwrap_or_default(),
            ),
        },
    }
}

fn coordinates(items: &[Value]) -> Option<Coordinates> {
    match items {
        [Value::Number(lat), Value::Number(lng)] => Some(Coordinates {
            lat: lat.as_f64()?,
            lng: lng.as_f64()?,
        }),
        _ => None,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fields_and_keeps_body() {
        let content = "---\ntitle: Paris\nDate: 2019-06-12\ncoordinates: [48.8566, 2.3522]\ntags:\n  - europe\n---\n![[eiffel.jpg]]\n";
        let doc = parse_document("Paris.md", content);
        assert_eq!(doc.status, FrontmatterStatus::Present);
        assert_eq!(doc.frontmatter.text("title"), Some("Paris"));
        assert_eq!(doc.frontmatter.text("Date"), Some("2019-06-12"));
        assert_eq!(
            doc.frontmatter.get("coordinates"),
            Some(&FieldValue::Coordinates(Coordinates { lat: 48.8566, lng: 2.3522 }))
        );
        assert_eq!(
            doc.frontmatter.get("tags"),
            Some(&FieldValue::List(vec!["europe".to_string()]))
        );
        assert_eq!(doc.body, "![[eiffel.jpg]]\n");
        assert_eq!(doc.render(), content);
    }

    #[test]
    fn empty_value_and_sentinel_are_vacant() {
        let doc = parse_document("Goa.md", "---\ntitle: Goa\nDate:\nTimeline: Invalid date\n---\n");
        assert!(doc.frontmatter.is_vacant("Date"));
        assert!(doc.frontmatter.is_vacant("Timeline"));
        assert!(!doc.frontmatter.is_vacant("title"));
    }

    #[test]
    fn bom_is_tolerated() {
        let doc = parse_document("Goa.md", "\u{feff}---\ntitle: Goa\n---\n");
        assert_eq!(doc.frontmatter.text("title"), Some("Goa"));
    }

    #[test]
    fn missing_block_is_absent() {
        let doc = parse_document("Goa.md", "# Goa\nSun.\n");
        assert_eq!(doc.status, FrontmatterStatus::Absent);
        assert_eq!(doc.body, "# Goa\nSun.\n");
    }

    #[test]
    fn unterminated_block_is_absent() {
        let doc = parse_document("Goa.md", "---\ntitle: Goa\n");
        assert_eq!(doc.status, FrontmatterStatus::Absent);
    }

    #[test]
    fn broken_yaml_is_malformed() {
        let doc = parse_document("Goa.md", "---\ntitle: [unclosed\n---\nbody\n");
        assert_eq!(doc.status, FrontmatterStatus::Malformed);
        assert!(doc.frontmatter.is_empty());
        assert_eq!(doc.render(), "---\ntitle: [unclosed\n---\nbody\n");
    }
}
