use super::{FieldValue, Frontmatter};

/// How a loaded document's frontmatter block looked on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontmatterStatus {
    /// A `---` block that parsed as a YAML mapping.
    Present,
    /// No frontmatter block at all.
    Absent,
    /// A delimited block that is not a readable YAML mapping.
    Malformed,
}

/// Fields to fill in on an existing document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    pub fields: Vec<(String, FieldValue)>,
}

impl Patch {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn push(&mut self, key: impl Into<String>, value: FieldValue) {
        self.fields.push((key.into(), value));
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(key, _)| key.as_str())
    }
}

/// A markdown page in the site content directory.
///
/// The raw frontmatter lines are kept next to the parsed view so a patch only
/// touches the lines of the keys it fills; everything else is written back
/// byte for byte.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub file_name: String,
    pub frontmatter: Frontmatter,
    pub status: FrontmatterStatus,
    pub body: String,
    header: Vec<String>,
}

impl Document {
    /// A new page whose frontmatter lines are rendered from `frontmatter`.
    pub fn new(file_name: impl Into<String>, frontmatter: Frontmatter, body: impl Into<String>) -> Self {
        let header = frontmatter.render();
        Self {
            file_name: file_name.into(),
            frontmatter,
            status: FrontmatterStatus::Present,
            body: body.into(),
            header,
        }
    }

    /// A page read from disk, with its original frontmatter lines.
    pub fn loaded(
        file_name: impl Into<String>,
        status: FrontmatterStatus,
        frontmatter: Frontmatter,
        header: Vec<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            frontmatter,
            status,
            body: body.into(),
            header,
        }
    }

    /// File name without the `.md` extension.
    pub fn stem(&self) -> &str {
        self.file_name
            .strip_suffix(".md")
            .unwrap_or(&self.file_name)
    }

    pub fn header_lines(&self) -> &[String] {
        &self.header
    }

    /// Writes each patched field into the frontmatter.
    ///
    /// An existing key line (and its indented continuation) is replaced. A
    /// missing key is inserted before the first present key that follows it
    /// in `field_order`, or appended when none does.
    pub fn apply(&mut self, patch: &Patch, field_order: &[&str]) {
        for (key, value) in &patch.fields {
            let rendered = value.render(key);
            match find_key_line(&self.header, key) {
                Some(start) => {
                    let end = continuation_end(&self.header, start);
                    self.header.splice(start..end, rendered);
                }
                None => {
                    let at = insertion_point(&self.header, key, field_order);
                    self.header.splice(at..at, rendered);
                }
            }
            self.frontmatter.set(key.clone(), value.clone());
        }
        if !patch.is_empty() && self.status == FrontmatterStatus::Absent {
            self.status = FrontmatterStatus::Present;
        }
    }

    /// Full file contents.
    pub fn render(&self) -> String {
        if self.status == FrontmatterStatus::Absent && self.header.is_empty() {
            return self.body.clone();
        }
        let mut out = String::from("---\n");
        for line in &self.header {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str("---\n");
        out.push_str(&self.body);
        out
    }
}

/// Line holding `key`, written bare or in single or double quotes.
fn find_key_line(header: &[String], key: &str) -> Option<usize> {
    header.iter().position(|line| {
        let rest = match line.chars().next() {
            Some(quote @ ('"' | '\'')) => line[1..]
                .strip_prefix(key)
                .and_then(|rest| rest.strip_prefix(quote)),
            _ => line.strip_prefix(key),
        };
        rest.is_some_and(|rest| rest.trim_start().starts_with(':'))
    })
}

fn continuation_end(header: &[String], start: usize) -> usize {
    let mut end = start + 1;
    while end < header.len() && is_continuation(&header[end]) {
        end += 1;
    }
    end
}

fn is_continuation(line: &str) -> bool {
    line.starts_with(' ') || line.starts_with('\t') || line.starts_with("- ")
}

fn insertion_point(header: &[String], key: &str, field_order: &[&str]) -> usize {
    let Some(rank) = field_order.iter().position(|name| *name == key) else {
        return header.len();
    };
    field_order[rank + 1..]
        .iter()
        .filter_map(|later| find_key_line(header, later))
        .min()
        .unwrap_or(header.len())
}
