//! File entries and their serialized form.

/// Extracted content of one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// One text per page, in page order.
    Pages(Vec<String>),
    /// The whole file as a single text.
    Text(String),
    /// No extractable text; only name and path are indexed.
    NameOnly,
}

/// One indexed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Display name (file name with extension)
    pub name: String,
    /// Path relative to the indexing root, `/`-separated; also the ledger key
    pub relative_path: String,
    /// Extracted content
    pub content: Content,
}

impl FileEntry {
    pub fn new(name: impl Into<String>, relative_path: impl Into<String>, content: Content) -> Self {
        Self {
            name: name.into(),
            relative_path: relative_path.into(),
            content,
        }
    }

    /// Serialize as a `<file>` record, one element per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("\t<file>\n");
        push_element(&mut out, "name", &self.name);
        push_element(&mut out, "path", &self.relative_path);

        match &self.content {
            Content::Pages(pages) => {
                for page in pages {
                    push_element(&mut out, "page", page);
                }
            }
            Content::Text(text) => push_element(&mut out, "content", text),
            Content::NameOnly => {}
        }

        out.push_str("\t</file>\n");
        out
    }
}

fn push_element(out: &mut String, tag: &str, text: &str) {
    out.push_str("\t\t<");
    out.push_str(tag);
    out.push('>');
    out.push_str(&escape(text));
    out.push_str("</");
    out.push_str(tag);
    out.push_str(">\n");
}

/// Escape the markup characters `&`, `<` and `>`.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Inverse of [`escape`]. Unknown entities are left untouched.
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        let (replacement, consumed) = if rest.starts_with("&amp;") {
            ('&', 5)
        } else if rest.starts_with("&lt;") {
            ('<', 4)
        } else if rest.starts_with("&gt;") {
            ('>', 4)
        } else {
            ('&', 1)
        };

        out.push(replacement);
        rest = &rest[consumed..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_text_entry() {
        let entry = FileEntry::new("doc.txt", "doc.txt", Content::Text("hello <world>".into()));
        assert_eq!(
            entry.render(),
            "\t<file>\n\
             \t\t<name>doc.txt</name>\n\
             \t\t<path>doc.txt</path>\n\
             \t\t<content>hello &lt;world&gt;</content>\n\
             \t</file>\n"
        );
    }

    #[test]
    fn test_render_pages() {
        let entry = FileEntry::new(
            "a.pdf",
            "x/a.pdf",
            Content::Pages(vec!["one".into(), "two & three".into()]),
        );
        let rendered = entry.render();
        assert!(rendered.contains("\t\t<page>one</page>\n"));
        assert!(rendered.contains("\t\t<page>two &amp; three</page>\n"));
        assert!(!rendered.contains("<content>"));
    }

    #[test]
    fn test_render_name_only() {
        let entry = FileEntry::new("plan.dwg", "site/plan.dwg", Content::NameOnly);
        let rendered = entry.render();
        assert!(rendered.contains("<name>plan.dwg</name>"));
        assert!(rendered.contains("<path>site/plan.dwg</path>"));
        assert!(!rendered.contains("<page>"));
        assert!(!rendered.contains("<content>"));
    }

    #[test]
    fn test_escape_round_trip() {
        let samples = [
            "plain",
            "a < b && c > d",
            "&lt; already looks escaped",
            "&amp;amp;",
            "multi\nline <tag>\n& more",
            "",
        ];
        for sample in samples {
            assert_eq!(unescape(&escape(sample)), sample, "sample: {sample:?}");
        }
    }

    #[test]
    fn test_escape_only_touches_markup() {
        assert_eq!(escape("\"quoted\" 'single'"), "\"quoted\" 'single'");
        assert_eq!(escape("step 1 & 2"), "step 1 &amp; 2");
    }

    #[test]
    fn test_unescape_leaves_unknown_entities() {
        assert_eq!(unescape("&quot;&amp;"), "&quot;&");
    }
}
