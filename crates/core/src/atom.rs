//! AtomPub payload construction and response parsing.
//!
//! A thin serialization layer: outbound entry documents are assembled from
//! Markdown-derived fields, inbound documents are reduced to the entry
//! model. Namespace prefixes are ignored on the way in; elements are
//! matched by local name.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::entry::{ContentType, Entry, EntrySummary};
use crate::error::Error;

/// Escape text for safe embedding in an XML element.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Build an outbound AtomPub entry document.
///
/// The body is escaped; the title is embedded verbatim, matching what the
/// service has accepted for already-published entries.
pub fn build_entry_xml(
    author: &str,
    title: &str,
    body: &str,
    categories: &[String],
    draft: bool,
) -> String {
    let content = escape_text(body);
    let cats: String = categories
        .iter()
        .map(|c| format!("  <category term=\"{c}\" />\n"))
        .collect();
    let draft_flag = if draft { "yes" } else { "no" };

    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<entry xmlns="http://www.w3.org/2005/Atom" xmlns:app="http://www.w3.org/2007/app">
  <title>{title}</title>
  <author><name>{author}</name></author>
  <content type="text/x-markdown">{content}</content>
{cats}  <app:control><app:draft>{draft_flag}</app:draft></app:control>
</entry>"#
    )
}

/// Build the Fotolife upload document for one image.
pub fn build_upload_xml(file_name: &str, mime_type: &str, base64_data: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<entry xmlns="http://purl.org/atom/ns#" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <title>{title}</title>
  <content mode="base64" type="{mime_type}">{base64_data}</content>
</entry>
"#,
        title = escape_text(file_name),
    )
}

/// Extract the embed token from a Fotolife upload response.
pub fn parse_upload_response(xml: &str) -> Result<String, Error> {
    let entries = scan(xml)?;
    entries
        .first()
        .and_then(|acc| acc.syntax.clone())
        .map(|syntax| format!("[{syntax}]"))
        .ok_or_else(|| Error::MalformedResponse("upload response carries no syntax".to_string()))
}

/// Extract the entry id from a `Location` response header value.
pub fn entry_id_from_location(location: &str) -> Option<String> {
    location
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Parse a single-entry response document.
pub fn parse_entry(xml: &str) -> Result<Entry, Error> {
    let entries = scan(xml)?;
    let acc = entries
        .into_iter()
        .next()
        .ok_or_else(|| Error::MalformedResponse("no entry element in response".to_string()))?;
    acc.into_entry()
}

/// Parse a collection feed into entry summaries, in document order.
pub fn parse_feed(xml: &str) -> Result<Vec<EntrySummary>, Error> {
    scan(xml)?
        .into_iter()
        .map(EntryAccumulator::into_summary)
        .collect()
}

/// Reduce a raw `<id>` value like `tag:blog.hatena.ne.jp,2007:entry/123`
/// to the bare entry id.
fn strip_id_prefix(raw: &str) -> String {
    match raw.split("entry/").last() {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => raw.to_string(),
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Content,
    Updated,
    Published,
    Id,
    Draft,
    Syntax,
}

#[derive(Default)]
struct EntryAccumulator {
    id: Option<String>,
    title: Option<String>,
    content: Option<String>,
    content_type: Option<String>,
    updated: Option<String>,
    published: Option<String>,
    draft: bool,
    categories: Vec<String>,
    edit_url: Option<String>,
    syntax: Option<String>,
}

impl EntryAccumulator {
    fn assign(&mut self, field: Field) -> &mut String {
        let slot = match field {
            Field::Title => &mut self.title,
            Field::Content => &mut self.content,
            Field::Updated => &mut self.updated,
            Field::Published => &mut self.published,
            Field::Id => &mut self.id,
            Field::Syntax => &mut self.syntax,
            Field::Draft => unreachable!("draft is folded into a bool"),
        };
        slot.get_or_insert_with(String::new)
    }

    fn into_entry(self) -> Result<Entry, Error> {
        let title = self
            .title
            .ok_or_else(|| Error::MalformedResponse("entry has no title".to_string()))?;
        let body = self
            .content
            .ok_or_else(|| Error::MalformedResponse("entry has no content".to_string()))?;
        Ok(Entry {
            id: self.id.as_deref().map(strip_id_prefix),
            title,
            body,
            content_type: ContentType::from_mime(self.content_type.as_deref().unwrap_or("")),
            draft: self.draft,
            categories: self.categories,
            created: self.published,
            updated: self.updated,
            edit_url: self.edit_url,
        })
    }

    fn into_summary(self) -> Result<EntrySummary, Error> {
        let id = self
            .id
            .ok_or_else(|| Error::MalformedResponse("entry has no id".to_string()))?;
        let title = self
            .title
            .ok_or_else(|| Error::MalformedResponse("entry has no title".to_string()))?;
        Ok(EntrySummary {
            id: strip_id_prefix(&id),
            title,
            updated: self.updated,
            draft: self.draft,
            categories: self.categories,
            edit_url: self.edit_url,
        })
    }
}

fn malformed(e: impl std::fmt::Display) -> Error {
    Error::MalformedResponse(format!("XML parse error: {e}"))
}

/// Event-scan a response document, collecting every `<entry>` element.
fn scan(xml: &str) -> Result<Vec<EntryAccumulator>, Error> {
    let mut reader = Reader::from_str(xml);
    let mut entries: Vec<EntryAccumulator> = Vec::new();
    let mut in_entry = false;
    let mut current: Option<Field> = None;

    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"entry" => {
                    entries.push(EntryAccumulator::default());
                    in_entry = true;
                    current = None;
                }
                b"title" if in_entry => {
                    entries.last_mut().unwrap().assign(Field::Title);
                    current = Some(Field::Title);
                }
                b"content" if in_entry => {
                    let acc = entries.last_mut().unwrap();
                    acc.assign(Field::Content);
                    acc.content_type = attribute(&e, b"type")?;
                    current = Some(Field::Content);
                }
                b"updated" if in_entry => current = Some(Field::Updated),
                b"published" if in_entry => current = Some(Field::Published),
                b"id" if in_entry => current = Some(Field::Id),
                b"draft" if in_entry => current = Some(Field::Draft),
                b"syntax" if in_entry => current = Some(Field::Syntax),
                b"category" if in_entry => {
                    push_category(entries.last_mut().unwrap(), &e)?;
                    current = None;
                }
                b"link" if in_entry => {
                    push_edit_link(entries.last_mut().unwrap(), &e)?;
                    current = None;
                }
                _ => current = None,
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"category" if in_entry => push_category(entries.last_mut().unwrap(), &e)?,
                b"link" if in_entry => push_edit_link(entries.last_mut().unwrap(), &e)?,
                _ => {}
            },
            Event::Text(t) => {
                if let (true, Some(field)) = (in_entry, current) {
                    let text = t.unescape().map_err(malformed)?;
                    let acc = entries.last_mut().unwrap();
                    match field {
                        Field::Draft => acc.draft = text.trim() == "yes",
                        _ => acc.assign(field).push_str(&text),
                    }
                }
            }
            Event::CData(t) => {
                if let (true, Some(field)) = (in_entry, current) {
                    let text = String::from_utf8_lossy(&t.into_inner()).into_owned();
                    let acc = entries.last_mut().unwrap();
                    match field {
                        Field::Draft => acc.draft = text.trim() == "yes",
                        _ => acc.assign(field).push_str(&text),
                    }
                }
            }
            Event::End(e) => {
                if e.local_name().as_ref() == b"entry" {
                    in_entry = false;
                }
                current = None;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(entries)
}

fn attribute(
    e: &quick_xml::events::BytesStart<'_>,
    name: &[u8],
) -> Result<Option<String>, Error> {
    for attr in e.attributes() {
        let attr = attr.map_err(malformed)?;
        if attr.key.as_ref() == name {
            return Ok(Some(attr.unescape_value().map_err(malformed)?.into_owned()));
        }
    }
    Ok(None)
}

fn push_category(
    acc: &mut EntryAccumulator,
    e: &quick_xml::events::BytesStart<'_>,
) -> Result<(), Error> {
    if let Some(term) = attribute(e, b"term")? {
        acc.categories.push(term);
    }
    Ok(())
}

fn push_edit_link(
    acc: &mut EntryAccumulator,
    e: &quick_xml::events::BytesStart<'_>,
) -> Result<(), Error> {
    if attribute(e, b"rel")?.as_deref() == Some("edit") {
        if let Some(href) = attribute(e, b"href")? {
            acc.edit_url = Some(href);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENTRY_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<entry xmlns="http://www.w3.org/2005/Atom" xmlns:app="http://www.w3.org/2007/app">
  <id>tag:blog.hatena.ne.jp,2007:entry/820878482940000000</id>
  <link rel="edit" href="https://blog.hatena.ne.jp/u/b/atom/entry/820878482940000000"/>
  <link rel="alternate" type="text/html" href="https://b.example.com/entry/2024/03/05/x"/>
  <title>A &amp; B</title>
  <updated>2024-03-06T10:00:00+09:00</updated>
  <published>2024-03-05T12:34:56+09:00</published>
  <app:control><app:draft>yes</app:draft></app:control>
  <category term="rust"/>
  <category term="blog"/>
  <content type="text/x-markdown">body with &lt;tags&gt; &amp; entities</content>
</entry>"#;

    #[test]
    fn test_parse_entry_extracts_fields() {
        let entry = parse_entry(ENTRY_XML).unwrap();
        assert_eq!(entry.id.as_deref(), Some("820878482940000000"));
        assert_eq!(entry.title, "A & B");
        assert_eq!(entry.body, "body with <tags> & entities");
        assert_eq!(entry.content_type, ContentType::Markdown);
        assert!(entry.draft);
        assert_eq!(entry.categories, vec!["rust", "blog"]);
        assert_eq!(entry.created.as_deref(), Some("2024-03-05T12:34:56+09:00"));
        assert_eq!(entry.updated.as_deref(), Some("2024-03-06T10:00:00+09:00"));
        assert_eq!(
            entry.edit_url.as_deref(),
            Some("https://blog.hatena.ne.jp/u/b/atom/entry/820878482940000000")
        );
    }

    #[test]
    fn test_parse_entry_html_content_type() {
        let xml = r#"<entry xmlns="http://www.w3.org/2005/Atom">
  <title>t</title>
  <content type="text/html">&lt;p&gt;hi&lt;/p&gt;</content>
</entry>"#;
        let entry = parse_entry(xml).unwrap();
        assert_eq!(entry.content_type, ContentType::Html);
        assert_eq!(entry.body, "<p>hi</p>");
        assert!(!entry.draft);
    }

    #[test]
    fn test_parse_entry_missing_title_is_malformed() {
        let xml = r#"<entry xmlns="http://www.w3.org/2005/Atom">
  <content type="text/x-markdown">body</content>
</entry>"#;
        let err = parse_entry(xml).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_entry_empty_title_is_not_missing() {
        let xml = r#"<entry xmlns="http://www.w3.org/2005/Atom">
  <title></title>
  <content type="text/x-markdown">body</content>
</entry>"#;
        let entry = parse_entry(xml).unwrap();
        assert_eq!(entry.title, "");
    }

    #[test]
    fn test_parse_feed_in_document_order() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:app="http://www.w3.org/2007/app">
  <title>the blog</title>
  <entry>
    <id>tag:blog.hatena.ne.jp,2007:entry/1</id>
    <title>first</title>
    <updated>2024-01-01T00:00:00+09:00</updated>
    <app:control><app:draft>no</app:draft></app:control>
    <category term="a"/>
  </entry>
  <entry>
    <id>tag:blog.hatena.ne.jp,2007:entry/2</id>
    <title>second</title>
    <updated>2024-01-02T00:00:00+09:00</updated>
    <link rel="edit" href="https://blog.hatena.ne.jp/u/b/atom/entry/2"/>
    <app:control><app:draft>yes</app:draft></app:control>
  </entry>
</feed>"#;

        let entries = parse_feed(xml).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "1");
        assert_eq!(entries[0].title, "first");
        assert!(!entries[0].draft);
        assert_eq!(entries[0].categories, vec!["a"]);
        assert_eq!(entries[1].id, "2");
        assert!(entries[1].draft);
        assert_eq!(
            entries[1].edit_url.as_deref(),
            Some("https://blog.hatena.ne.jp/u/b/atom/entry/2")
        );
    }

    #[test]
    fn test_build_entry_xml_escapes_body_only() {
        let xml = build_entry_xml(
            "user",
            "Title <raw>",
            "a < b & c > d",
            &["rust".to_string()],
            true,
        );
        assert!(xml.contains("<title>Title <raw></title>"));
        assert!(xml.contains("<content type=\"text/x-markdown\">a &lt; b &amp; c &gt; d</content>"));
        assert!(xml.contains("<category term=\"rust\" />"));
        assert!(xml.contains("<app:draft>yes</app:draft>"));
    }

    #[test]
    fn test_build_entry_xml_draft_no() {
        let xml = build_entry_xml("user", "t", "b", &[], false);
        assert!(xml.contains("<app:draft>no</app:draft>"));
        assert!(!xml.contains("<category"));
    }

    #[test]
    fn test_parse_upload_response_wraps_syntax() {
        let xml = r#"<entry xmlns="http://purl.org/atom/ns#" xmlns:hatena="http://www.hatena.ne.jp/info/xmlns#">
  <title>x.png</title>
  <hatena:syntax>f:id:user:20240305123456p:plain</hatena:syntax>
</entry>"#;
        assert_eq!(
            parse_upload_response(xml).unwrap(),
            "[f:id:user:20240305123456p:plain]"
        );
    }

    #[test]
    fn test_parse_upload_response_without_syntax_is_malformed() {
        let xml = r#"<entry xmlns="http://purl.org/atom/ns#"><title>x.png</title></entry>"#;
        assert!(matches!(
            parse_upload_response(xml),
            Err(Error::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_entry_id_from_location() {
        assert_eq!(
            entry_id_from_location("https://blog.hatena.ne.jp/u/b/atom/entry/42").as_deref(),
            Some("42")
        );
        assert_eq!(entry_id_from_location(""), None);
    }

    #[test]
    fn test_escape_text_covers_quotes() {
        assert_eq!(escape_text(r#"<a href="x">&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&amp;&apos;&lt;/a&gt;");
    }
}
