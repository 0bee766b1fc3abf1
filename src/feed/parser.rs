use std::borrow::Cow;

use quick_xml::escape::{resolve_html5_entity, unescape_with};

/// Maximum number of articles taken from one feed document.
pub const MAX_ARTICLES: usize = 5;

/// One feed entry, in feed (popularity) order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub link: String,
    /// Empty when the entry carried no description.
    pub description: String,
}

/// Scanner state: either between entries or inside one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Outside,
    InEntry,
}

/// Classification of one trimmed line of the feed document.
#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    EntryOpen,
    EntryClose,
    Title(&'a str),
    Link(&'a str),
    Description(&'a str),
    Other,
}

/// Fields collected for the entry currently being scanned.
#[derive(Debug, Default)]
struct Scratch {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
}

impl Scratch {
    fn is_empty(&self) -> bool {
        self.title.is_none() && self.link.is_none() && self.description.is_none()
    }

    /// Converts the record into an [`Article`]; entries without a title or
    /// link cannot be posted and are dropped.
    fn into_article(self) -> Option<Article> {
        let title = self.title.filter(|t| !t.is_empty())?;
        let link = self.link.filter(|l| !l.is_empty())?;
        Some(Article {
            title,
            link,
            description: self.description.unwrap_or_default(),
        })
    }
}

/// Extracts up to [`MAX_ARTICLES`] articles from an RSS/RDF feed document.
///
/// The document is scanned line by line against the known hotentry layout:
/// one `<item ...>` container per entry with `<title>`, `<link>` and
/// `<description>` each on a single line. No XML tree is built.
///
/// Never fails: truncated or garbled input yields whatever complete entries
/// were seen before the damage, possibly none.
pub fn parse_feed(document: &str) -> Vec<Article> {
    let mut articles = Vec::with_capacity(MAX_ARTICLES);
    let mut state = State::Outside;
    let mut scratch = Scratch::default();

    for line in document.lines() {
        if articles.len() >= MAX_ARTICLES {
            break;
        }

        let token = classify(line.trim());
        match (state, token) {
            (_, Token::EntryOpen) => {
                state = State::InEntry;
                scratch = Scratch::default();
            }
            (State::InEntry, Token::EntryClose) => {
                let record = std::mem::take(&mut scratch);
                state = State::Outside;
                if record.is_empty() {
                    continue;
                }
                match record.into_article() {
                    Some(article) => articles.push(article),
                    None => tracing::debug!("Skipping feed entry without title or link"),
                }
            }
            (State::InEntry, Token::Title(raw)) => {
                scratch.title = Some(decode_entities(raw).trim().to_string());
            }
            (State::InEntry, Token::Link(raw)) => {
                scratch.link = Some(raw.trim().to_string());
            }
            (State::InEntry, Token::Description(raw)) => {
                scratch.description = Some(decode_entities(raw).trim().to_string());
            }
            // Channel-level title/link/description and stray closers
            (State::Outside, _) | (State::InEntry, Token::Other) => {}
        }
    }

    articles
}

fn classify(line: &str) -> Token<'_> {
    // `<items>` in the RDF channel header must not open an entry
    if line.contains("<item ") || line.contains("<item>") {
        return Token::EntryOpen;
    }
    if line.contains("</item>") {
        return Token::EntryClose;
    }
    if let Some(value) = element_text(line, "title") {
        return Token::Title(value);
    }
    if let Some(value) = element_text(line, "link") {
        return Token::Link(value);
    }
    if let Some(value) = element_text(line, "description") {
        return Token::Description(value);
    }
    Token::Other
}

/// Returns the text between `<name>` and `</name>` on one line.
///
/// A missing closing tag takes the remainder of the line. A CDATA wrapper is
/// removed.
fn element_text<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let open = format!("<{name}>");
    let close = format!("</{name}>");

    let start = line.find(&open)? + open.len();
    let rest = &line[start..];
    let value = match rest.find(&close) {
        Some(end) => &rest[..end],
        None => rest,
    };

    let value = value.trim();
    Some(
        value
            .strip_prefix("<![CDATA[")
            .and_then(|v| v.strip_suffix("]]>"))
            .unwrap_or(value),
    )
}

/// Decodes XML, numeric, and HTML5 named entities (`&amp;`, `&#39;`, `&hellip;`).
///
/// Text with an unknown or malformed entity is kept verbatim.
fn decode_entities(raw: &str) -> Cow<'_, str> {
    match unescape_with(raw, resolve_html5_entity) {
        Ok(decoded) => decoded,
        Err(e) => {
            tracing::debug!(error = %e, "Leaving feed text with undecodable entity as-is");
            Cow::Borrowed(raw)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn rdf_item(n: usize) -> String {
        format!(
            r#"<item rdf:about="https://example.com/{n}">
<title>Article {n}</title>
<link>https://example.com/{n}</link>
<description>Description {n}</description>
<dc:date>2026-10-18T08:00:00+09:00</dc:date>
</item>
"#
        )
    }

    fn rdf_document(items: usize) -> String {
        let mut doc = String::from(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rdf:RDF xmlns="http://purl.org/rss/1.0/" xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
<channel rdf:about="https://b.hatena.ne.jp/hotentry/it">
<title>はてなブックマーク - 人気エントリー - テクノロジー</title>
<link>https://b.hatena.ne.jp/hotentry/it</link>
<description>最近の人気エントリー - テクノロジー</description>
<items>
<rdf:Seq>
</rdf:Seq>
</items>
</channel>
"#,
        );
        for n in 1..=items {
            doc.push_str(&rdf_item(n));
        }
        doc.push_str("</rdf:RDF>\n");
        doc
    }

    #[test]
    fn test_parses_entries_in_order() {
        let articles = parse_feed(&rdf_document(3));
        assert_eq!(articles.len(), 3);
        assert_eq!(
            articles[0],
            Article {
                title: "Article 1".into(),
                link: "https://example.com/1".into(),
                description: "Description 1".into(),
            }
        );
        assert_eq!(articles[2].link, "https://example.com/3");
    }

    #[test]
    fn test_caps_at_five() {
        let articles = parse_feed(&rdf_document(30));
        assert_eq!(articles.len(), MAX_ARTICLES);
        assert_eq!(articles[4].title, "Article 5");
    }

    #[test]
    fn test_channel_fields_are_ignored() {
        let articles = parse_feed(&rdf_document(1));
        assert!(articles.iter().all(|a| !a.title.contains("人気エントリー")));
    }

    #[test]
    fn test_decodes_entities_in_title_and_description() {
        let doc = r#"<item rdf:about="x">
<title>Rust &amp; Go: &quot;fast&quot; &#39;safe&#39; &lt;tools&gt;</title>
<link>https://example.com/a?x=1&amp;y=2</link>
<description>Tips&hellip; for A&amp;B</description>
</item>"#;
        let articles = parse_feed(doc);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, r#"Rust & Go: "fast" 'safe' <tools>"#);
        assert_eq!(articles[0].description, "Tips… for A&B");
        // Links are passed through untouched
        assert_eq!(articles[0].link, "https://example.com/a?x=1&amp;y=2");
    }

    #[test]
    fn test_undecodable_entity_kept_verbatim() {
        let doc = "<item>\n<title>Fish &chips; night</title>\n<link>https://e.com</link>\n</item>";
        let articles = parse_feed(doc);
        assert_eq!(articles[0].title, "Fish &chips; night");
    }

    #[test]
    fn test_trims_whitespace() {
        let doc = "  <item rdf:about=\"x\">\n   <title>   Padded title  </title>\n\t<link> https://e.com/p </link>\n<description>  desc  </description>\n  </item>  ";
        let articles = parse_feed(doc);
        assert_eq!(articles[0].title, "Padded title");
        assert_eq!(articles[0].link, "https://e.com/p");
        assert_eq!(articles[0].description, "desc");
    }

    #[test]
    fn test_missing_description_is_empty() {
        let doc = "<item>\n<title>No desc</title>\n<link>https://e.com/n</link>\n</item>";
        let articles = parse_feed(doc);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].description, "");
    }

    #[test]
    fn test_empty_description_element() {
        let doc = "<item>\n<title>T</title>\n<link>https://e.com/n</link>\n<description></description>\n</item>";
        assert_eq!(parse_feed(doc)[0].description, "");
    }

    #[test]
    fn test_cdata_unwrapped() {
        let doc = "<item>\n<title><![CDATA[Raw & title]]></title>\n<link>https://e.com/c</link>\n</item>";
        assert_eq!(parse_feed(doc)[0].title, "Raw & title");
    }

    #[test]
    fn test_entry_without_link_is_skipped() {
        let doc = format!(
            "<item>\n<title>Orphan</title>\n</item>\n{}",
            rdf_item(1)
        );
        let articles = parse_feed(&doc);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Article 1");
    }

    #[test]
    fn test_empty_entry_is_skipped() {
        let doc = format!("<item>\n</item>\n{}", rdf_item(2));
        let articles = parse_feed(&doc);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Article 2");
    }

    #[test]
    fn test_truncated_document_yields_complete_entries_only() {
        let doc = rdf_document(3);
        let cut = doc.find("<item rdf:about=\"https://example.com/3\">").unwrap() + 40;
        let articles = parse_feed(&doc[..cut]);
        assert_eq!(articles.len(), 2);
    }

    #[test]
    fn test_reopened_entry_discards_partial_record() {
        let doc = "<item>\n<title>Broken</title>\n<item>\n<title>Good</title>\n<link>https://e.com/g</link>\n</item>";
        let articles = parse_feed(doc);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Good");
    }

    #[test]
    fn test_empty_and_garbled_documents() {
        assert!(parse_feed("").is_empty());
        assert!(parse_feed("<html><body>502 Bad Gateway</body></html>").is_empty());
        assert!(parse_feed("\u{0}\u{1}<<<>>>&&&;;").is_empty());
        assert!(parse_feed("</item></item>\n<title>x</title>").is_empty());
    }

    proptest! {
        #[test]
        fn returns_min_of_entries_and_five_in_order(n in 0usize..12) {
            let articles = parse_feed(&rdf_document(n));
            prop_assert_eq!(articles.len(), n.min(MAX_ARTICLES));
            for (i, article) in articles.iter().enumerate() {
                prop_assert_eq!(&article.title, &format!("Article {}", i + 1));
            }
        }

        #[test]
        fn never_panics_on_arbitrary_input(doc in "\\PC{0,400}") {
            let articles = parse_feed(&doc);
            prop_assert!(articles.len() <= MAX_ARTICLES);
        }
    }
}
