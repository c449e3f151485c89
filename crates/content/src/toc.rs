use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

// One alternative per level so the closing tag has to match the opening one.
static HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<h2[^>]*>(?P<h2>.*?)</h2\s*>|<h3[^>]*>(?P<h3>.*?)</h3\s*>")
        .expect("valid regex")
});
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

/// One heading in an article body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    /// Heading depth: 2 or 3.
    pub level: u8,
    pub title: String,
    /// URL-safe anchor derived from the title, unique within the article.
    pub anchor: String,
}

/// Extract a table of contents from an article's HTML body.
///
/// Only `<h2>` and `<h3>` are considered; the article title itself is the
/// page's `<h1>`. Inner markup is stripped from titles.
pub fn extract_toc(html: &str) -> Vec<TocEntry> {
    let mut used: HashMap<String, usize> = HashMap::new();
    let mut entries = Vec::new();

    for caps in HEADING_RE.captures_iter(html) {
        let (level, raw) = if let Some(m) = caps.name("h2") {
            (2u8, m.as_str())
        } else if let Some(m) = caps.name("h3") {
            (3u8, m.as_str())
        } else {
            continue;
        };
        let title = TAG_RE.replace_all(raw, "").trim().to_string();
        if title.is_empty() {
            continue;
        }

        let base = slugify(&title);
        let count = used.entry(base.clone()).or_insert(0);
        *count += 1;
        let anchor = if *count == 1 {
            base
        } else {
            format!("{base}-{count}")
        };

        entries.push(TocEntry { level, title, anchor });
    }

    entries
}

/// Lowercase, transliterate Turkish letters, and collapse everything else
/// into single hyphens.
fn slugify(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut last_hyphen = true; // suppress a leading hyphen
    for ch in title.to_lowercase().chars() {
        let mapped = match ch {
            'ç' => Some('c'),
            'ğ' => Some('g'),
            'ı' => Some('i'),
            'ö' => Some('o'),
            'ş' => Some('s'),
            'ü' => Some('u'),
            c if c.is_ascii_alphanumeric() => Some(c),
            _ => None,
        };
        match mapped {
            Some(c) => {
                out.push(c);
                last_hyphen = false;
            }
            None if !last_hyphen => {
                out.push('-');
                last_hyphen = true;
            }
            None => {}
        }
    }
    out.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn extracts_h2_and_h3_in_document_order() {
        let html = r#"
            <p>Giriş</p>
            <h2>Osmanlı Dönemi</h2>
            <p>...</p>
            <h3 class="sub">Kahvehane Kültürü</h3>
            <h2>Cumhuriyet Dönemi</h2>
        "#;
        let toc = extract_toc(html);
        assert_eq!(toc.len(), 3);
        assert_eq!(toc[0].level, 2);
        assert_eq!(toc[0].title, "Osmanlı Dönemi");
        assert_eq!(toc[0].anchor, "osmanli-donemi");
        assert_eq!(toc[1].level, 3);
        assert_eq!(toc[1].anchor, "kahvehane-kulturu");
        assert_eq!(toc[2].anchor, "cumhuriyet-donemi");
    }

    #[test]
    fn strips_inner_markup_from_titles() {
        let html = "<h2>Bir <em>vurgulu</em> başlık</h2>";
        let toc = extract_toc(html);
        assert_eq!(toc[0].title, "Bir vurgulu başlık");
        assert_eq!(toc[0].anchor, "bir-vurgulu-baslik");
    }

    #[test]
    fn duplicate_titles_get_unique_anchors() {
        let html = "<h2>Kaynaklar</h2><h2>Kaynaklar</h2>";
        let toc = extract_toc(html);
        assert_eq!(toc[0].anchor, "kaynaklar");
        assert_eq!(toc[1].anchor, "kaynaklar-2");
    }

    #[test]
    fn mismatched_close_tag_is_not_a_heading() {
        assert!(extract_toc("<h2>Yarım Başlık</h3>").is_empty());
        assert!(extract_toc("<h3>Diğer Yarım</h2>").is_empty());
    }

    #[test]
    fn ignores_h1_and_empty_headings() {
        let html = "<h1>Makale Başlığı</h1><h2>   </h2><h2></h2>";
        assert!(extract_toc(html).is_empty());
    }
}
