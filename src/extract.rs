//! HTML metadata extraction for post pages.
//!
//! Every lookup degrades to absent when the page lacks the element; only
//! malformed numeric or date values abort extraction for the whole post.
use crate::{
    error::Result,
    models::PostMetadata,
};
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

/// Format of the `Posted:` anchor title, e.g. `Fri Jan 02 03:04:05 2015`.
const POSTED_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

static HIGHRES: Lazy<Selector> = Lazy::new(|| Selector::parse("a#highres").unwrap());
static SIDEBAR_TAGS: Lazy<Selector> = Lazy::new(|| Selector::parse("ul#tag-sidebar li").unwrap());
static STATS_ITEMS: Lazy<Selector> = Lazy::new(|| Selector::parse("div#stats li").unwrap());
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static ANCHOR_WITH_HREF: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static ANCHOR_WITH_TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("a[title]").unwrap());
static FAVORITED_BY: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div#stats span#favorited-by").unwrap());
static STATUS_NOTICE: Lazy<Selector> = Lazy::new(|| Selector::parse("div.status-notice").unwrap());

/// Extract the metadata record from a parsed post page.
pub fn extract_metadata(doc: &Html, post_id: u64, post_url: &str) -> Result<PostMetadata> {
    let mut meta = PostMetadata {
        post_id,
        post_url: post_url.to_string(),
        ..Default::default()
    };

    meta.image_url = doc
        .select(&HIGHRES)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string);

    extract_tags(doc, &mut meta);
    extract_stats(doc, &mut meta)?;
    extract_favorites(doc, &mut meta);
    extract_status_notices(doc, &mut meta);

    Ok(meta)
}

/// Sidebar tags: the list item's first CSS class is the category, the tag
/// name is the text of its second anchor (the first is the wiki link).
fn extract_tags(doc: &Html, meta: &mut PostMetadata) {
    for li in doc.select(&SIDEBAR_TAGS) {
        let Some(category) = li
            .value()
            .attr("class")
            .and_then(|c| c.split_whitespace().next())
        else {
            continue;
        };

        let Some(name) = li.select(&ANCHOR).nth(1).map(element_text) else {
            continue;
        };
        if name.is_empty() {
            continue;
        }

        meta.tags
            .entry(category.to_string())
            .or_default()
            .push(name);
    }
}

/// The `div#stats` label:value list. `Source`, `Posted` and `Size` are
/// special-cased; everything else lands in the flattened stats map under a
/// normalized key.
fn extract_stats(doc: &Html, meta: &mut PostMetadata) -> Result<()> {
    for li in doc.select(&STATS_ITEMS) {
        let text = element_text(li);
        let Some((label, value)) = text.split_once(':') else {
            continue;
        };

        match label.trim() {
            "Source" => {
                meta.source = li
                    .select(&ANCHOR_WITH_HREF)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .map(str::to_string);
            }
            "Posted" => {
                if let Some(title) = li
                    .select(&ANCHOR_WITH_TITLE)
                    .next()
                    .and_then(|a| a.value().attr("title"))
                {
                    let parsed = NaiveDateTime::parse_from_str(title, POSTED_FORMAT)?;
                    meta.posted = Some(title.to_string());
                    meta.timestamp = Some(parsed.format("%Y-%m-%dT%H:%M:%S").to_string());
                }
            }
            "Size" => {
                let parts: Vec<&str> = value.trim().split('x').collect();
                if parts.len() == 2 {
                    let width: u32 = parts[0].trim().parse()?;
                    let height: u32 = parts[1].trim().parse()?;
                    meta.width = Some(width);
                    meta.height = Some(height);
                    meta.pixels = Some(u64::from(width) * u64::from(height));
                }
            }
            other => {
                meta.stats
                    .insert(normalize_label(other), value.trim().to_string());
            }
        }
    }

    Ok(())
}

/// The `favorited-by` span inside the stats block. Absent on one site
/// variant, in which case both fields stay out of the record.
fn extract_favorites(doc: &Html, meta: &mut PostMetadata) {
    if let Some(span) = doc.select(&FAVORITED_BY).next() {
        let users: Vec<String> = span.select(&ANCHOR).map(element_text).collect();
        meta.favorite_count = Some(users.len());
        meta.favorited_by = Some(users);
        // the label:value pass already stored the span's text under this
        // key; the structured list supersedes it
        meta.stats.remove("favorited_by");
    }
}

/// Status-notice banners, raw plus the best-effort parsed sub-fields.
fn extract_status_notices(doc: &Html, meta: &mut PostMetadata) {
    for notice in doc.select(&STATUS_NOTICE) {
        let text = element_text(notice);
        let lower = text.to_lowercase();

        if lower.contains("belongs to a parent post") {
            meta.status_notice_parsed.parent_post_id = notice
                .select(&ANCHOR_WITH_HREF)
                .next()
                .and_then(|a| a.value().attr("href"))
                .and_then(|href| href.rsplit('/').next())
                .map(str::to_string);
        }

        if lower.contains("flagged for deletion") {
            if let Some((_, reason)) = text.split_once("Reason:") {
                meta.status_notice_parsed.deletion_reason = Some(reason.trim().to_string());
            }
            if let Some((_, rest)) = text.split_once("by ") {
                let flagger = rest.split('.').next().unwrap_or(rest).trim();
                meta.status_notice_parsed.flagged_by = Some(flagger.to_string());
            }
        }

        meta.status_notice.push(text);
    }
}

/// Whitespace-trimmed text content of an element, descendants included.
fn element_text(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Normalize a stats label to a lowercase_underscore key.
fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase().replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    const POST_URL: &str = "https://www.sakugabooru.com/post/show/44843";

    const POST_PAGE: &str = r##"<!DOCTYPE html>
<html>
<body>
  <div class="status-notice">This post belongs to a parent post (<a href="/post/show/44840">post #44840</a>).</div>
  <div class="status-notice">This post was flagged for deletion by moderator. Reason: duplicate of an earlier upload.</div>
  <div class="sidebar">
    <ul id="tag-sidebar">
      <li class="tag-type-artist"><a href="/wiki/show?title=masaaki_ohira">?</a> <a href="/post?tags=masaaki_ohira">masaaki ohira</a> <span class="post-count">12</span></li>
      <li class="tag-type-copyright"><a href="/wiki/show?title=one_piece">?</a> <a href="/post?tags=one_piece">one piece</a></li>
      <li class="tag-type-general"><a href="/wiki/show?title=animated">?</a> <a href="/post?tags=animated">animated</a></li>
      <li class="tag-type-general"><a href="/wiki/show?title=fighting">?</a> <a href="/post?tags=fighting">fighting</a></li>
      <li class="tag-type-general"><a href="/wiki/show?title=orphan">orphan</a></li>
    </ul>
    <div id="stats">
      <ul>
        <li>Id: 44843</li>
        <li>Posted: <a href="/post?tags=date%3A2015-01-02" title="Fri Jan 02 03:04:05 2015">about 10 years ago</a> by <a href="/user/show/17">uploader</a></li>
        <li>Size: 1920x1080</li>
        <li>Source: <a href="https://example.com/original">https://example.com/original</a></li>
        <li>Rating: Safe</li>
        <li>Score: 12</li>
        <li>Favorited by: <span id="favorited-by"><a href="/user/show/2">alice</a>, <a href="/user/show/3">bob</a></span></li>
      </ul>
    </div>
  </div>
  <a id="highres" href="https://www.sakugabooru.com/data/abcdef0123456789.mp4">Original</a>
</body>
</html>
"##;

    fn extract(html: &str) -> PostMetadata {
        let doc = Html::parse_document(html);
        extract_metadata(&doc, 44843, POST_URL).unwrap()
    }

    #[test]
    fn image_url_matches_the_highres_href() {
        let meta = extract(POST_PAGE);
        assert_eq!(
            meta.image_url.as_deref(),
            Some("https://www.sakugabooru.com/data/abcdef0123456789.mp4")
        );
    }

    #[test]
    fn tags_group_by_category_in_document_order() {
        let meta = extract(POST_PAGE);
        assert_eq!(meta.tags["tag-type-artist"], vec!["masaaki ohira"]);
        assert_eq!(meta.tags["tag-type-copyright"], vec!["one piece"]);
        assert_eq!(meta.tags["tag-type-general"], vec!["animated", "fighting"]);
        // the single-anchor item has no extractable name
        assert!(!meta.tags["tag-type-general"].contains(&"orphan".to_string()));
    }

    #[test]
    fn stats_labels_are_normalized_and_special_cased() {
        let meta = extract(POST_PAGE);
        assert_eq!(meta.stats["id"], "44843");
        assert_eq!(meta.stats["rating"], "Safe");
        assert_eq!(meta.stats["score"], "12");
        assert_eq!(meta.source.as_deref(), Some("https://example.com/original"));
        assert_eq!(meta.posted.as_deref(), Some("Fri Jan 02 03:04:05 2015"));
        assert_eq!(meta.timestamp.as_deref(), Some("2015-01-02T03:04:05"));
        assert_eq!(meta.width, Some(1920));
        assert_eq!(meta.height, Some(1080));
        assert_eq!(meta.pixels, Some(2_073_600));
    }

    #[test]
    fn favorites_supersede_the_raw_stats_entry() {
        let meta = extract(POST_PAGE);
        assert_eq!(
            meta.favorited_by,
            Some(vec!["alice".to_string(), "bob".to_string()])
        );
        assert_eq!(meta.favorite_count, Some(2));
        assert!(!meta.stats.contains_key("favorited_by"));
    }

    #[test]
    fn status_notices_keep_raw_text_and_parse_sub_fields() {
        let meta = extract(POST_PAGE);
        assert_eq!(meta.status_notice.len(), 2);
        assert_eq!(
            meta.status_notice_parsed.parent_post_id.as_deref(),
            Some("44840")
        );
        assert_eq!(
            meta.status_notice_parsed.deletion_reason.as_deref(),
            Some("duplicate of an earlier upload.")
        );
        assert_eq!(meta.status_notice_parsed.flagged_by.as_deref(), Some("moderator"));
    }

    #[test]
    fn bare_page_degrades_to_an_empty_record() {
        let meta = extract("<html><body><p>nothing here</p></body></html>");
        assert_eq!(meta.post_id, 44843);
        assert!(meta.image_url.is_none());
        assert!(meta.tags.is_empty());
        assert!(meta.stats.is_empty());
        assert!(meta.favorited_by.is_none());
        assert!(meta.status_notice.is_empty());
        assert_eq!(meta.status_notice_parsed, Default::default());
    }

    #[test]
    fn size_with_wrong_part_count_is_left_absent() {
        let html = r#"<div id="stats"><ul><li>Size: malformed</li></ul></div>"#;
        let meta = extract(html);
        assert!(meta.width.is_none());
        assert!(meta.height.is_none());
        assert!(meta.pixels.is_none());
    }

    #[test]
    fn size_with_unparsable_numbers_fails_the_post() {
        let html = r#"<div id="stats"><ul><li>Size: AxB</li></ul></div>"#;
        let doc = Html::parse_document(html);
        let result = extract_metadata(&doc, 1, POST_URL);
        assert!(matches!(result, Err(crate::Error::ParseInt(_))));
    }

    #[test]
    fn malformed_posted_date_fails_the_post() {
        let html = r#"<div id="stats"><ul><li>Posted: <a title="not a date" href="/x">x</a></li></ul></div>"#;
        let doc = Html::parse_document(html);
        let result = extract_metadata(&doc, 1, POST_URL);
        assert!(matches!(result, Err(crate::Error::DateParse(_))));
    }

    #[test]
    fn favorites_span_with_no_anchors_yields_an_empty_list() {
        let html = r#"<div id="stats"><ul><li>Favorited by: <span id="favorited-by"></span></li></ul></div>"#;
        let meta = extract(html);
        assert_eq!(meta.favorited_by, Some(vec![]));
        assert_eq!(meta.favorite_count, Some(0));
    }
}
