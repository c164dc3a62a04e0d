//! Message extraction from channel preview pages
//!
//! A page is split into one fragment per message container. Each fragment is
//! then read by two independent strategies:
//!
//! - **structured**: CSS selectors over the parsed fragment
//! - **pattern**: regular expressions over the raw fragment markup
//!
//! The results are merged field by field: the first strategy that produced a
//! non-empty value for a field wins. Neither strategy is ranked as a whole.

use crate::record::MessageRecord;
use crate::HarvestError;
use html_escape::decode_html_entities;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

/// Container element wrapping one message
const MESSAGE_WRAP: &str = ".tgme_widget_message_wrap";

static TEXT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<div class="tgme_widget_message_text[^"]*"[^>]*>(.*?)</div>"#)
        .expect("valid text regex")
});

static PHOTO_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<a class="tgme_widget_message_photo_wrap[^>]*?background-image:\s*url\('([^']*)'\)"#)
        .expect("valid photo regex")
});

static DATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<time datetime="([^"]+)""#).expect("valid date regex"));

static ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"data-post="[^"]*?/(\d+)""#).expect("valid id regex"));

static BREAK_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid line break regex"));

static TAG_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^<]+?>").expect("valid tag regex"));

/// Field values produced by one extraction strategy; empty means "not found"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialRecord {
    pub id: String,
    pub timestamp: String,
    pub text: String,
    pub photo_ref: String,
}

/// Splits a page into the outer markup of each message container
///
/// # Returns
///
/// * `Ok(Vec<String>)` - One fragment per message, in page order (possibly empty)
/// * `Err(HarvestError)` - The container selector could not be built
pub fn split_fragments(page: &str) -> Result<Vec<String>, HarvestError> {
    let document = Html::parse_document(page);
    let wrap = selector(MESSAGE_WRAP)?;

    Ok(document.select(&wrap).map(|element| element.html()).collect())
}

/// Extracts one message from a fragment using both strategies
///
/// # Example
///
/// ```
/// use channel_harvester::harvest::extract;
///
/// let fragment = r#"<div class="tgme_widget_message_wrap">
///   <div class="tgme_widget_message" data-post="news/42">
///     <div class="tgme_widget_message_text js-message_text" dir="auto">Hello &amp; welcome</div>
///     <time datetime="2024-01-02T10:00:00+00:00" class="time">10:00</time>
///   </div>
/// </div>"#;
///
/// let record = extract(fragment).unwrap();
/// assert_eq!(record.id, "42");
/// assert_eq!(record.text, "Hello & welcome");
/// ```
pub fn extract(fragment: &str) -> Result<MessageRecord, HarvestError> {
    let structured = extract_structured(fragment)?;
    let pattern = extract_pattern(fragment);

    Ok(merge(&[structured, pattern]))
}

/// Merges candidates per field, taking the first non-empty value
pub fn merge(candidates: &[PartialRecord]) -> MessageRecord {
    fn first(candidates: &[PartialRecord], field: fn(&PartialRecord) -> &str) -> String {
        candidates
            .iter()
            .map(field)
            .find(|value| !value.is_empty())
            .unwrap_or_default()
            .to_string()
    }

    MessageRecord {
        id: first(candidates, |c| c.id.as_str()),
        timestamp: first(candidates, |c| c.timestamp.as_str()),
        text: first(candidates, |c| c.text.as_str()),
        photo_ref: first(candidates, |c| c.photo_ref.as_str()),
    }
}

/// Selector-based strategy
pub fn extract_structured(fragment: &str) -> Result<PartialRecord, HarvestError> {
    let document = Html::parse_fragment(fragment);

    let text_selector = selector(".tgme_widget_message_text")?;
    let photo_selector = selector(".tgme_widget_message_photo_wrap")?;
    let time_selector = selector("time[datetime]")?;
    let message_selector = selector(".tgme_widget_message[data-post]")?;

    let text = document
        .select(&text_selector)
        .next()
        .map(element_text)
        .unwrap_or_default();

    let photo_ref = document
        .select(&photo_selector)
        .next()
        .and_then(|element| element.value().attr("style"))
        .and_then(background_image_url)
        .unwrap_or_default();

    let timestamp = document
        .select(&time_selector)
        .next()
        .and_then(|element| element.value().attr("datetime"))
        .map(|value| value.trim().to_string())
        .unwrap_or_default();

    let id = document
        .select(&message_selector)
        .next()
        .and_then(|element| element.value().attr("data-post"))
        .and_then(post_id)
        .unwrap_or_default();

    Ok(PartialRecord {
        id,
        timestamp,
        text,
        photo_ref,
    })
}

/// Regex-based strategy over the raw markup
pub fn extract_pattern(fragment: &str) -> PartialRecord {
    let capture = |pattern: &Regex| {
        pattern
            .captures(fragment)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    };

    let text = TEXT_PATTERN
        .captures(fragment)
        .and_then(|caps| caps.get(1))
        .map(|m| clean_markup(m.as_str()))
        .unwrap_or_default();

    PartialRecord {
        id: capture(&ID_PATTERN),
        timestamp: capture(&DATE_PATTERN),
        text,
        photo_ref: decode_html_entities(&capture(&PHOTO_PATTERN)).into_owned(),
    }
}

/// Pulls the URL out of a `background-image:url(...)` declaration
///
/// Quotes around the URL are optional and removed.
///
/// ```
/// use channel_harvester::harvest::background_image_url;
///
/// let style = "width:100%;background-image:url('https://cdn.example/p.jpg')";
/// assert_eq!(
///     background_image_url(style).as_deref(),
///     Some("https://cdn.example/p.jpg")
/// );
/// ```
pub fn background_image_url(style: &str) -> Option<String> {
    let declaration = &style[style.find("background-image")?..];
    let value = &declaration[declaration.find("url(")? + "url(".len()..];
    let value = &value[..value.find(')')?];

    let url = value.trim().trim_matches(|c| c == '\'' || c == '"').trim();
    (!url.is_empty()).then(|| url.to_string())
}

/// `data-post` is `<channel>/<id>`
fn post_id(data_post: &str) -> Option<String> {
    data_post
        .rsplit('/')
        .next()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Visible text of an element, with `<br>` kept as line breaks
fn element_text(element: ElementRef<'_>) -> String {
    let mut text = String::new();
    for node in element.descendants() {
        match node.value() {
            Node::Text(fragment) => text.push_str(fragment),
            Node::Element(el) if el.name() == "br" => text.push('\n'),
            _ => {}
        }
    }
    text.trim().to_string()
}

/// Strips tags from raw markup and decodes entities
fn clean_markup(markup: &str) -> String {
    let with_breaks = BREAK_PATTERN.replace_all(markup, "\n");
    let stripped = TAG_PATTERN.replace_all(&with_breaks, "");
    decode_html_entities(&stripped).trim().to_string()
}

fn selector(css: &str) -> Result<Selector, HarvestError> {
    Selector::parse(css)
        .map_err(|e| HarvestError::Extract(format!("invalid selector '{}': {:?}", css, e)))
}
