use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{node::Element, ElementRef, Html, Selector};
use serde_json::Value;
use url::Url;

use crate::models::ListingImage;

// ── Constants ────────────────────────────────────────────────────────────────

pub const MAX_IMAGES: usize = 18;
const CARD_CLASS_NEEDLES: &[&str] = &["img-card", "media", "photo"];
const STRUCTURED_IMAGE_KEYS: &[&str] = &["image", "images", "photo", "photos", "contentUrl"];

// ── Lazy static regexes ──────────────────────────────────────────────────────

static IMAGE_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(?:jpg|jpeg|png|webp)(?:\?.*)?$").unwrap());

static ADDRESS_LIKE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)[0-9]|\b(?:Ave|Avenue|St|Street|Rd|Road|Ln|Lane|Dr|Drive|Way|Blvd|Boulevard|Ct|Court|Cir|Circle|Pl|Place|Trail|Hwy|Highway)\b",
    )
    .unwrap()
});

static LOGO_CAPTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:logo|icon|avatar|flag|equal housing|mls|redfin|zillow|realtor)\b")
        .unwrap()
});

static LOGO_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)logo|icon|flag|equal-housing|mls").unwrap());

static BLOCKED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)flag|logo|icon|equal-housing|mls|footer|favicon|sprite|badge|watermark|tracking|analytics",
    )
    .unwrap()
});

static BLOCKED_PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)/vLATEST/images/|/images/footer/").unwrap());

static GENERIC_IMAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)https?://[^"'\s>]+\.(?:jpg|jpeg|png|webp)(?:\?[^"'\s>]*)?"#).unwrap()
});

static REDFIN_IMAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)https://ssl\.cdn-redfin\.com/[^"'\s>]+\.(?:jpg|jpeg|png|webp)(?:\?[^"'\s>]*)?"#,
    )
    .unwrap()
});

static ZILLOW_IMAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)https://photos\.zillowstatic\.com/[^"'\s>]+\.(?:jpg|jpeg|png|webp)(?:\?[^"'\s>]*)?"#,
    )
    .unwrap()
});

static IMG_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());

static IMG_OR_NOSCRIPT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("img, noscript").unwrap());

static LD_JSON_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"script[type="application/ld+json" i]"#).unwrap());

static AMPERSAND_ENTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)&amp;|&#0*38;|&#x0*26;|\\u0026").unwrap());

// ── Site dispatch ────────────────────────────────────────────────────────────

/// Listing marketplaces with a dedicated photo CDN pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingSite {
    Redfin,
    Zillow,
    Generic,
}

impl ListingSite {
    pub fn from_hostname(hostname: &str) -> Self {
        let host = hostname.to_lowercase();
        if host.contains("redfin.com") {
            ListingSite::Redfin
        } else if host.contains("zillow.com") {
            ListingSite::Zillow
        } else {
            ListingSite::Generic
        }
    }

    fn pattern(self) -> &'static Regex {
        match self {
            ListingSite::Redfin => &REDFIN_IMAGE_RE,
            ListingSite::Zillow => &ZILLOW_IMAGE_RE,
            ListingSite::Generic => &GENERIC_IMAGE_RE,
        }
    }

    /// Site CDNs also serve thumbnails and chrome; keep only full-size listing photos.
    fn accepts(self, url: &str) -> bool {
        match self {
            ListingSite::Redfin => url.contains("/photo/") && url.contains("bigphoto"),
            ListingSite::Zillow => url.contains("/p/") || url.contains("/fp/"),
            ListingSite::Generic => true,
        }
    }
}

// ── Ordered image set ────────────────────────────────────────────────────────

#[derive(Default)]
struct ImageSet {
    images: Vec<ListingImage>,
    index: HashMap<String, usize>,
}

impl ImageSet {
    fn insert(&mut self, url: String) {
        if self.index.contains_key(&url) {
            return;
        }
        self.index.insert(url.clone(), self.images.len());
        self.images.push(ListingImage { url, title: None });
    }

    /// Captioned images come from `<img>` tags only; the latest caption wins.
    fn insert_captioned(&mut self, image: ListingImage) {
        match self.index.get(&image.url).copied() {
            Some(idx) => self.images[idx].title = image.title,
            None => {
                self.index.insert(image.url.clone(), self.images.len());
                self.images.push(image);
            }
        }
    }

    fn into_filtered(self, limit: usize) -> Vec<ListingImage> {
        self.images
            .into_iter()
            .filter(|image| !is_blocked(&image.url))
            .take(limit)
            .collect()
    }
}

// ── Public API ───────────────────────────────────────────────────────────────

/// Pick the property photos out of a fetched listing page.
///
/// `hostname` is the host of the listing URL and selects the site-specific
/// CDN pattern. Runs three strategies in order (captioned `<img>` tags,
/// JSON-LD blocks, raw URL patterns), merges them in first-seen order, drops
/// logos and tracking assets, and returns at most [`MAX_IMAGES`] entries.
///
/// Malformed markup or JSON never fails the call; the affected source simply
/// contributes nothing. Blank `html` yields an empty list.
pub fn extract_listing_images(html: &str, hostname: &str) -> Vec<ListingImage> {
    if html.trim().is_empty() {
        return Vec::new();
    }

    let hostname = hostname.trim().to_lowercase();
    let site = ListingSite::from_hostname(&hostname);
    let base = base_url(&hostname);
    let document = Html::parse_document(html);

    let mut images = ImageSet::default();

    let tagged = extract_tag_images(&document, base.as_ref());
    let tagged_count = tagged.len();
    for image in tagged {
        images.insert_captioned(image);
    }

    let structured = extract_structured_images(&document, base.as_ref());
    let structured_count = structured.len();
    for url in structured {
        images.insert(url);
    }

    let patterned = extract_pattern_images(html, site);
    let patterned_count = patterned.len();
    for url in patterned {
        images.insert(url);
    }

    let result = images.into_filtered(MAX_IMAGES);
    tracing::debug!(
        hostname = %hostname,
        ?site,
        tagged = tagged_count,
        structured = structured_count,
        patterned = patterned_count,
        kept = result.len(),
        "extracted listing images"
    );
    result
}

/// True when `value` ends in a photo extension, optionally followed by a query.
pub fn is_image_url(value: &str) -> bool {
    IMAGE_SUFFIX_RE.is_match(value)
}

fn is_blocked(url: &str) -> bool {
    BLOCKED_RE.is_match(url) || BLOCKED_PATH_RE.is_match(url)
}

// ── URL resolution ───────────────────────────────────────────────────────────

fn base_url(hostname: &str) -> Option<Url> {
    if hostname.is_empty() {
        return None;
    }
    Url::parse(&format!("https://{}/", hostname)).ok()
}

fn has_http_scheme(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Absolute URLs are kept verbatim so the same photo found by several
/// strategies dedupes; anything else is joined onto the listing host.
fn resolve_image_url(raw: &str, base: Option<&Url>) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let url = if has_http_scheme(raw) {
        raw.to_string()
    } else {
        let joined = base?.join(raw).ok()?;
        if !matches!(joined.scheme(), "http" | "https") {
            return None;
        }
        joined.to_string()
    };
    is_image_url(&url).then_some(url)
}

// ── Strategy 1: captioned <img> tags ─────────────────────────────────────────

/// `<noscript>` bodies are raw text to the parser, so gallery fallbacks inside
/// them are re-parsed as fragments. Document order is kept.
fn extract_tag_images(document: &Html, base: Option<&Url>) -> Vec<ListingImage> {
    let mut found = Vec::new();
    for el in document.select(&IMG_OR_NOSCRIPT_SELECTOR) {
        if el.value().name() == "noscript" {
            let fragment = Html::parse_fragment(&el.text().collect::<String>());
            found.extend(
                fragment
                    .select(&IMG_SELECTOR)
                    .filter_map(|img| captioned_listing_photo(img, base)),
            );
        } else if let Some(image) = captioned_listing_photo(el, base) {
            found.push(image);
        }
    }
    found
}

fn captioned_listing_photo(img: ElementRef<'_>, base: Option<&Url>) -> Option<ListingImage> {
    let v = img.value();
    let src = v.attr("src")?;
    if !is_image_url(src.trim()) {
        return None;
    }

    let class = v.attr("class").unwrap_or("");
    if !CARD_CLASS_NEEDLES.iter().any(|n| class.contains(n)) {
        return None;
    }

    let caption = non_empty_attr(v, "alt").or_else(|| non_empty_attr(v, "title"))?;
    if !ADDRESS_LIKE_RE.is_match(caption)
        || LOGO_CAPTION_RE.is_match(caption)
        || LOGO_URL_RE.is_match(src)
    {
        return None;
    }

    let url = resolve_image_url(src, base)?;
    Some(ListingImage {
        url,
        title: Some(caption.to_string()),
    })
}

fn non_empty_attr<'a>(el: &'a Element, name: &str) -> Option<&'a str> {
    el.attr(name).filter(|s| !s.is_empty())
}

// ── Strategy 2: JSON-LD structured data ──────────────────────────────────────

fn extract_structured_images(document: &Html, base: Option<&Url>) -> Vec<String> {
    let mut found = Vec::new();
    for (block, script) in document.select(&LD_JSON_SELECTOR).enumerate() {
        let text = script.text().collect::<String>();
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => collect_structured_images(&value, base, &mut found),
            Err(e) => tracing::debug!(block, error = %e, "skipping malformed ld+json block"),
        }
    }
    found
}

/// Walks image-bearing keys plus every nested object or array. This also picks
/// up image URLs of unrelated entities sharing the same graph.
fn collect_structured_images(value: &Value, base: Option<&Url>, found: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            if let Some(url) = resolve_image_url(s, base) {
                found.push(url);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_structured_images(item, base, found);
            }
        }
        Value::Object(map) => {
            for (key, nested) in map {
                if STRUCTURED_IMAGE_KEYS.contains(&key.as_str())
                    || matches!(nested, Value::Object(_) | Value::Array(_))
                {
                    collect_structured_images(nested, base, found);
                }
            }
        }
        _ => {}
    }
}

// ── Strategy 3: raw URL patterns ─────────────────────────────────────────────

/// Raw markup still carries escaped ampersands; decode them so a match keys
/// the same as the parsed `src` or JSON string of the same photo.
fn extract_pattern_images(html: &str, site: ListingSite) -> Vec<String> {
    let mut seen = HashSet::new();
    site.pattern()
        .find_iter(html)
        .map(|m| AMPERSAND_ENTITY_RE.replace_all(m.as_str(), "&").into_owned())
        .filter(|url| site.accepts(url))
        .filter(|url| seen.insert(url.clone()))
        .collect()
}
