//! News headline extraction.
//!
//! Containers are located by `<article>` tags, then class keywords, then
//! linked headings, then links whose href looks like a story. Field
//! extraction is the same for every strategy.

use std::collections::HashSet;
use std::sync::OnceLock;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use scraper::{ElementRef, Html};
use url::Url;

use super::{
    class_contains, element_text, in_excluded_subtree, nearest_ancestor, selector, DiscardReason,
    Extraction, RowLocator, RowOutcome, StrategyChain,
};
use crate::models::{NewsArticle, Sentiment};
use crate::report::NewsFeed;
use crate::validation::validate_article;

/// Headlines taken from a page when it has no bucketed news sections.
pub const HEADLINE_LIMIT: usize = 10;

/// Articles taken from each bucketed news section.
pub const SECTION_LIMIT: usize = 5;

const CONTAINER_KEYWORDS: &[&str] = &[
    "headline",
    "news-item",
    "article-item",
    "news-article",
    "headline-item",
    "story",
    "news-story",
    "feed-item",
    "post-preview",
];

const SECTION_KEYWORDS: &[&str] = &["news", "headlines", "articles", "stories"];
const ITEM_KEYWORDS: &[&str] = &["item", "article", "story", "post", "headline"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%B %d, %Y %H:%M",
    "%d %B %Y %H:%M",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%B %d, %Y", "%d %B %Y", "%m/%d/%Y", "%d/%m/%Y", "%d-%m-%Y",
];

const TIMESTAMP_ATTRS: &[&str] = &["data-time", "datetime", "timestamp", "pubdate"];

fn story_href_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)/news/|/article|/story|/(?:19|20)\d{2}(?:/|-|$)").ok())
        .as_ref()
}

fn relative_time_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(\d{1,4})\s*(minutes?|mins?|hours?|hrs?|days?)\s+ago\b").ok()
    })
    .as_ref()
}

fn time_in_text_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"(?i)\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}(?::\d{2})?",
            r"|\b(?:january|february|march|april|may|june|july|august|september|october",
            r"|november|december)\s+\d{1,2},\s+\d{4}",
            r"|\b\d{1,4}\s*(?:minutes?|mins?|hours?|hrs?|days?)\s+ago\b",
            r"|\byesterday\b",
        ))
        .ok()
    })
    .as_ref()
}

/// Every `<article>` element.
pub struct ArticleTagLocator;

impl RowLocator for ArticleTagLocator {
    fn name(&self) -> &str {
        "article-tag"
    }

    fn locate<'a>(&self, doc: &'a Html) -> Vec<ElementRef<'a>> {
        let Some(sel) = selector("article") else {
            return Vec::new();
        };
        doc.select(&sel)
            .filter(|el| !in_excluded_subtree(*el))
            .collect()
    }
}

/// Elements whose class contains the first keyword that matches anything.
pub struct ContainerClassLocator {
    pub keywords: &'static [&'static str],
}

impl RowLocator for ContainerClassLocator {
    fn name(&self) -> &str {
        "container-class"
    }

    fn locate<'a>(&self, doc: &'a Html) -> Vec<ElementRef<'a>> {
        let Some(sel) = selector("[class]") else {
            return Vec::new();
        };
        for keyword in self.keywords {
            let found: Vec<_> = doc
                .select(&sel)
                .filter(|el| class_contains(*el, &[*keyword]) && !in_excluded_subtree(*el))
                .collect();
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }
}

fn dedup_containers<'a>(
    anchors: impl Iterator<Item = ElementRef<'a>>,
    container_tags: &[&str],
) -> Vec<ElementRef<'a>> {
    let mut seen = HashSet::new();
    anchors
        .filter_map(|el| nearest_ancestor(el, container_tags))
        .filter(|c| !in_excluded_subtree(*c))
        .filter(|c| seen.insert(c.id()))
        .collect()
}

/// Containers of h1-h3 headings that hold a link and more than 10 characters.
pub struct HeadingLinkLocator;

impl RowLocator for HeadingLinkLocator {
    fn name(&self) -> &str {
        "heading-link"
    }

    fn locate<'a>(&self, doc: &'a Html) -> Vec<ElementRef<'a>> {
        let (Some(headings), Some(anchor)) = (selector("h1, h2, h3"), selector("a")) else {
            return Vec::new();
        };
        let linked = doc.select(&headings).filter(|h| {
            !in_excluded_subtree(*h)
                && h.select(&anchor).next().is_some()
                && element_text(*h).chars().count() > 10
        });
        dedup_containers(linked, &["div", "section", "article", "li"])
    }
}

/// Containers of links whose href looks like a story URL.
pub struct StoryLinkLocator;

impl RowLocator for StoryLinkLocator {
    fn name(&self) -> &str {
        "story-link"
    }

    fn locate<'a>(&self, doc: &'a Html) -> Vec<ElementRef<'a>> {
        let (Some(links), Some(re)) = (selector("a[href]"), story_href_re()) else {
            return Vec::new();
        };
        let matching = doc.select(&links).filter(|a| {
            !in_excluded_subtree(*a) && a.value().attr("href").is_some_and(|h| re.is_match(h))
        });
        dedup_containers(matching, &["div", "li", "article"])
    }
}

/// The four-strategy headline chain.
pub fn headline_chain() -> StrategyChain {
    StrategyChain::new("news")
        .then(ArticleTagLocator)
        .then(ContainerClassLocator {
            keywords: CONTAINER_KEYWORDS,
        })
        .then(HeadingLinkLocator)
        .then(StoryLinkLocator)
}

/// Base for relative links: the document's `<base href>` when present.
pub fn document_base(doc: &Html, fallback: &Url) -> Url {
    selector("base[href]")
        .and_then(|sel| doc.select(&sel).next())
        .and_then(|el| el.value().attr("href"))
        .and_then(|href| fallback.join(href.trim()).ok())
        .unwrap_or_else(|| fallback.clone())
}

/// Absolute article URL for an href. Only `http(s)` and root-relative
/// links are accepted.
pub fn resolve_href(href: &str, base: &Url) -> Option<String> {
    let href = href.trim();
    let lower = href.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Some(href.to_string());
    }
    if href.starts_with('/') && !href.starts_with("//") {
        return base.join(href).ok().map(String::from);
    }
    None
}

fn parse_absolute(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, fmt) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|naive| Utc.from_utc_datetime(&naive));
        }
    }
    None
}

fn start_of_day(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .unwrap_or(dt)
}

fn parse_relative(value: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let lower = value.to_lowercase();
    if lower.contains("yesterday") {
        return Some(start_of_day(now - Duration::days(1)));
    }
    let caps = relative_time_re()?.captures(&lower)?;
    let amount: i64 = caps.get(1)?.as_str().parse().ok()?;
    let unit = caps.get(2)?.as_str();
    if unit.starts_with("min") {
        Some(now - Duration::minutes(amount))
    } else if unit.starts_with('h') {
        Some(now - Duration::hours(amount))
    } else {
        Some(start_of_day(now - Duration::days(amount)))
    }
}

/// Parses an absolute timestamp in one of the site's formats, or a
/// relative phrase ("3 hours ago", "yesterday") resolved against `now`.
/// Naive times are taken as UTC.
pub fn parse_timestamp(value: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    parse_absolute(value).or_else(|| parse_relative(value, now))
}

/// Publication time of an article container, if it carries one.
fn element_timestamp(el: ElementRef<'_>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    for attr in TIMESTAMP_ATTRS {
        if let Some(ts) = el.value().attr(attr).and_then(|v| parse_timestamp(v, now)) {
            return Some(ts);
        }
    }
    if let Some(time) = first_within(el, "time") {
        let from_attr = time
            .value()
            .attr("datetime")
            .and_then(|v| parse_timestamp(v, now));
        if let Some(ts) = from_attr.or_else(|| parse_timestamp(&element_text(time), now)) {
            return Some(ts);
        }
    }
    let text = element_text(el);
    time_in_text_re()?
        .find_iter(&text)
        .find_map(|m| parse_timestamp(m.as_str(), now))
}

/// First descendant of `el` (not `el` itself) matching `css`, outside
/// excluded subtrees.
fn first_within<'a>(el: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let sel = selector(css)?;
    el.select(&sel)
        .find(|e| e.id() != el.id() && !in_excluded_subtree(*e))
}

fn first_text_within(el: ElementRef<'_>, css: &str) -> Option<String> {
    first_within(el, css)
        .map(element_text)
        .filter(|t| !t.is_empty())
}

fn classed_text(el: ElementRef<'_>, keywords: &[&str]) -> Option<String> {
    let sel = selector("span, div, a")?;
    el.select(&sel)
        .filter(|e| e.id() != el.id() && !in_excluded_subtree(*e))
        .find(|e| class_contains(*e, keywords))
        .map(element_text)
        .filter(|t| !t.is_empty())
}

fn article_title(el: ElementRef<'_>) -> Option<String> {
    ["h1", "h2", "h3", "h4"]
        .iter()
        .find_map(|tag| first_text_within(el, tag))
        .or_else(|| first_text_within(el, "strong, b, .title, .headline"))
        .or_else(|| first_text_within(el, "a"))
}

fn article_url(el: ElementRef<'_>, base: &Url) -> Option<String> {
    let sel = selector("a[href]")?;
    let first = if el.value().name() == "a" && el.value().attr("href").is_some() {
        Some(el)
    } else {
        el.select(&sel).find(|a| !in_excluded_subtree(*a))
    };
    first
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| resolve_href(href, base))
}

const STRONG_UP: &[&str] = &["surg", "soar", "rall", "skyrocket", "boom", "record high"];
const STRONG_DOWN: &[&str] = &[
    "plung", "plummet", "slump", "tumbl", "crash", "collaps", "sell-off", "selloff",
];
const MILD_UP: &[&str] = &[
    "gain", "rise", "rose", "climb", "jump", "beat", "rebound", "upgrad", "improv",
];
const MILD_DOWN: &[&str] = &[
    "fall", "fell", "drop", "declin", "slid", "sink", "sank", "missed", "misses", "downgrad",
    "weak",
];

/// Coarse sentiment from headline wording.
///
/// Strong moves ("surge", "plunge") tag bullish or bearish, milder ones
/// ("gains", "falls") positive or negative. Balanced wording is neutral;
/// a headline with no market wording is untagged.
pub fn tag_sentiment(title: &str) -> Option<Sentiment> {
    let lower = title.to_lowercase();
    let tokens: Vec<&str> = lower
        .split(|c: char| !(c.is_alphanumeric() || c == '-'))
        .filter(|t| !t.is_empty())
        .collect();
    let hits = |stems: &[&str]| {
        stems
            .iter()
            .filter(|stem| {
                if stem.contains(' ') {
                    lower.contains(**stem)
                } else {
                    tokens.iter().any(|t| t.starts_with(**stem))
                }
            })
            .count()
    };

    let strong_up = hits(STRONG_UP);
    let strong_down = hits(STRONG_DOWN);
    let up = strong_up * 2 + hits(MILD_UP);
    let down = strong_down * 2 + hits(MILD_DOWN);

    match up.cmp(&down) {
        _ if up == 0 && down == 0 => None,
        std::cmp::Ordering::Equal => Some(Sentiment::Neutral),
        std::cmp::Ordering::Greater if strong_up > 0 => Some(Sentiment::Bullish),
        std::cmp::Ordering::Greater => Some(Sentiment::Positive),
        std::cmp::Ordering::Less if strong_down > 0 => Some(Sentiment::Bearish),
        std::cmp::Ordering::Less => Some(Sentiment::Negative),
    }
}

/// Turns one located container into an article.
pub fn extract_article(el: ElementRef<'_>, base: &Url) -> RowOutcome<NewsArticle> {
    let Some(title) = article_title(el) else {
        return RowOutcome::Discarded(DiscardReason::MissingField("title"));
    };
    let Some(url) = article_url(el, base) else {
        return RowOutcome::Discarded(DiscardReason::MissingField("url"));
    };
    let now = Utc::now();

    let article = NewsArticle {
        sentiment: tag_sentiment(&title),
        title,
        summary: first_text_within(el, "p, .summary, .excerpt, .description, .snippet"),
        timestamp: element_timestamp(el, now).unwrap_or(now),
        url,
        source: classed_text(el, &["source"]),
        category: classed_text(el, &["category", "tag", "topic"]),
    };

    match validate_article(article) {
        Ok(article) => RowOutcome::Accepted(article),
        Err(e) => RowOutcome::Discarded(DiscardReason::Rejected(e.to_string())),
    }
}

/// Extracts up to `limit` headlines. Links are resolved against the page's
/// `<base href>` or, failing that, `base_url`.
pub fn extract_headlines(html: &str, base_url: &Url, limit: usize) -> Extraction<NewsArticle> {
    let doc = Html::parse_document(html);
    let base = document_base(&doc, base_url);
    let chain = headline_chain();
    let Some((strategy, containers)) = chain.locate(&doc) else {
        return Extraction::default();
    };
    let outcomes = containers
        .into_iter()
        .take(limit)
        .map(|el| extract_article(el, &base));
    Extraction::collect(chain.label(), Some(strategy), outcomes)
}

/// Which feed bucket an article or section belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsBucket {
    Headlines,
    Earnings,
    Dividends,
}

/// True when `text` contains a keyword. Keywords of three characters or
/// fewer ("eps", "q1") must be whole words.
fn mentions(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| {
        if k.len() <= 3 {
            text.split(|c: char| !c.is_alphanumeric()).any(|w| w == *k)
        } else {
            text.contains(k)
        }
    })
}

/// Bucket for a whole news section, from its text.
pub fn section_bucket(text: &str) -> NewsBucket {
    let lower = text.to_lowercase();
    if mentions(&lower, &["earning", "quarterly results", "q1", "q2", "q3", "q4", "eps"]) {
        NewsBucket::Earnings
    } else if mentions(&lower, &["dividend", "payout", "yield"]) {
        NewsBucket::Dividends
    } else {
        NewsBucket::Headlines
    }
}

/// Bucket for a single article, from its title and summary.
pub fn article_bucket(article: &NewsArticle) -> NewsBucket {
    let summary = article.summary.as_deref().unwrap_or("");
    let text = format!("{} {}", article.title, summary).to_lowercase();
    if mentions(&text, &["earning", "quarterly", "eps", "profit", "revenue"]) {
        NewsBucket::Earnings
    } else if mentions(&text, &["dividend", "payout", "shareholder", "yield"]) {
        NewsBucket::Dividends
    } else {
        NewsBucket::Headlines
    }
}

impl NewsFeed {
    fn push(&mut self, bucket: NewsBucket, article: NewsArticle) {
        match bucket {
            NewsBucket::Headlines => self.market_headlines.push(article),
            NewsBucket::Earnings => self.earnings_announcements.push(article),
            NewsBucket::Dividends => self.dividend_news.push(article),
        }
    }
}

/// Items of a news section: item-classed descendants not nested in another
/// item of the same section.
fn section_items<'a>(section: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    let Some(sel) = selector("article[class], div[class], li[class]") else {
        return Vec::new();
    };
    section
        .select(&sel)
        .filter(|el| el.id() != section.id() && is_news_item(*el) && !in_excluded_subtree(*el))
        .filter(|el| {
            !el.ancestors()
                .take_while(|a| a.id() != section.id())
                .filter_map(ElementRef::wrap)
                .any(is_news_item)
        })
        .collect()
}

fn is_news_item(el: ElementRef<'_>) -> bool {
    class_contains(el, ITEM_KEYWORDS)
}

/// Sorts a news page into headlines, earnings and dividend buckets.
///
/// Sections classed `news`, `headlines`, `articles` or `stories` are
/// bucketed as a whole by their text, at most [`SECTION_LIMIT`] items each.
/// Inner sections are read before the sections that wrap them, and an item
/// is only ever used once. A page with no such sections falls back to the
/// headline chain, bucketing each article by its own wording.
pub fn extract_news_feed(html: &str, base_url: &Url) -> NewsFeed {
    let doc = Html::parse_document(html);
    let base = document_base(&doc, base_url);
    let mut feed = NewsFeed::default();

    if let Some(sel) = selector("section[class], div[class]") {
        let sections: Vec<ElementRef<'_>> = doc
            .select(&sel)
            .filter(|el| class_contains(*el, SECTION_KEYWORDS) && !in_excluded_subtree(*el))
            .collect();

        let mut claimed = HashSet::new();
        for section in sections.iter().rev() {
            let items: Vec<ElementRef<'_>> = section_items(*section)
                .into_iter()
                .filter(|item| {
                    !claimed.contains(&item.id())
                        && !item.ancestors().any(|a| claimed.contains(&a.id()))
                        && !item.descendants().any(|d| claimed.contains(&d.id()))
                })
                .take(SECTION_LIMIT)
                .collect();
            if items.is_empty() {
                continue;
            }
            let bucket = section_bucket(&element_text(*section));
            let label = format!("news:{:?}", bucket).to_lowercase();
            let outcomes: Vec<_> = items
                .iter()
                .map(|item| {
                    claimed.insert(item.id());
                    extract_article(*item, &base)
                })
                .collect();
            for article in Extraction::collect(&label, Some("section"), outcomes).records {
                feed.push(bucket, article);
            }
        }
    }

    if feed.is_empty() {
        for article in extract_headlines(html, base_url, HEADLINE_LIMIT).records {
            let bucket = article_bucket(&article);
            feed.push(bucket, article);
        }
    }
    feed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn base() -> Url {
        Url::parse("https://tradingeconomics.com").unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 15, 30, 0).unwrap()
    }

    #[test]
    fn article_tags_first() {
        let html = r#"<html><body>
            <article data-time="2025-03-14T09:00:00Z">
              <h2><a href="/news/1">Stocks rally on strong jobs data</a></h2>
              <p>Equities climbed across the board.</p>
              <span class="news-source">Reuters</span>
              <span class="category-label">Markets</span>
            </article>
            <div class="headline"><h3><a href="/news/2">Ignored because articles exist</a></h3></div>
        </body></html>"#;
        let ex = extract_headlines(html, &base(), 10);
        assert_eq!(ex.strategy.as_deref(), Some("article-tag"));
        assert_eq!(ex.records.len(), 1);
        let a = &ex.records[0];
        assert_eq!(a.title, "Stocks rally on strong jobs data");
        assert_eq!(a.url, "https://tradingeconomics.com/news/1");
        assert_eq!(a.summary.as_deref(), Some("Equities climbed across the board."));
        assert_eq!(a.source.as_deref(), Some("Reuters"));
        assert_eq!(a.category.as_deref(), Some("Markets"));
        assert_eq!(a.timestamp, Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap());
        assert_eq!(a.sentiment, Some(Sentiment::Bullish));
    }

    #[test]
    fn class_keyword_containers() {
        let html = r#"<ul>
            <li class="news-item"><a href="https://example.com/story/9">Oil prices fall on supply glut</a></li>
            <li class="news-item"><a href="javascript:void(0)">Broken link headline</a></li>
        </ul>"#;
        let ex = extract_headlines(html, &base(), 10);
        assert_eq!(ex.strategy.as_deref(), Some("container-class"));
        assert_eq!(ex.records.len(), 1);
        assert_eq!(ex.discarded, 1);
        assert_eq!(ex.records[0].url, "https://example.com/story/9");
        assert_eq!(ex.records[0].sentiment, Some(Sentiment::Negative));
    }

    #[test]
    fn heading_links_dedup_by_container() {
        let html = r#"<div id="feed">
            <div class="x"><h3><a href="/a/1">First market headline</a></h3><h2><a href="/a/1b">Second heading same box</a></h2></div>
            <div class="y"><h3><a href="/a/2">Another market headline</a></h3></div>
            <div class="z"><h3><a href="/a/3">Short</a></h3></div>
        </div>"#;
        let doc = Html::parse_document(html);
        let rows = HeadingLinkLocator.locate(&doc);
        assert_eq!(rows.len(), 2);
        let ex = extract_headlines(html, &base(), 10);
        assert_eq!(ex.strategy.as_deref(), Some("heading-link"));
        assert_eq!(ex.records[0].title, "Second heading same box");
    }

    #[test]
    fn story_links_last_resort() {
        let html = r#"<html><head><base href="https://mirror.example.org/"></head><body>
            <div><a href="/2025/03/14/fed-holds-rates">Fed holds rates steady</a></div>
            <div><a href="/about">About us</a></div>
            <nav><div><a href="/news/nav">Navigation news link</a></div></nav>
        </body></html>"#;
        let ex = extract_headlines(html, &base(), 10);
        assert_eq!(ex.strategy.as_deref(), Some("story-link"));
        assert_eq!(ex.records.len(), 1);
        assert_eq!(ex.records[0].url, "https://mirror.example.org/2025/03/14/fed-holds-rates");
        assert_eq!(ex.records[0].sentiment, None);
    }

    #[test]
    fn excluded_subtrees_never_contribute() {
        let html = r#"<header><article><h2><a href="/news/h">Header article headline</a></h2></article></header>
            <footer><div class="headline"><a href="/news/f">Footer headline text</a></div></footer>"#;
        let ex = extract_headlines(html, &base(), 10);
        assert!(ex.records.is_empty());
    }

    #[test]
    fn limit_applies_before_extraction() {
        let items: String = (0..15)
            .map(|i| {
                format!(r#"<article><h2><a href="/news/{i}">Headline number {i}</a></h2></article>"#)
            })
            .collect();
        let ex = extract_headlines(&items, &base(), 3);
        assert_eq!(ex.records.len(), 3);
    }

    #[test]
    fn short_title_rejected() {
        let html = r#"<article><h2><a href="/news/1">Hi</a></h2></article>"#;
        let ex = extract_headlines(html, &base(), 10);
        assert!(ex.records.is_empty());
        assert_eq!(ex.discarded, 1);
    }

    #[test]
    fn absolute_timestamp_formats() {
        let cases = [
            ("2025-01-15T14:30:00+02:00", (2025, 1, 15, 12, 30)),
            ("2025-01-15T14:30:00", (2025, 1, 15, 14, 30)),
            ("2025-01-15 14:30:00", (2025, 1, 15, 14, 30)),
            ("2025-01-15", (2025, 1, 15, 0, 0)),
            ("January 15, 2025 14:30", (2025, 1, 15, 14, 30)),
            ("January 15, 2025", (2025, 1, 15, 0, 0)),
            ("15 January 2025", (2025, 1, 15, 0, 0)),
            ("01/15/2025", (2025, 1, 15, 0, 0)),
            ("15/01/2025 14:30", (2025, 1, 15, 14, 30)),
            ("15-01-2025", (2025, 1, 15, 0, 0)),
        ];
        for (text, (y, mo, d, h, mi)) in cases {
            let ts = parse_timestamp(text, now()).unwrap_or_else(|| panic!("failed: {}", text));
            assert_eq!(
                (ts.year(), ts.month(), ts.day(), ts.hour(), ts.minute()),
                (y, mo, d, h, mi),
                "{}",
                text
            );
        }
    }

    #[test]
    fn relative_timestamps() {
        assert_eq!(parse_timestamp("5 minutes ago", now()), Some(now() - Duration::minutes(5)));
        assert_eq!(parse_timestamp("2 hours ago", now()), Some(now() - Duration::hours(2)));
        assert_eq!(
            parse_timestamp("Yesterday", now()),
            Some(Utc.with_ymd_and_hms(2025, 3, 13, 0, 0, 0).unwrap())
        );
        assert_eq!(
            parse_timestamp("3 days ago", now()),
            Some(Utc.with_ymd_and_hms(2025, 3, 11, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("sometime soon", now()), None);
        assert_eq!(parse_timestamp("", now()), None);
    }

    #[test]
    fn timestamp_from_time_tag_and_text() {
        let html = r#"<article><h2><a href="/news/1">Bond yields edge higher</a></h2>
            <time datetime="2025-02-01T08:00:00Z">Feb 1</time></article>
            <article><h2><a href="/news/2">Dollar steady ahead of data</a></h2>
            <span>Published 2025-02-02 10:15</span></article>"#;
        let ex = extract_headlines(html, &base(), 10);
        assert_eq!(ex.records[0].timestamp, Utc.with_ymd_and_hms(2025, 2, 1, 8, 0, 0).unwrap());
        assert_eq!(ex.records[1].timestamp, Utc.with_ymd_and_hms(2025, 2, 2, 10, 15, 0).unwrap());
    }

    #[test]
    fn href_resolution() {
        let b = base();
        assert_eq!(
            resolve_href("/news/1", &b).as_deref(),
            Some("https://tradingeconomics.com/news/1")
        );
        assert_eq!(resolve_href("HTTPS://x.org/a", &b).as_deref(), Some("HTTPS://x.org/a"));
        assert_eq!(resolve_href("mailto:a@b.c", &b), None);
        assert_eq!(resolve_href("news/1", &b), None);
        assert_eq!(resolve_href("//cdn.example.com/x", &b), None);
    }

    #[test]
    fn sentiment_tags() {
        assert_eq!(tag_sentiment("Gold surges to record high"), Some(Sentiment::Bullish));
        assert_eq!(tag_sentiment("Stocks plunge as bond yields spike"), Some(Sentiment::Bearish));
        assert_eq!(tag_sentiment("Retail sales rise 0.4%"), Some(Sentiment::Positive));
        assert_eq!(tag_sentiment("Euro falls against dollar"), Some(Sentiment::Negative));
        assert_eq!(tag_sentiment("Oil gains while gas drops"), Some(Sentiment::Neutral));
        assert_eq!(tag_sentiment("ECB publishes minutes"), None);
    }

    #[test]
    fn feed_sections_bucketed() {
        let html = r#"<div class="news-page">
            <section class="news-earnings"><h2>Earnings season</h2>
              <div class="news-item"><h3><a href="/news/e1">Apple tops estimates</a></h3></div>
            </section>
            <section class="news-dividends"><h2>Dividend payout watch</h2>
              <div class="news-item"><h3><a href="/news/d1">Exxon raises quarterly dividend</a></h3></div>
            </section>
            <section class="news-latest"><h2>Latest</h2>
              <div class="news-item"><h3><a href="/news/h1">Dollar steady before CPI data</a></h3></div>
            </section>
        </div>"#;
        let feed = extract_news_feed(html, &base());
        assert_eq!(feed.earnings_announcements.len(), 1);
        assert_eq!(feed.earnings_announcements[0].title, "Apple tops estimates");
        assert_eq!(feed.dividend_news.len(), 1);
        assert_eq!(feed.market_headlines.len(), 1);
        assert_eq!(feed.market_headlines[0].title, "Dollar steady before CPI data");
    }

    #[test]
    fn feed_section_limit() {
        let items: String = (0..8)
            .map(|i| {
                format!(r#"<li class="item"><a href="/news/{i}">Market headline {i}</a></li>"#)
            })
            .collect();
        let html = format!(r#"<div class="stories">{}</div>"#, items);
        let feed = extract_news_feed(&html, &base());
        assert_eq!(feed.market_headlines.len(), SECTION_LIMIT);
    }

    #[test]
    fn feed_falls_back_to_keyword_buckets() {
        let html = r#"
            <article><h2><a href="/news/1">Microsoft quarterly profit beats forecasts</a></h2></article>
            <article><h2><a href="/news/2">Utilities lift shareholder payouts</a></h2></article>
            <article><h2><a href="/news/3">Yen weakens past 150</a></h2></article>
            <article><h2><a href="/news/4">Analysts see EPS growth slowing</a></h2></article>"#;
        let feed = extract_news_feed(html, &base());
        assert_eq!(feed.earnings_announcements.len(), 2);
        assert_eq!(feed.dividend_news.len(), 1);
        assert_eq!(feed.market_headlines.len(), 1);
    }

    #[test]
    fn empty_and_malformed_html() {
        for html in ["", "<<<>>>", "<article>", "\u{0}junk"] {
            assert!(extract_headlines(html, &base(), 10).records.is_empty());
            assert!(extract_news_feed(html, &base()).is_empty());
        }
    }
}
