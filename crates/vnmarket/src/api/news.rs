//! News client for the WordPress-backed content API

use crate::api::http::{Envelope, HttpClient};
use crate::config::MarketConfig;
use crate::error::{MarketError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::LazyLock;

static TAG_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").ok());
static SPACE_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\s+").ok());

/// News post
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Post {
    pub id: u64,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub date: Option<String>,
    pub author: Option<String>,
    pub featured_image: Option<String>,
    pub categories: Vec<String>,
}

impl Post {
    /// Excerpt with markup removed and entities decoded
    pub fn plain_excerpt(&self) -> String {
        strip_html(&self.excerpt)
    }

    pub fn plain_title(&self) -> String {
        strip_html(&self.title)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl Pagination {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub pagination: Pagination,
}

/// Listing filter
#[derive(Debug, Clone, Default)]
pub struct PostQuery {
    pub page: u32,
    pub per_page: Option<u32>,
    pub category: Option<String>,
}

/// Single post lookup key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostRef {
    Id(u64),
    Slug(String),
}

impl PostRef {
    /// Numeric input is an id, anything else a slug
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(MarketError::InvalidInput("post id or slug is empty".to_string()));
        }
        Ok(input
            .parse::<u64>()
            .map_or_else(|_| PostRef::Slug(input.to_string()), PostRef::Id))
    }
}

/// Single-post responses arrive as `{ data }`, `{ post }` or bare
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PostBody {
    Named { post: Post },
    Other(Envelope<Post>),
}

#[derive(Debug, Clone)]
pub struct NewsClient {
    http: HttpClient,
    default_per_page: u32,
}

impl NewsClient {
    pub fn new(config: &MarketConfig) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(
                &config.news_api_base,
                config.request_timeout,
                config.requests_per_minute,
            )?,
            default_per_page: config.news_per_page,
        })
    }

    /// `GET /posts?page&per_page[&category]`
    pub async fn list_posts(&self, query: &PostQuery) -> Result<PostPage> {
        let mut params: Vec<(&str, String)> = vec![
            ("page", query.page.max(1).to_string()),
            (
                "per_page",
                query.per_page.unwrap_or(self.default_per_page).to_string(),
            ),
        ];
        if let Some(category) = query.category.as_deref().filter(|c| !c.trim().is_empty()) {
            params.push(("category", category.trim().to_string()));
        }

        let page: Envelope<PostPage> = self.http.get_json("posts", &params).await?;
        Ok(page.into_inner())
    }

    /// `GET /posts/{id}` or `GET /posts/slug/{slug}`
    pub async fn post(&self, post: &PostRef) -> Result<Post> {
        let path = match post {
            PostRef::Id(id) => format!("posts/{id}"),
            PostRef::Slug(slug) => format!("posts/slug/{}", url_segment(slug)),
        };
        let body: PostBody = self.http.get_json(&path, &[] as &[(&str, &str)]).await?;
        Ok(match body {
            PostBody::Named { post } => post,
            PostBody::Other(envelope) => envelope.into_inner(),
        })
    }
}

fn url_segment(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .collect()
}

/// Remove tags, decode the entities WordPress emits, collapse whitespace
pub fn strip_html(html: &str) -> String {
    let text = replace_all(TAG_RE.as_ref(), html, " ");
    let text = decode_entities(&text);
    replace_all(SPACE_RE.as_ref(), &text, " ").trim().to_string()
}

fn replace_all<'a>(re: Option<&Regex>, text: &'a str, with: &str) -> Cow<'a, str> {
    re.map_or(Cow::Borrowed(text), |re| re.replace_all(text, with))
}

fn decode_entities(s: &str) -> String {
    const ENTITIES: [(&str, &str); 11] = [
        ("&nbsp;", " "),
        ("&#8217;", "\u{2019}"),
        ("&#8216;", "\u{2018}"),
        ("&#8220;", "\u{201c}"),
        ("&#8221;", "\u{201d}"),
        ("&#8211;", "\u{2013}"),
        ("&hellip;", "\u{2026}"),
        ("&#8230;", "\u{2026}"),
        ("&quot;", "\""),
        ("&#039;", "'"),
        ("&lt;", "<"),
    ];

    let mut out = s.to_string();
    for (entity, replacement) in ENTITIES {
        out = out.replace(entity, replacement);
    }
    // &amp; last so "&amp;lt;" stays literal
    out.replace("&gt;", ">").replace("&amp;", "&")
}
