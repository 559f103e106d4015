use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::normalize_text;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleImage {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub date: DateTime<Utc>,
    /// Dedup key.
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// `positive` | `neutral` | `negative`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<String>,
    /// Comma-joined tickers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbols: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(default)]
    pub images: Vec<ArticleImage>,
}

impl NewsArticle {
    /// Adapt one upstream news row. Rows without a usable title are dropped.
    pub fn from_upstream(raw: &Value) -> Option<Self> {
        let obj = raw.as_object()?;
        let title = obj
            .get("title")
            .and_then(Value::as_str)
            .map(normalize_text)
            .filter(|t| !t.is_empty())?;

        let text_field = |key: &str| -> Option<String> {
            obj.get(key)
                .and_then(Value::as_str)
                .map(normalize_text)
                .filter(|s| !s.is_empty())
        };
        let plain_field = |key: &str| -> Option<String> {
            obj.get(key)
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        Some(Self {
            date: obj.get("date").map(parse_date).unwrap_or(DateTime::UNIX_EPOCH),
            title,
            text: text_field("text"),
            url: plain_field("url"),
            source: plain_field("source"),
            author: plain_field("author"),
            summary: text_field("summary"),
            sentiment: plain_field("sentiment").map(|s| s.to_ascii_lowercase()),
            symbols: joined(obj.get("symbols")),
            tags: joined(obj.get("tags")),
            images: obj
                .get("images")
                .and_then(Value::as_array)
                .map(|imgs| imgs.iter().filter_map(image).collect())
                .unwrap_or_default(),
        })
    }

    /// Exact ticker match against the comma-joined list.
    pub fn mentions(&self, symbol: &str) -> bool {
        self.symbols.as_deref().is_some_and(|list| {
            list.split(',')
                .any(|s| s.trim().eq_ignore_ascii_case(symbol.trim()))
        })
    }

    /// Case-insensitive substring search over title, text, tags and symbols.
    pub fn matches_query(&self, query: &str) -> bool {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return false;
        }
        std::iter::once(Some(self.title.as_str()))
            .chain([
                self.text.as_deref(),
                self.tags.as_deref(),
                self.symbols.as_deref(),
            ])
            .flatten()
            .any(|field| field.to_lowercase().contains(&q))
    }
}

/// Unparseable or missing dates sort last.
fn parse_date(v: &Value) -> DateTime<Utc> {
    let Some(s) = v.as_str().map(str::trim) else {
        return DateTime::UNIX_EPOCH;
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return naive.and_utc();
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|n| n.and_utc())
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Vendors send either `"A,B"` or `["A", "B"]`.
fn joined(v: Option<&Value>) -> Option<String> {
    let out = match v? {
        Value::String(s) => s.trim().to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(","),
        _ => return None,
    };
    (!out.is_empty()).then_some(out)
}

fn image(v: &Value) -> Option<ArticleImage> {
    match v {
        Value::String(url) if !url.trim().is_empty() => Some(ArticleImage {
            url: url.trim().to_string(),
            caption: None,
        }),
        Value::Object(o) => Some(ArticleImage {
            url: o.get("url").and_then(Value::as_str)?.trim().to_string(),
            caption: o
                .get("caption")
                .and_then(Value::as_str)
                .map(str::to_string),
        }),
        _ => None,
    }
}
