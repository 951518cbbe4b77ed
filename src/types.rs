use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// Rate limit headers as sent by the API alongside every response (and on 429s).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct RateMeta {
    pub limit: Option<i64>,
    pub remaining: Option<i64>,
    pub reset_at: Option<String>,
    pub retry_after_secs: Option<u64>,
}

impl RateMeta {
    pub fn retry_after(&self) -> Option<Duration> {
        self.retry_after_secs.map(Duration::from_secs)
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

fn header_i64(headers: &HeaderMap, name: &str) -> Option<i64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<i64>().ok())
}

pub fn extract_rate(headers: &HeaderMap) -> RateMeta {
    let limit = header_i64(headers, "x-ratelimit-limit");
    let remaining = header_i64(headers, "x-ratelimit-remaining");
    let reset_at = header_i64(headers, "x-ratelimit-reset")
        .and_then(|epoch| chrono::DateTime::<chrono::Utc>::from_timestamp(epoch, 0))
        .map(|ts| ts.to_rfc3339());
    let retry_after_secs = headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok());
    RateMeta {
        limit,
        remaining,
        reset_at,
        retry_after_secs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_headers() {
        let mut h = HeaderMap::new();
        h.insert("x-ratelimit-limit", "60".parse().unwrap());
        h.insert("x-ratelimit-remaining", "0".parse().unwrap());
        h.insert("x-ratelimit-reset", "0".parse().unwrap());
        h.insert("retry-after", "17".parse().unwrap());
        let rate = extract_rate(&h);
        assert_eq!(rate.limit, Some(60));
        assert_eq!(rate.remaining, Some(0));
        assert_eq!(rate.reset_at.as_deref(), Some("1970-01-01T00:00:00+00:00"));
        assert_eq!(rate.retry_after(), Some(Duration::from_secs(17)));
    }

    #[test]
    fn missing_headers_yield_empty_meta() {
        let rate = extract_rate(&HeaderMap::new());
        assert!(rate.is_empty());
        assert_eq!(rate.retry_after(), None);
    }
}
