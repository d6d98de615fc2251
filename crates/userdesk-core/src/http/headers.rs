//! Response header extraction

use std::collections::BTreeMap;
use std::fmt;

use reqwest::header::HeaderMap;
use serde::{Serialize, Serializer};

/// Header whose value is coerced to an integer
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// A single normalized header value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderField {
    Text(String),
    Count(i64),
    /// The count header was present but not numeric
    NotANumber,
}

impl HeaderField {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            HeaderField::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_count(&self) -> Option<i64> {
        match self {
            HeaderField::Count(count) => Some(*count),
            _ => None,
        }
    }
}

impl fmt::Display for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderField::Text(text) => f.write_str(text),
            HeaderField::Count(count) => write!(f, "{}", count),
            HeaderField::NotANumber => f.write_str("NaN"),
        }
    }
}

impl Serialize for HeaderField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            HeaderField::Text(text) => serializer.serialize_str(text),
            HeaderField::Count(count) => serializer.serialize_i64(*count),
            HeaderField::NotANumber => serializer.serialize_none(),
        }
    }
}

/// Normalized response headers, keyed by lowercase header name
pub type ResponseHeaders = BTreeMap<String, HeaderField>;

/// Convert raw response headers into a typed mapping
///
/// Every key is kept. Repeated headers are joined with `", "`.
pub fn extract_headers(raw: &HeaderMap) -> ResponseHeaders {
    let mut headers = ResponseHeaders::new();

    for name in raw.keys() {
        let joined = raw
            .get_all(name)
            .iter()
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .collect::<Vec<_>>()
            .join(", ");

        let field = if name.as_str() == TOTAL_COUNT_HEADER {
            parse_count(&joined)
        } else {
            HeaderField::Text(joined)
        };
        headers.insert(name.as_str().to_string(), field);
    }

    headers
}

/// Parse a count the way base-10 `parseInt` does: skip leading whitespace,
/// accept a sign, take the longest run of digits and ignore the rest
pub fn parse_count(value: &str) -> HeaderField {
    let trimmed = value.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits_len = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits_len == 0 {
        return HeaderField::NotANumber;
    }

    let digits = &rest[..digits_len];
    let parsed = if negative {
        format!("-{}", digits).parse::<i64>()
    } else {
        digits.parse::<i64>()
    };

    parsed.map(HeaderField::Count).unwrap_or(HeaderField::NotANumber)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_count_header_is_numeric() {
        let mut raw = HeaderMap::new();
        raw.insert("x-total-count", HeaderValue::from_static("42"));
        raw.insert("content-type", HeaderValue::from_static("application/json"));

        let headers = extract_headers(&raw);
        assert_eq!(headers["x-total-count"], HeaderField::Count(42));
        assert_eq!(headers["content-type"].as_text(), Some("application/json"));

        let json = serde_json::to_value(&headers).unwrap();
        assert_eq!(json["x-total-count"], serde_json::json!(42));
    }

    #[test]
    fn test_count_header_not_a_number() {
        let mut raw = HeaderMap::new();
        raw.insert("x-total-count", HeaderValue::from_static("many"));

        let headers = extract_headers(&raw);
        assert_eq!(headers["x-total-count"], HeaderField::NotANumber);
        assert!(serde_json::to_value(&headers).unwrap()["x-total-count"].is_null());
    }

    #[test]
    fn test_repeated_headers_are_joined() {
        let mut raw = HeaderMap::new();
        raw.append("set-cookie", HeaderValue::from_static("a=1"));
        raw.append("set-cookie", HeaderValue::from_static("b=2"));

        let headers = extract_headers(&raw);
        assert_eq!(headers.len(), 1);
        assert_eq!(headers["set-cookie"].as_text(), Some("a=1, b=2"));
    }

    #[test]
    fn test_parse_count_like_parse_int() {
        assert_eq!(parse_count("  17"), HeaderField::Count(17));
        assert_eq!(parse_count("-3"), HeaderField::Count(-3));
        assert_eq!(parse_count("+8"), HeaderField::Count(8));
        assert_eq!(parse_count("12abc"), HeaderField::Count(12));
        assert_eq!(parse_count("3.9"), HeaderField::Count(3));
        assert_eq!(parse_count(""), HeaderField::NotANumber);
        assert_eq!(parse_count("-"), HeaderField::NotANumber);
        assert_eq!(parse_count("abc12"), HeaderField::NotANumber);
        assert_eq!(parse_count("99999999999999999999"), HeaderField::NotANumber);
    }
}
