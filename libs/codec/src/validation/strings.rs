//! String validators

use once_cell::sync::Lazy;
use regex::Regex;
use std::net::IpAddr;

/// At least one character
pub fn is_not_empty(value: &str) -> bool {
    !value.is_empty()
}

/// At least one non-whitespace character
pub fn is_not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

/// IP literal or RFC 1123 host name
pub fn is_hostname(value: &str) -> bool {
    if value.parse::<IpAddr>().is_ok() {
        return true;
    }

    let name = value.strip_suffix('.').unwrap_or(value);
    if name.is_empty() || name.len() > 253 {
        return false;
    }

    name.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
    })
}

/// Anchored regular expression with a documented maximum length
#[derive(Debug)]
pub struct PatternValidator {
    pattern: Lazy<Regex>,
    max_length: usize,
}

impl PatternValidator {
    const fn new(pattern: Lazy<Regex>, max_length: usize) -> Self {
        Self {
            pattern,
            max_length,
        }
    }

    /// Maximum accepted length in bytes
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn is_valid(&self, value: &str) -> bool {
        value.len() <= self.max_length && self.pattern.is_match(value)
    }

    pub fn is_not_valid(&self, value: &str) -> bool {
        !self.is_valid(value)
    }
}

/// Beanstalk tube names: up to 200 bytes, may not start with a hyphen
pub static BEANSTALK_TUBE: PatternValidator = PatternValidator::new(
    Lazy::new(|| {
        Regex::new(r"(?i)^[a-z0-9+/;.$_)(][-a-z0-9+/;.$_)(]{0,199}$")
            .expect("tube pattern is a valid regex")
    }),
    200,
);

/// Kinesis stream names: 1 to 128 characters of `[a-zA-Z0-9_.-]`
pub static KINESIS_STREAM: PatternValidator = PatternValidator::new(
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_.-]{1,128}$").expect("stream pattern is a valid regex")),
    128,
);
