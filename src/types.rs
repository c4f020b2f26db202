//! Core domain types shared across the document model.

use serde::{Deserialize, Serialize};

/// A SHA-256 content hash as 64 lowercase hex chars.
/// Newtype prevents mixing with arbitrary strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(
    /// The hex-encoded SHA-256 digest string.
    pub String,
);

/// The HTTP methods a path item can define operations for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// `DELETE`
    Delete,
    /// `GET`
    Get,
    /// `HEAD`
    Head,
    /// `OPTIONS`
    Options,
    /// `PATCH`
    Patch,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `TRACE`
    Trace,
}

impl HttpMethod {
    /// Every method, in the order path items declare them.
    pub const ALL: [Self; 8] = [
        Self::Get,
        Self::Put,
        Self::Post,
        Self::Delete,
        Self::Options,
        Self::Head,
        Self::Patch,
        Self::Trace,
    ];

    /// The lowercase key used for this method inside a path item.
    pub const fn as_str(self) -> &'static str {
        return match self {
            Self::Delete => "delete",
            Self::Get => "get",
            Self::Head => "head",
            Self::Options => "options",
            Self::Patch => "patch",
            Self::Post => "post",
            Self::Put => "put",
            Self::Trace => "trace",
        };
    }

    /// Parse a method name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        return Self::ALL
            .into_iter()
            .find(|method| return method.as_str().eq_ignore_ascii_case(name));
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return f.write_str(&self.as_str().to_ascii_uppercase());
    }
}

#[cfg(test)]
mod tests {
    use super::HttpMethod;

    #[test]
    fn parses_any_case() {
        assert_eq!(HttpMethod::parse("GET"), Some(HttpMethod::Get));
        assert_eq!(HttpMethod::parse("patch"), Some(HttpMethod::Patch));
        assert_eq!(HttpMethod::parse("connect"), None);
    }

    #[test]
    fn displays_uppercase() {
        assert_eq!(HttpMethod::Options.to_string(), "OPTIONS");
    }
}
