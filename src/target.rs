// Target classification and format validation.
//
// Validation is format-only: nothing here resolves DNS or touches the
// network. A target that fails validation must never reach a backend.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::error::DeskError;

static IPV4_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)$",
    )
    .expect("IPv4 pattern compiles")
});

static DOMAIN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z]{2,}$")
        .expect("domain pattern compiles")
});

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://.+").expect("URL pattern compiles"));

static HASH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-fA-F0-9]{32,64}$").expect("hash pattern compiles"));

/// What kind of indicator a target string is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Ip,
    Domain,
    Url,
    Hash,
}

impl TargetKind {
    pub const ALL: [TargetKind; 4] = [
        TargetKind::Ip,
        TargetKind::Domain,
        TargetKind::Url,
        TargetKind::Hash,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Ip => "ip",
            TargetKind::Domain => "domain",
            TargetKind::Url => "url",
            TargetKind::Hash => "hash",
        }
    }

    /// Example input shown next to the target prompt.
    pub fn placeholder(&self) -> &'static str {
        match self {
            TargetKind::Ip => "8.8.8.8, 192.168.1.1, etc.",
            TargetKind::Domain => "example.com, google.com, etc.",
            TargetKind::Url => "https://example.com/page",
            TargetKind::Hash => "SHA256 or MD5 hash",
        }
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            TargetKind::Ip => &IPV4_PATTERN,
            TargetKind::Domain => &DOMAIN_PATTERN,
            TargetKind::Url => &URL_PATTERN,
            TargetKind::Hash => &HASH_PATTERN,
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TargetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ip" => Ok(TargetKind::Ip),
            "domain" => Ok(TargetKind::Domain),
            "url" => Ok(TargetKind::Url),
            "hash" => Ok(TargetKind::Hash),
            other => Err(format!(
                "unknown target type '{other}' (expected ip, domain, url or hash)"
            )),
        }
    }
}

/// Check a target string against the format rule for `kind`.
pub fn validate(target: &str, kind: TargetKind) -> bool {
    kind.pattern().is_match(target)
}

/// Guess the kind of a target. URLs win over everything else because they
/// can embed an IP or domain; hashes are checked before domains.
pub fn detect_kind(input: &str) -> Option<TargetKind> {
    let input = input.trim();
    [
        TargetKind::Url,
        TargetKind::Ip,
        TargetKind::Hash,
        TargetKind::Domain,
    ]
    .into_iter()
    .find(|kind| validate(input, *kind))
}

/// Canonical form of a domain before it is sent to the recon backend:
/// lowercased, scheme and trailing slashes removed, leading `www.` dropped.
pub fn normalize_domain(input: &str) -> String {
    let lowered = input.trim().to_lowercase();
    let without_scheme = lowered
        .strip_prefix("https://")
        .or_else(|| lowered.strip_prefix("http://"))
        .unwrap_or(&lowered);
    let trimmed = without_scheme.trim_end_matches('/');
    trimmed.strip_prefix("www.").unwrap_or(trimmed).to_string()
}

/// A target that has passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub value: String,
    pub kind: TargetKind,
}

impl Target {
    /// Trim and validate user input. Domains are normalized first.
    pub fn parse(input: &str, kind: TargetKind) -> Result<Self, DeskError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(DeskError::validation(
                input,
                Some(kind),
                "Please enter a target to scan",
            ));
        }

        let value = match kind {
            TargetKind::Domain => normalize_domain(trimmed),
            _ => trimmed.to_string(),
        };

        if !validate(&value, kind) {
            return Err(DeskError::validation(
                input,
                Some(kind),
                format!("Invalid input format for {kind}: enter {}", kind.placeholder()),
            ));
        }

        Ok(Self { value, kind })
    }

    /// Parse with the kind inferred from the input.
    pub fn detect(input: &str) -> Result<Self, DeskError> {
        if input.trim().is_empty() {
            return Err(DeskError::validation(input, None, "Please enter a target to scan"));
        }
        match detect_kind(input) {
            Some(kind) => Self::parse(input, kind),
            None => Err(DeskError::validation(
                input,
                None,
                "Could not tell whether the target is an IP, domain, URL or hash",
            )),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.value, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_prefers_url_over_domain() {
        assert_eq!(detect_kind("https://example.com"), Some(TargetKind::Url));
        assert_eq!(detect_kind("example.com"), Some(TargetKind::Domain));
    }

    #[test]
    fn test_detect_hash_before_domain() {
        let md5 = "d41d8cd98f00b204e9800998ecf8427e";
        assert_eq!(detect_kind(md5), Some(TargetKind::Hash));
    }

    #[test]
    fn test_detect_nothing() {
        assert_eq!(detect_kind("not a target"), None);
        assert_eq!(detect_kind(""), None);
    }

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in TargetKind::ALL {
            assert_eq!(kind.as_str().parse::<TargetKind>().unwrap(), kind);
        }
        assert!("cidr".parse::<TargetKind>().is_err());
    }
}
