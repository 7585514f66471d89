//! Third-party origin detection.

use serde::{Deserialize, Serialize};

/// Well-known third-party script and embed hosts.
///
/// Matched as substrings of the resource host.
pub const KNOWN_THIRD_PARTY: &[&str] = &[
    "addthis.com",
    "addtoany.com",
    "adsbygoogle",
    "ampproject.org",
    "connect.facebook.net",
    "disqus.com",
    "doubleclick.net",
    "google-analytics.com",
    "googleadservices.com",
    "googlesyndication.com",
    "googletagmanager.com",
    "googletagservices.com",
    "hotjar.com",
    "instagram.com",
    "linkedin.com",
    "pinterest.com",
    "platform.twitter.com",
    "sharethis.com",
    "tiktok.com",
    "vimeo.com",
    "youtube.com",
    "youtube-nocookie.com",
];

/// `defer_third_party`: either a plain switch over [`KNOWN_THIRD_PARTY`] or
/// extra host patterns that extend it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThirdParty {
    Enabled(bool),
    Domains(Vec<String>),
}

impl Default for ThirdParty {
    fn default() -> Self {
        Self::Enabled(true)
    }
}

impl ThirdParty {
    pub fn is_enabled(&self) -> bool {
        match self {
            Self::Enabled(on) => *on,
            Self::Domains(_) => true,
        }
    }

    /// Check a host against the table (and configured extensions).
    ///
    /// Returns false when third-party handling is switched off.
    pub fn matches_host(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        match self {
            Self::Enabled(false) => false,
            Self::Enabled(true) => KNOWN_THIRD_PARTY.iter().any(|d| host.contains(d)),
            Self::Domains(extra) => {
                KNOWN_THIRD_PARTY.iter().any(|d| host.contains(d))
                    || extra
                        .iter()
                        .map(|d| d.trim().to_ascii_lowercase())
                        .any(|d| !d.is_empty() && host.contains(&d))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_table() {
        let tp = ThirdParty::Enabled(true);
        assert!(tp.matches_host("www.googletagmanager.com"));
        assert!(tp.matches_host("WWW.YOUTUBE.COM"));
        assert!(!tp.matches_host("example.com"));
    }

    #[test]
    fn test_disabled() {
        let tp = ThirdParty::Enabled(false);
        assert!(!tp.is_enabled());
        assert!(!tp.matches_host("www.googletagmanager.com"));
    }

    #[test]
    fn test_extensions() {
        let tp = ThirdParty::Domains(vec!["widgets.example.net".into(), " ".into()]);
        assert!(tp.is_enabled());
        assert!(tp.matches_host("widgets.example.net"));
        assert!(tp.matches_host("platform.twitter.com"));
        assert!(!tp.matches_host("example.org"));
    }
}
