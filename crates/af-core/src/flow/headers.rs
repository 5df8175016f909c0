//! Response-header inspection for hosted-page requests.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{EMBEDDED_FORM_HEADER, LOCATION_HEADER, SIGN_IN_HEADER};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpHeader {
    pub name: String,
    pub value: String,
}

impl HttpHeader {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Header names compare case-insensitively.
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// Per-request metadata reported by the navigation observer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDetails {
    pub url: String,
    #[serde(default)]
    pub response_headers: Vec<HttpHeader>,
}

impl RequestDetails {
    pub fn new(url: impl Into<String>, response_headers: Vec<HttpHeader>) -> Self {
        Self {
            url: url.into(),
            response_headers,
        }
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.response_headers.iter().any(|h| h.is(name))
    }

    pub fn is_embedded_form(&self) -> bool {
        self.has_header(EMBEDDED_FORM_HEADER)
    }

    /// Scan the headers for identity and sync-choice signals.
    pub fn scan(&self) -> HeaderFindings {
        let mut findings = HeaderFindings::default();
        for header in &self.response_headers {
            if header.is(SIGN_IN_HEADER) {
                findings.signin = Some(SigninDetails::parse(&header.value));
            } else if header.is(LOCATION_HEADER) {
                findings.choose_what_to_sync = Some(location_requests_sync_choice(&header.value));
            }
        }
        findings
    }
}

/// What one header set told us. `None` means the header was absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderFindings {
    pub signin: Option<SigninDetails>,
    pub choose_what_to_sync: Option<bool>,
}

/// Identity carried by the sign-in header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SigninDetails {
    pub email: Option<String>,
    pub gaia_id: Option<String>,
    pub session_index: Option<String>,
}

impl SigninDetails {
    /// Parse `email="a@x.com", obfuscatedid="123", sessionindex=0`.
    ///
    /// The whole value is lower-cased. Unknown keys and entries without `=`
    /// are ignored.
    pub fn parse(value: &str) -> Self {
        let mut details = Self::default();
        for entry in value.to_lowercase().split(',') {
            let Some((key, raw)) = entry.split_once('=') else {
                continue;
            };
            let value = unquote(raw.trim()).to_string();
            match key.trim() {
                "email" => details.email = Some(value),
                "obfuscatedid" => details.gaia_id = Some(value),
                "sessionindex" => details.session_index = Some(value),
                _ => {}
            }
        }
        details
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

lazy_static! {
    /// `source=3` as a complete query parameter
    static ref SYNC_CHOICE_REGEX: Regex = Regex::new(r"(\?|&)source=3($|&)").unwrap();
}

/// Whether a redirect location carries the "choose what to sync" marker.
///
/// The marker (`source=3`) usually sits inside an encoded continue URL, so
/// the location is percent-decoded before matching.
pub fn location_requests_sync_choice(location: &str) -> bool {
    let decoded = urlencoding::decode(location)
        .map(|v| v.into_owned())
        .unwrap_or_else(|_| location.to_string());
    SYNC_CHOICE_REGEX.is_match(&decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signin_header_parses_quoted_values() {
        let details = SigninDetails::parse(
            r#"email="A@X.com", obfuscatedid="123", sessionindex=s1, other="ignored""#,
        );
        assert_eq!(details.email.as_deref(), Some("a@x.com"));
        assert_eq!(details.gaia_id.as_deref(), Some("123"));
        assert_eq!(details.session_index.as_deref(), Some("s1"));
    }

    #[test]
    fn signin_header_missing_keys_read_as_unknown() {
        let details = SigninDetails::parse(r#"email="a@x.com",garbage"#);
        assert_eq!(details.email.as_deref(), Some("a@x.com"));
        assert_eq!(details.gaia_id, None);
        assert_eq!(details.session_index, None);
    }

    #[test]
    fn header_names_are_case_insensitive() {
        let details = RequestDetails::new(
            "https://accounts.google.com/x",
            vec![
                HttpHeader::new("Google-Accounts-SignIn", r#"email="a@x.com""#),
                HttpHeader::new("Location", "https://host/?source=3"),
            ],
        );
        let findings = details.scan();
        assert_eq!(
            findings.signin.and_then(|s| s.email).as_deref(),
            Some("a@x.com")
        );
        assert_eq!(findings.choose_what_to_sync, Some(true));
    }

    #[test]
    fn sync_choice_marker_is_found_inside_encoded_continue_url() {
        assert!(location_requests_sync_choice(
            "https://idp/ServiceLogin?continue=https%3A%2F%2Fhost%2Fdone%3Fsource%3D3"
        ));
        assert!(location_requests_sync_choice("https://host/done?a=1&source=3&b=2"));
        assert!(!location_requests_sync_choice("https://host/done?source=30"));
        assert!(!location_requests_sync_choice("https://host/done?xsource=3"));
    }

    #[test]
    fn embedded_form_header_detected() {
        let details = RequestDetails::new(
            "https://accounts.google.com/embedded",
            vec![HttpHeader::new("GOOGLE-ACCOUNTS-EMBEDDED", "1")],
        );
        assert!(details.is_embedded_form());
        assert_eq!(details.scan(), HeaderFindings::default());
    }
}
