//! Credential extraction from inbound requests.
//!
//! # Purpose
//! Pulls the opaque session credential out of the `Authorization` header or
//! the session cookie, depending on deployment configuration.
//!
//! # Security considerations
//! - Credentials are borrowed from the header map and never logged.
//! - Blank values are treated as absent so no upstream call is made for them.
use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};
use serde::Deserialize;
use std::str::FromStr;

/// Where the service looks for a session credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialSource {
    Header,
    Cookie,
    Both,
}

impl FromStr for CredentialSource {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "header" | "bearer" => Ok(Self::Header),
            "cookie" => Ok(Self::Cookie),
            "both" => Ok(Self::Both),
            other => Err(format!("unknown credential source: {other}")),
        }
    }
}

/// Credential lookup settings shared by every guarded route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialPolicy {
    pub source: CredentialSource,
    pub cookie_name: String,
}

impl Default for CredentialPolicy {
    fn default() -> Self {
        Self {
            source: CredentialSource::Both,
            cookie_name: crate::config::DEFAULT_SESSION_COOKIE.to_string(),
        }
    }
}

impl CredentialPolicy {
    /// Return the credential for this request, preferring the bearer header.
    pub fn extract<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        match self.source {
            CredentialSource::Header => extract_bearer(headers),
            CredentialSource::Cookie => extract_cookie(headers, &self.cookie_name),
            CredentialSource::Both => {
                extract_bearer(headers).or_else(|| extract_cookie(headers, &self.cookie_name))
            }
        }
    }
}

pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?;
    let value = value.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

pub fn extract_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().trim_matches('"'))
        .filter(|value| !value.is_empty())
}

/// Build a `Set-Cookie` value for a freshly issued session.
pub fn session_cookie(name: &str, token: &str) -> String {
    format!("{name}={token}; Path=/; HttpOnly; SameSite=Lax")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn bearer_prefix_is_required() {
        assert_eq!(
            extract_bearer(&headers(&[("authorization", "Bearer tok-1")])),
            Some("tok-1")
        );
        assert_eq!(extract_bearer(&headers(&[("authorization", "tok-1")])), None);
        assert_eq!(extract_bearer(&headers(&[("authorization", "Bearer   ")])), None);
        assert_eq!(extract_bearer(&HeaderMap::new()), None);
    }

    #[test]
    fn cookie_lookup_scans_all_headers() {
        let map = headers(&[
            ("cookie", "theme=dark"),
            ("cookie", "a=1; sAccessToken=tok-2; b=2"),
        ]);
        assert_eq!(extract_cookie(&map, "sAccessToken"), Some("tok-2"));
        assert_eq!(extract_cookie(&map, "missing"), None);
    }

    #[test]
    fn policy_prefers_header_when_both_allowed() {
        let map = headers(&[
            ("authorization", "Bearer from-header"),
            ("cookie", "sAccessToken=from-cookie"),
        ]);
        let policy = CredentialPolicy::default();
        assert_eq!(policy.extract(&map), Some("from-header"));

        let cookie_only = CredentialPolicy {
            source: CredentialSource::Cookie,
            ..CredentialPolicy::default()
        };
        assert_eq!(cookie_only.extract(&map), Some("from-cookie"));
    }

    #[test]
    fn header_only_policy_ignores_cookie() {
        let map = headers(&[("cookie", "sAccessToken=from-cookie")]);
        let policy = CredentialPolicy {
            source: CredentialSource::Header,
            ..CredentialPolicy::default()
        };
        assert_eq!(policy.extract(&map), None);
    }

    #[test]
    fn credential_source_parses_aliases() {
        assert_eq!("Bearer".parse(), Ok(CredentialSource::Header));
        assert_eq!("cookie".parse(), Ok(CredentialSource::Cookie));
        assert_eq!(" both ".parse(), Ok(CredentialSource::Both));
        assert!("query".parse::<CredentialSource>().is_err());
    }
}
