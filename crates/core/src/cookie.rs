//! Cookie parsing and `Set-Cookie` rendering.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
            Self::None => "None",
        }
    }
}

/// A cookie the gate wants the client to store or drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    /// `None` renders an expired cookie (`Max-Age=0`).
    pub max_age: Option<Duration>,
    pub path: String,
    pub domain: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
}

impl SetCookie {
    /// Whether this directive removes the cookie.
    pub fn is_removal(&self) -> bool {
        self.max_age.is_none()
    }

    /// Renders the value of a `Set-Cookie` header.
    pub fn header_value(&self) -> String {
        let mut out = format!("{}={}", self.name, self.value);

        match self.max_age {
            Some(age) => out.push_str(&format!("; Max-Age={}", age.as_secs())),
            None => out.push_str("; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT"),
        }

        out.push_str(&format!("; Path={}", self.path));
        if let Some(domain) = &self.domain {
            out.push_str(&format!("; Domain={}", domain));
        }
        if self.secure {
            out.push_str("; Secure");
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        out.push_str(&format!("; SameSite={}", self.same_site.as_str()));
        out
    }
}

/// Parses `Cookie` header values into a name -> value map.
///
/// The first occurrence of a name wins, matching browser ordering where the
/// most specific path is sent first.
pub fn parse_cookie_header<'a>(headers: impl IntoIterator<Item = &'a str>) -> HashMap<String, String> {
    let mut cookies = HashMap::new();

    for header in headers {
        for pair in header.split(';') {
            let Some((name, value)) = pair.trim().split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            cookies
                .entry(name.to_string())
                .or_insert_with(|| value.trim().trim_matches('"').to_string());
        }
    }

    cookies
}
