//! Request headers
//!
//! The client builds one immutable header set at construction; per-call
//! overrides are merged on top of it for a single request.

use std::collections::BTreeMap;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const USER_AGENT: &str = "User-Agent";
pub const API_TOKEN: &str = "X-Api-Token";
pub const APP_NAME: &str = "X-App-Name";
pub const SESSION_KEY: &str = "X-Session-Key";

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Ordered header map
///
/// Names are case-insensitive and stored lower-cased, so an override
/// always replaces the base value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(BTreeMap<String, String>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header, returning the previous value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(normalize(name.into()), value.into())
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&normalize(name)).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(&normalize(name))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// New header set with `overrides` applied on top of `self`
    pub fn merged(&self, overrides: &Headers) -> Headers {
        let mut merged = self.clone();
        for (name, value) in overrides.iter() {
            merged.insert(name, value);
        }
        merged
    }
}

fn normalize(name: impl Into<String>) -> String {
    let mut name = name.into();
    name.make_ascii_lowercase();
    name
}

/// How the client authenticates against the ingestion service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Application API token, optionally scoped to an application name
    ApiToken {
        token: String,
        app_name: Option<String>,
    },
    /// Short-lived session key
    SessionKey(String),
}

impl Credentials {
    /// Header set identifying the SDK and carrying the credentials
    pub fn headers(&self, user_agent: &str) -> Headers {
        let mut headers = Headers::new().with(USER_AGENT, user_agent);
        match self {
            Self::ApiToken { token, app_name } => {
                headers.insert(API_TOKEN, token.as_str());
                if let Some(app_name) = app_name {
                    headers.insert(APP_NAME, app_name.as_str());
                }
            }
            Self::SessionKey(token) => {
                headers.insert(SESSION_KEY, token.as_str());
            }
        }
        headers
    }
}
