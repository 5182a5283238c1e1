use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ApiError;

/// Client-SSL profile as stored on the appliance.
///
/// `cert` and `key` are references to objects in the system SSL store,
/// e.g. `/Common/svc1-2024.crt`. Empty fields are left out when sending a
/// profile so the appliance falls back to the parent profile's values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSslProfile {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_path: Option<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cert: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub key: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub chain: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub defaults_from: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cipher_group: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ciphers: String,
}

/// Body of a create/modify request.
///
/// Absent fields deserialize as empty strings; [`ProfileRequest::validate`]
/// decides which of them are required.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProfileRequest {
    /// Base64 encoded certificate (usually PEM).
    #[serde(default, rename = "cert")]
    pub certificate_base64: String,

    /// Base64 encoded private key.
    #[serde(default, rename = "key")]
    pub key_base64: String,

    #[serde(default, rename = "clientssl-profile")]
    pub profile_name: String,

    #[serde(default, rename = "defaultsfrom")]
    pub defaults_from: String,

    #[serde(default)]
    pub chain: String,

    #[serde(default, rename = "ciphergroup")]
    pub cipher_group: String,

    #[serde(default)]
    pub ciphers: String,
}

impl fmt::Debug for ProfileRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfileRequest")
            .field("certificate_base64", &format_args!("<{} bytes>", self.certificate_base64.len()))
            .field("key_base64", &"<redacted>")
            .field("profile_name", &self.profile_name)
            .field("defaults_from", &self.defaults_from)
            .field("chain", &self.chain)
            .field("cipher_group", &self.cipher_group)
            .field("ciphers", &self.ciphers)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileMode {
    Create,
    Modify,
}

impl ProfileMode {
    /// Past tense used in confirmations and logs.
    pub fn verb(self) -> &'static str {
        match self {
            ProfileMode::Create => "created",
            ProfileMode::Modify => "modified",
        }
    }
}

impl ProfileRequest {
    /// Check required fields and reconcile the body's profile name with the
    /// one taken from the URL.
    pub fn validate(&mut self, profile_name: &str, mode: ProfileMode) -> Result<(), ApiError> {
        check_profile_name(profile_name)?;
        if self.profile_name.is_empty() {
            self.profile_name = profile_name.to_string();
        } else if self.profile_name != profile_name {
            return Err(ApiError::BadInput(format!(
                "clientssl-profile '{}' does not match profile '{}' in the path",
                self.profile_name, profile_name
            )));
        }

        let mut required = vec![("cert", &self.certificate_base64), ("key", &self.key_base64)];
        if mode == ProfileMode::Modify {
            required.extend([
                ("defaultsfrom", &self.defaults_from),
                ("chain", &self.chain),
                ("ciphergroup", &self.cipher_group),
                ("ciphers", &self.ciphers),
            ]);
        }
        let missing: Vec<&str> = required
            .into_iter()
            .filter(|(_, v)| v.is_empty())
            .map(|(k, _)| k)
            .collect();
        if !missing.is_empty() {
            return Err(ApiError::BadInput(format!(
                "missing required field(s): {}",
                missing.join(", ")
            )));
        }
        Ok(())
    }
}

/// A profile name must be a single bare path segment, since it ends up in
/// upload file names and appliance URLs.
pub fn check_profile_name(name: &str) -> Result<(), ApiError> {
    if name.is_empty() {
        return Err(ApiError::BadInput("profile name cannot be empty".into()));
    }
    let unsafe_char = |c: char| matches!(c, '/' | '\\' | '?' | '#' | '%') || c.is_control();
    if name == "." || name == ".." || name.chars().any(unsafe_char) {
        return Err(ApiError::BadInput(format!("invalid profile name '{name}'")));
    }
    Ok(())
}

/// Name of the file a profile's certificate is uploaded as.
pub fn certificate_file_name(profile_name: &str) -> String {
    format!("{profile_name}.crt")
}

/// Name of the file a profile's key is uploaded as.
pub fn key_file_name(profile_name: &str) -> String {
    format!("{profile_name}.key")
}

/// Calendar year on the local clock.
pub fn current_year() -> i32 {
    Local::now().year()
}

/// Year-suffixed base name of imported certificate/key objects.
///
/// Re-importing within the same year reuses the name; a new year yields a
/// fresh pair and leaves last year's objects in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactName(String);

impl ArtifactName {
    pub fn new(profile_name: &str, year: i32) -> Self {
        Self(format!("{profile_name}-{year}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn certificate(&self) -> String {
        format!("{}.crt", self.0)
    }

    pub fn key(&self) -> String {
        format!("{}.key", self.0)
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
