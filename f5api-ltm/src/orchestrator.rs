//! Client-SSL profile workflows.
//!
//! Create/modify runs decode → upload cert → upload key → import cert →
//! import key → create or modify profile. Decode and upload failures abort
//! before anything else runs. Import failures are logged and reported back as
//! [`SoftFailure`]s but never fail the workflow, so re-posting the same
//! material within a year (when the year-suffixed objects already exist)
//! still updates the profile. The final create/modify is fatal on error.
//!
//! Cert/key pairing is not verified before upload.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use f5api_core::profile::{certificate_file_name, check_profile_name, current_year, key_file_name};
use f5api_core::{ApiError, ArtifactName, ClientSslProfile, ProfileMode, ProfileRequest};
use tracing::{error, info, warn};

use crate::client::{LtmClient, LtmError};

/// Which system SSL store object an import targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SslObject {
    Certificate,
    Key,
}

impl SslObject {
    pub fn as_str(self) -> &'static str {
        match self {
            SslObject::Certificate => "certificate",
            SslObject::Key => "key",
        }
    }
}

/// An import that failed without failing the workflow.
#[derive(Debug, Clone)]
pub struct SoftFailure {
    pub object: SslObject,
    pub name: String,
    /// The appliance reported the object as already present.
    pub conflict: bool,
    pub message: String,
}

/// Runs profile workflows against one appliance.
pub struct ProfileOrchestrator<'a> {
    client: &'a dyn LtmClient,
    year: i32,
}

impl<'a> ProfileOrchestrator<'a> {
    pub fn new(client: &'a dyn LtmClient) -> Self {
        Self {
            client,
            year: current_year(),
        }
    }

    /// Pin the year used for artifact names.
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = year;
        self
    }

    fn host(&self) -> &str {
        self.client.host()
    }

    /// Map an appliance error for `profile`; local argument rejections are
    /// the caller's fault, everything else is upstream.
    fn map_err(&self, profile: &str, context: &str, err: LtmError) -> ApiError {
        match err {
            LtmError::InvalidInput(msg) => ApiError::BadInput(format!("{context}: {msg}")),
            other => ApiError::upstream(self.host(), profile, format!("{context}: {other}")),
        }
    }

    pub async fn list_profiles(&self) -> Result<Vec<String>, ApiError> {
        info!(host = %self.host(), "list client ssl profiles");
        self.client
            .list_client_ssl_profiles()
            .await
            .map_err(|e| self.map_err("", "failed to list client ssl profiles", e))
    }

    pub async fn get_profile(&self, name: &str) -> Result<ClientSslProfile, ApiError> {
        check_profile_name(name)?;
        info!(host = %self.host(), profile = name, "getting details about client ssl profile");
        self.client
            .get_client_ssl_profile(name)
            .await
            .map_err(|e| self.map_err(name, "failed to get client ssl profile", e))?
            .ok_or_else(|| ApiError::ProfileNotFound(name.to_string()))
    }

    /// Upload, import, then create or modify `profile_name`.
    ///
    /// On success returns the imports that failed softly (usually empty).
    pub async fn create_or_modify(
        &self,
        profile_name: &str,
        mut request: ProfileRequest,
        mode: ProfileMode,
    ) -> Result<Vec<SoftFailure>, ApiError> {
        request.validate(profile_name, mode)?;

        let cert = decode("cert", &request.certificate_base64)?;
        let key = decode("key", &request.key_base64)?;

        let cert_file = certificate_file_name(profile_name);
        let key_file = key_file_name(profile_name);

        for (contents, file) in [(cert, &cert_file), (key, &key_file)] {
            self.client.upload_file(contents, file).await.map_err(|e| {
                let context = format!("failed to upload file {file} on {}", self.host());
                self.map_err(profile_name, &context, e)
            })?;
        }

        let artifact = ArtifactName::new(profile_name, self.year);
        let mut soft_failures = Vec::new();

        let cert_object = artifact.certificate();
        if let Err(e) = self.client.import_certificate(&cert_file, &cert_object).await {
            soft_failures.push(self.soft_failure(SslObject::Certificate, cert_object, e));
        }
        let key_object = artifact.key();
        if let Err(e) = self.client.import_key(&key_file, &key_object).await {
            soft_failures.push(self.soft_failure(SslObject::Key, key_object, e));
        }

        let profile = ClientSslProfile {
            name: profile_name.to_string(),
            cert: artifact.certificate(),
            key: artifact.key(),
            chain: request.chain,
            defaults_from: request.defaults_from,
            cipher_group: request.cipher_group,
            ciphers: request.ciphers,
            ..ClientSslProfile::default()
        };

        let result = match mode {
            ProfileMode::Create => self.client.create_client_ssl_profile(&profile).await,
            ProfileMode::Modify => self.client.modify_client_ssl_profile(&profile).await,
        };
        let context = match mode {
            ProfileMode::Create => "failed to create client-ssl profile",
            ProfileMode::Modify => "failed to modify client-ssl profile",
        };
        result.map_err(|e| self.map_err(profile_name, context, e))?;

        info!(
            host = %self.host(),
            profile = profile_name,
            artifact = %artifact,
            soft_failures = soft_failures.len(),
            "{} client-ssl profile",
            mode.verb()
        );
        Ok(soft_failures)
    }

    fn soft_failure(&self, object: SslObject, name: String, err: LtmError) -> SoftFailure {
        let conflict = err.is_conflict();
        if conflict {
            warn!(host = %self.host(), object = object.as_str(), name = %name, error = %err,
                "import skipped, object already exists");
        } else {
            error!(host = %self.host(), object = object.as_str(), name = %name, error = %err,
                "import failed, continuing with profile update");
        }
        SoftFailure {
            object,
            name,
            conflict,
            message: err.to_string(),
        }
    }

    /// Remove a profile and the certificate and key it references.
    ///
    /// References are captured from the profile before anything is removed.
    /// A failure part-way leaves earlier removals in place.
    pub async fn delete(&self, profile_name: &str) -> Result<(), ApiError> {
        let profile = self.get_profile(profile_name).await?;

        self.client
            .remove_client_ssl_profile(profile_name)
            .await
            .map_err(|e| self.map_err(profile_name, "failed to remove client-ssl profile", e))?;

        if !profile.cert.is_empty() {
            self.client.remove_certificate(&profile.cert).await.map_err(|e| {
                let context = format!("failed to remove certificate {}", profile.cert);
                self.map_err(profile_name, &context, e)
            })?;
        }
        if !profile.key.is_empty() {
            self.client.remove_key(&profile.key).await.map_err(|e| {
                let context = format!("failed to remove key {}", profile.key);
                self.map_err(profile_name, &context, e)
            })?;
        }

        info!(host = %self.host(), profile = profile_name, "deleted client-ssl profile");
        Ok(())
    }
}

fn decode(field: &str, value: &str) -> Result<Bytes, ApiError> {
    STANDARD
        .decode(value)
        .map(Bytes::from)
        .map_err(|e| ApiError::BadInput(format!("failed to decode {field}: {e}")))
}
