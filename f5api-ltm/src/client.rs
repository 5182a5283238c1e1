use async_trait::async_trait;
use bytes::Bytes;
use f5api_core::ClientSslProfile;
use thiserror::Error;

/// Errors returned by an appliance client.
#[derive(Error, Debug)]
pub enum LtmError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("request to {host} failed: {source}")]
    Transport {
        host: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{host} responded {status}: {message}")]
    Status {
        host: String,
        status: u16,
        message: String,
    },

    #[error("unexpected response from {host}: {message}")]
    Decode { host: String, message: String },
}

impl LtmError {
    /// The appliance refused because the object already exists.
    pub fn is_conflict(&self) -> bool {
        matches!(self, LtmError::Status { status: 409, .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LtmError::Status { status: 404, .. })
    }
}

/// Operations the profile workflows need from a BigIP appliance.
///
/// Implemented over iControl REST by [`crate::BigIpSession`]; tests
/// substitute an in-memory double.
#[async_trait]
pub trait LtmClient: Send + Sync {
    /// Appliance host this client talks to, for diagnostics.
    fn host(&self) -> &str;

    async fn list_client_ssl_profiles(&self) -> Result<Vec<String>, LtmError>;

    /// `Ok(None)` when the profile does not exist.
    async fn get_client_ssl_profile(&self, name: &str)
        -> Result<Option<ClientSslProfile>, LtmError>;

    /// Store raw bytes on the appliance under `file_name` in its upload directory.
    async fn upload_file(&self, contents: Bytes, file_name: &str) -> Result<(), LtmError>;

    /// Register an uploaded file as certificate object `object_name`.
    async fn import_certificate(&self, file_name: &str, object_name: &str)
        -> Result<(), LtmError>;

    /// Register an uploaded file as key object `object_name`.
    async fn import_key(&self, file_name: &str, object_name: &str) -> Result<(), LtmError>;

    async fn create_client_ssl_profile(&self, profile: &ClientSslProfile)
        -> Result<(), LtmError>;

    async fn modify_client_ssl_profile(&self, profile: &ClientSslProfile)
        -> Result<(), LtmError>;

    async fn remove_client_ssl_profile(&self, name: &str) -> Result<(), LtmError>;

    async fn remove_certificate(&self, name: &str) -> Result<(), LtmError>;

    async fn remove_key(&self, name: &str) -> Result<(), LtmError>;
}
