//! iControl REST implementation of [`LtmClient`].

use async_trait::async_trait;
use bytes::Bytes;
use f5api_core::{Account, ClientSslProfile};
use reqwest::{RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, info};

use crate::client::{LtmClient, LtmError};

/// Upload chunk size accepted by the file-transfer endpoint.
const UPLOAD_CHUNK_SIZE: usize = 512 * 1024;

const DEFAULT_PARTITION: &str = "Common";

const UPLOADS: &str = "/mgmt/shared/file-transfer/uploads";
const SSL_CERTS: &str = "/mgmt/tm/sys/file/ssl-cert";
const SSL_KEYS: &str = "/mgmt/tm/sys/file/ssl-key";
const CLIENT_SSL_PROFILES: &str = "/mgmt/tm/ltm/profile/client-ssl";

/// One authenticated session against a BigIP management interface.
pub struct BigIpSession {
    client: reqwest::Client,
    base_url: String,
    host: String,
    username: String,
    password: String,
    upload_path: String,
}

#[derive(Deserialize)]
struct Collection<T> {
    #[serde(default)]
    items: Vec<T>,
}

#[derive(Default, Deserialize)]
struct Named {
    name: String,
}

#[derive(Deserialize)]
struct ApplianceError {
    message: String,
}

impl BigIpSession {
    pub fn new(account: &Account) -> Result<Self, LtmError> {
        info!(
            host = %account.ltm_host,
            username = %account.username,
            "creating a new LTM session"
        );

        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(!account.verify_tls)
            .build()
            .map_err(|source| LtmError::Transport {
                host: account.ltm_host.clone(),
                source,
            })?;

        Ok(Self {
            client,
            base_url: base_url(&account.ltm_host),
            host: account.ltm_host.clone(),
            username: account.username.clone(),
            password: account.password.clone(),
            upload_path: account.upload_path.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Authenticate, send, and turn non-2xx responses into [`LtmError::Status`].
    async fn send(&self, request: RequestBuilder) -> Result<Response, LtmError> {
        let response = request
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|source| LtmError::Transport {
                host: self.host.clone(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!(host = %self.host, status = status.as_u16(), error = %e, "failed to read error body");
                String::new()
            }
        };
        let message = serde_json::from_str::<ApplianceError>(&body)
            .map(|e| e.message)
            .unwrap_or(body);
        Err(LtmError::Status {
            host: self.host.clone(),
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response) -> Result<T, LtmError> {
        response.json::<T>().await.map_err(|e| LtmError::Decode {
            host: self.host.clone(),
            message: e.to_string(),
        })
    }

    async fn import(&self, endpoint: &str, file_name: &str, object_name: &str) -> Result<(), LtmError> {
        check_file_name(file_name)?;
        check_names(&[("object name", object_name)])?;

        let body = json!({
            "name": object_name,
            "sourcePath": format!("file:{}/{}", self.upload_path, file_name),
        });
        self.send(self.client.post(self.url(endpoint)).json(&body)).await?;
        Ok(())
    }

    async fn remove(&self, endpoint: &str, name: &str) -> Result<(), LtmError> {
        check_names(&[("name", name)])?;
        let url = self.url(&format!("{endpoint}/{}", object_path(name)));
        self.send(self.client.delete(url)).await?;
        Ok(())
    }
}

#[async_trait]
impl LtmClient for BigIpSession {
    fn host(&self) -> &str {
        &self.host
    }

    async fn list_client_ssl_profiles(&self) -> Result<Vec<String>, LtmError> {
        let response = self.send(self.client.get(self.url(CLIENT_SSL_PROFILES))).await?;
        let out: Collection<Named> = self.decode(response).await?;
        debug!(host = %self.host, count = out.items.len(), "listed client-ssl profiles");
        Ok(out.items.into_iter().map(|p| p.name).collect())
    }

    async fn get_client_ssl_profile(
        &self,
        name: &str,
    ) -> Result<Option<ClientSslProfile>, LtmError> {
        check_names(&[("name", name)])?;
        let url = self.url(&format!("{CLIENT_SSL_PROFILES}/{}", object_path(name)));
        match self.send(self.client.get(url)).await {
            Ok(response) => {
                let profile: ClientSslProfile = self.decode(response).await?;
                debug!(host = %self.host, profile = ?profile, "fetched client-ssl profile");
                Ok(Some(profile))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn upload_file(&self, contents: Bytes, file_name: &str) -> Result<(), LtmError> {
        check_file_name(file_name)?;
        if contents.is_empty() {
            return Err(LtmError::InvalidInput(format!("{file_name} is empty")));
        }

        let url = self.url(&format!("{UPLOADS}/{file_name}"));
        let total = contents.len();
        let mut start = 0;
        while start < total {
            let end = (start + UPLOAD_CHUNK_SIZE).min(total);
            let request = self
                .client
                .post(&url)
                .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
                .header(reqwest::header::CONTENT_RANGE, content_range(start, end, total))
                .body(contents.slice(start..end));
            self.send(request).await?;
            start = end;
        }

        debug!(host = %self.host, file = file_name, bytes = total, "uploaded file");
        Ok(())
    }

    async fn import_certificate(&self, file_name: &str, object_name: &str) -> Result<(), LtmError> {
        self.import(SSL_CERTS, file_name, object_name).await
    }

    async fn import_key(&self, file_name: &str, object_name: &str) -> Result<(), LtmError> {
        self.import(SSL_KEYS, file_name, object_name).await
    }

    async fn create_client_ssl_profile(&self, profile: &ClientSslProfile) -> Result<(), LtmError> {
        check_names(&[("profile name", profile.name.as_str())])?;
        self.send(self.client.post(self.url(CLIENT_SSL_PROFILES)).json(profile))
            .await?;
        Ok(())
    }

    async fn modify_client_ssl_profile(&self, profile: &ClientSslProfile) -> Result<(), LtmError> {
        check_names(&[("profile name", profile.name.as_str())])?;
        let url = self.url(&format!("{CLIENT_SSL_PROFILES}/{}", object_path(&profile.name)));
        self.send(self.client.put(url).json(profile)).await?;
        Ok(())
    }

    async fn remove_client_ssl_profile(&self, name: &str) -> Result<(), LtmError> {
        self.remove(CLIENT_SSL_PROFILES, name).await
    }

    async fn remove_certificate(&self, name: &str) -> Result<(), LtmError> {
        self.remove(SSL_CERTS, name).await
    }

    async fn remove_key(&self, name: &str) -> Result<(), LtmError> {
        self.remove(SSL_KEYS, name).await
    }
}

/// Reject empty names and names that would not stay inside their URL path
/// segment. References may carry a `/Partition/` or `/Partition/folder/`
/// prefix.
fn check_names(args: &[(&str, &str)]) -> Result<(), LtmError> {
    for (field, value) in args {
        if value.is_empty() {
            return Err(LtmError::InvalidInput(format!("{field} cannot be empty")));
        }
        if !is_safe_name(value) {
            return Err(LtmError::InvalidInput(format!("{field} '{value}' is not a valid object name")));
        }
    }
    Ok(())
}

/// Upload file names are always bare.
fn check_file_name(file_name: &str) -> Result<(), LtmError> {
    check_names(&[("file name", file_name)])?;
    if file_name.starts_with('/') {
        return Err(LtmError::InvalidInput(format!("file name '{file_name}' is not a valid object name")));
    }
    Ok(())
}

fn is_safe_name(name: &str) -> bool {
    if name.chars().any(|c| matches!(c, '?' | '#' | '%' | '\\') || c.is_control()) {
        return false;
    }
    let segments: Vec<&str> = match name.strip_prefix('/') {
        Some(path) => {
            let segments: Vec<&str> = path.split('/').collect();
            if !(2..=3).contains(&segments.len()) {
                return false;
            }
            segments
        }
        None => vec![name],
    };
    segments
        .iter()
        .all(|s| !s.is_empty() && *s != "." && *s != ".." && !s.contains('/'))
}

/// `https://` is assumed when the configured host carries no scheme.
fn base_url(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

/// URL path segment for an object: `/Common/a.crt` → `~Common~a.crt`,
/// bare names land in the `Common` partition.
pub fn object_path(name: &str) -> String {
    if name.starts_with('/') {
        name.replace('/', "~")
    } else {
        format!("~{DEFAULT_PARTITION}~{name}")
    }
}

/// `Content-Range` value for bytes `start..end` of `total`.
fn content_range(start: usize, end: usize, total: usize) -> String {
    format!("{}-{}/{}", start, end - 1, total)
}
