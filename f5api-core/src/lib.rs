pub mod config;
pub mod error;
pub mod profile;
pub mod version;

pub use config::{Account, Config};
pub use error::ApiError;
pub use profile::{ArtifactName, ClientSslProfile, ProfileMode, ProfileRequest};
pub use version::VersionInfo;
