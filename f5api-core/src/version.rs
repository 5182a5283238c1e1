use serde::Serialize;

/// Build information reported by `/v1/f5/version`.
///
/// `F5API_VERSION_PRERELEASE`, `F5API_BUILD_STAMP` and `F5API_GIT_HASH` are
/// read at compile time and may be set by the release pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct VersionInfo {
    pub version: &'static str,
    pub prerelease: &'static str,
    pub build_stamp: &'static str,
    pub git_hash: &'static str,
}

impl VersionInfo {
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            prerelease: option_env!("F5API_VERSION_PRERELEASE").unwrap_or(""),
            build_stamp: option_env!("F5API_BUILD_STAMP").unwrap_or("unknown"),
            git_hash: option_env!("F5API_GIT_HASH").unwrap_or("unknown"),
        }
    }
}
