//! Build Info Record - `build-info.json`
//!
//! Informational only; nothing in the build reads it back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::config::BuildConfig;
use crate::pipeline::BuildError;
use crate::ENGINE_VERSION;

pub const BUILD_INFO_FILE: &str = "build-info.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub build_time: DateTime<Utc>,
    pub version: String,
    pub runtime_version: String,
    pub files: FileCounts,
    pub content_hash: String,
}

/// Configured file counts per kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCounts {
    pub css: usize,
    pub js: usize,
    pub html: usize,
}

impl FileCounts {
    pub fn from_config(config: &BuildConfig) -> Self {
        Self {
            css: config.css_files.len(),
            js: config.js_files.len(),
            html: config.html_files.len(),
        }
    }
}

impl BuildInfo {
    pub fn new(
        config: &BuildConfig,
        version: &semver::Version,
        build_time: DateTime<Utc>,
        content_hash: String,
    ) -> Self {
        Self {
            build_time,
            version: version.to_string(),
            runtime_version: runtime_version(),
            files: FileCounts::from_config(config),
            content_hash,
        }
    }

    /// Pretty JSON, two-space indent
    pub fn to_json(&self) -> Result<String, BuildError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub fn runtime_version() -> String {
    format!("sitebuild-core/{}", ENGINE_VERSION)
}

#[derive(Debug, Deserialize)]
struct PackageManifest {
    version: Option<String>,
}

/// Read `version` from package metadata (npm-style `package.json`)
pub fn read_package_version(path: &Path) -> Result<semver::Version, BuildError> {
    let content = fs::read_to_string(path).map_err(|e| BuildError::io("read package metadata", path, e))?;
    let manifest: PackageManifest = serde_json::from_str(&content).map_err(|e| BuildError::PackageMetadata {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let version = manifest.version.ok_or_else(|| BuildError::PackageMetadata {
        path: path.to_path_buf(),
        message: "missing \"version\" field".to_string(),
    })?;
    semver::Version::parse(version.trim()).map_err(|source| BuildError::InvalidVersion { version, source })
}
