//! Build Pipeline - Single Entry Point
//!
//! Stages run in a fixed order, one at a time. Per-file problems live in the
//! stage reports; anything returned as `Err` ends the run where it stands.
//! There is no rollback, so a failed run can leave a partial output tree.

use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::build_info::{read_package_version, BuildInfo, BUILD_INFO_FILE};
use crate::config::BuildConfig;
use crate::hashing::tree_digest;
use crate::minify::{CommandMinifier, Minifier};
use crate::report::{BuildReport, ItemOutcome, Stage, StageReport};
use crate::reporter::Reporter;
use crate::{rewrite, stages};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid config file {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid package metadata {}: {message}", .path.display())]
    PackageMetadata { path: PathBuf, message: String },

    #[error("Package version {version:?} is not valid semver: {source}")]
    InvalidVersion {
        version: String,
        #[source]
        source: semver::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BuildError {
    pub fn io(action: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Io { action, path: path.to_path_buf(), source }
    }
}

/// The build pipeline - owns the configuration and both minifiers
pub struct BuildPipeline {
    config: BuildConfig,
    css_minifier: Box<dyn Minifier>,
    js_minifier: Box<dyn Minifier>,
}

impl BuildPipeline {
    /// Validate the config and wire up the configured external minifiers
    pub fn new(config: BuildConfig) -> Result<Self, BuildError> {
        let css = CommandMinifier::new("css", config.css_minifier.clone());
        let js = CommandMinifier::new("js", config.js_minifier.clone());
        Self::with_minifiers(config, Box::new(css), Box::new(js))
    }

    /// Same as `new`, with caller-supplied minifiers
    pub fn with_minifiers(
        config: BuildConfig,
        css_minifier: Box<dyn Minifier>,
        js_minifier: Box<dyn Minifier>,
    ) -> Result<Self, BuildError> {
        config.validate()?;
        Ok(Self { config, css_minifier, js_minifier })
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Run every stage, stamping the build with the current time
    pub fn run(&self, reporter: &dyn Reporter) -> Result<BuildReport, BuildError> {
        self.run_at(Utc::now(), reporter)
    }

    pub fn run_at(&self, build_time: DateTime<Utc>, reporter: &dyn Reporter) -> Result<BuildReport, BuildError> {
        let config = &self.config;
        reporter.build_started(config);
        info!(source = %config.source_dir.display(), output = %config.output_root().display(), "build started");

        let mut reports = vec![];
        let mut finish = |report: StageReport| {
            info!(
                stage = ?report.stage,
                done = report.done_count(),
                skipped = report.skipped_count(),
                failed = report.failed_count(),
                "stage finished"
            );
            reporter.stage_finished(&report);
            reports.push(report);
        };

        finish(stages::clean(config)?);
        finish(stages::create_directories(config)?);
        finish(stages::minify_files(Stage::MinifyCss, &config.css_files, config, self.css_minifier.as_ref()));
        finish(stages::minify_files(Stage::MinifyJs, &config.js_files, config, self.js_minifier.as_ref()));
        finish(stages::copy_assets(config));
        finish(rewrite::rewrite_pages(config)?);

        let (info_report, build_info) = self.emit_build_info(build_time)?;
        finish(info_report);

        let report = BuildReport {
            output_dir: config.output_root(),
            stages: reports,
            build_info,
        };
        reporter.build_finished(&report);
        Ok(report)
    }

    fn emit_build_info(&self, build_time: DateTime<Utc>) -> Result<(StageReport, BuildInfo), BuildError> {
        let config = &self.config;
        let package = config.source_path(&config.package_file);
        let version = read_package_version(&package)?;

        let root = config.output_root();
        let content_hash = tree_digest(&root, &[BUILD_INFO_FILE])
            .map_err(|e| BuildError::io("hash output tree", &root, e))?;

        let info = BuildInfo::new(config, &version, build_time, content_hash);
        let path = root.join(BUILD_INFO_FILE);
        fs::write(&path, info.to_json()?).map_err(|e| BuildError::io("write", &path, e))?;

        let mut report = StageReport::new(Stage::BuildInfo);
        report.push(ItemOutcome::done(BUILD_INFO_FILE, path));
        Ok((report, info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = BuildConfig { out_dir: PathBuf::from("."), ..Default::default() };
        let err = BuildPipeline::new(config).err().unwrap();
        assert!(matches!(err, BuildError::Config(_)));
    }

    #[test]
    fn test_io_error_display() {
        let err = BuildError::io(
            "remove",
            Path::new("dist"),
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "Failed to remove dist: denied");
    }
}
