//! Filesystem Stages
//!
//! Clean, create directories, minify and copy. Minify and copy record
//! per-file failures and keep going; clean and directory creation fail the
//! whole build.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::{minified_path, BuildConfig};
use crate::minify::Minifier;
use crate::pipeline::BuildError;
use crate::report::{ItemOutcome, SkipReason, Stage, StageReport};

/// Remove the output root if present
pub fn clean(config: &BuildConfig) -> Result<StageReport, BuildError> {
    let root = config.output_root();
    let mut report = StageReport::new(Stage::Clean);
    let item = root.display().to_string();

    if !root.exists() {
        report.push(ItemOutcome::skipped(item, SkipReason::NotFound));
        return Ok(report);
    }

    match fs::remove_dir_all(&root) {
        Ok(()) => report.push(ItemOutcome::done(item, root)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            report.push(ItemOutcome::skipped(item, SkipReason::NotFound))
        }
        Err(e) => return Err(BuildError::io("remove", &root, e)),
    }
    Ok(report)
}

/// Create every output directory, ancestors included
pub fn create_directories(config: &BuildConfig) -> Result<StageReport, BuildError> {
    let mut report = StageReport::new(Stage::Directories);

    for dir in config.output_dirs() {
        let path = config.output_path(&dir);
        if path.is_dir() {
            report.push(ItemOutcome::skipped(dir, SkipReason::AlreadyExists));
            continue;
        }
        fs::create_dir_all(&path).map_err(|e| BuildError::io("create directory", &path, e))?;
        report.push(ItemOutcome::done(dir, path));
    }
    Ok(report)
}

/// Minify each file; a missing source or failing minifier only affects that file
pub fn minify_files(
    stage: Stage,
    files: &[String],
    config: &BuildConfig,
    minifier: &dyn Minifier,
) -> StageReport {
    let mut report = StageReport::new(stage);

    for file in files {
        let input = config.source_path(file);
        if !input.is_file() {
            report.push(ItemOutcome::skipped(file.as_str(), SkipReason::NotFound));
            continue;
        }
        let Some(target) = minified_path(file) else {
            report.push(ItemOutcome::failed(file.as_str(), "no file extension"));
            continue;
        };
        let output = config.output_path(&target);

        if let Err(e) = ensure_parent(&output) {
            report.push(ItemOutcome::failed(file.as_str(), e.to_string()));
            continue;
        }

        match minifier.minify(&input, &output) {
            Ok(()) => {
                debug!(minifier = minifier.name(), file = %file, "minified");
                report.push(ItemOutcome::done(file.as_str(), output));
            }
            Err(e) => {
                warn!(minifier = minifier.name(), file = %file, error = %e, "minification failed");
                report.push(ItemOutcome::failed(file.as_str(), e.to_string()));
            }
        }
    }
    report
}

/// Copy images, components and the allow-listed root files verbatim
pub fn copy_assets(config: &BuildConfig) -> StageReport {
    let mut report = StageReport::new(Stage::CopyAssets);

    copy_flat_dir(config, &config.image_dir, &mut report);
    copy_flat_dir(config, &config.components_dir, &mut report);

    for file in &config.extra_files {
        let source = config.source_path(file);
        if !source.exists() {
            report.push(ItemOutcome::skipped(file.as_str(), SkipReason::NotFound));
        } else if !source.is_file() {
            report.push(ItemOutcome::skipped(file.as_str(), SkipReason::NotAFile));
        } else {
            report.push(copy_one(file, &source, &config.output_path(file)));
        }
    }
    report
}

/// One level only; subdirectories are skipped, not recursed
fn copy_flat_dir(config: &BuildConfig, dir: &str, report: &mut StageReport) {
    let source_dir = config.source_path(dir);
    if !source_dir.is_dir() {
        debug!(dir = %dir, "asset directory absent, nothing to copy");
        return;
    }

    let mut entries: Vec<PathBuf> = match fs::read_dir(&source_dir) {
        Ok(iter) => iter.filter_map(|e| e.ok().map(|e| e.path())).collect(),
        Err(e) => {
            warn!(dir = %dir, error = %e, "cannot list asset directory");
            report.push(ItemOutcome::failed(dir, e.to_string()));
            return;
        }
    };
    entries.sort();

    for source in entries {
        let Some(name) = source.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        let item = format!("{}/{}", dir, name);
        if !source.is_file() {
            report.push(ItemOutcome::skipped(item, SkipReason::NotAFile));
            continue;
        }
        let dest = config.output_path(dir).join(&name);
        report.push(copy_one(&item, &source, &dest));
    }
}

fn copy_one(item: &str, source: &Path, dest: &Path) -> ItemOutcome {
    let result = ensure_parent(dest).and_then(|_| fs::copy(source, dest));
    match result {
        Ok(bytes) => {
            debug!(item = %item, bytes, "copied");
            ItemOutcome::done(item, dest.to_path_buf())
        }
        Err(e) => {
            warn!(item = %item, error = %e, "copy failed");
            ItemOutcome::failed(item, e.to_string())
        }
    }
}

pub(crate) fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}
