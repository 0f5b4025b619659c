//! Build Results - What Each Stage Did
//!
//! Stages return data, never print. Reporters decide how to show it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::build_info::BuildInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Clean,
    Directories,
    MinifyCss,
    MinifyJs,
    CopyAssets,
    RewriteHtml,
    BuildInfo,
}

impl Stage {
    pub fn title(&self) -> &'static str {
        match self {
            Stage::Clean => "Cleaning output directory",
            Stage::Directories => "Creating output directories",
            Stage::MinifyCss => "Minifying CSS files",
            Stage::MinifyJs => "Minifying JavaScript files",
            Stage::CopyAssets => "Copying assets",
            Stage::RewriteHtml => "Updating HTML references",
            Stage::BuildInfo => "Generating build information",
        }
    }

    /// Whether skipped items are worth showing outside verbose mode
    pub fn reports_skips(&self) -> bool {
        matches!(self, Stage::MinifyCss | Stage::MinifyJs)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NotFound,
    AlreadyExists,
    NotAFile,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotFound => write!(f, "not found"),
            SkipReason::AlreadyExists => write!(f, "already exists"),
            SkipReason::NotAFile => write!(f, "not a regular file"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ItemStatus {
    Done,
    Skipped(SkipReason),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemOutcome {
    /// Source-relative name of the file or directory
    pub item: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(flatten)]
    pub status: ItemStatus,
}

impl ItemOutcome {
    pub fn done(item: impl Into<String>, output: PathBuf) -> Self {
        Self { item: item.into(), output: Some(output), status: ItemStatus::Done }
    }

    pub fn skipped(item: impl Into<String>, reason: SkipReason) -> Self {
        Self { item: item.into(), output: None, status: ItemStatus::Skipped(reason) }
    }

    pub fn failed(item: impl Into<String>, message: impl Into<String>) -> Self {
        Self { item: item.into(), output: None, status: ItemStatus::Failed(message.into()) }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, ItemStatus::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: Stage,
    pub outcomes: Vec<ItemOutcome>,
}

impl StageReport {
    pub fn new(stage: Stage) -> Self {
        Self { stage, outcomes: vec![] }
    }

    pub fn push(&mut self, outcome: ItemOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn done_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status == ItemStatus::Done).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes.iter().filter(|o| matches!(o.status, ItemStatus::Skipped(_))).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }

    pub fn outcome(&self, item: &str) -> Option<&ItemOutcome> {
        self.outcomes.iter().find(|o| o.item == item)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildReport {
    pub output_dir: PathBuf,
    pub stages: Vec<StageReport>,
    pub build_info: BuildInfo,
}

impl BuildReport {
    pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    pub fn failed_count(&self) -> usize {
        self.stages.iter().map(StageReport::failed_count).sum()
    }

    pub fn has_failures(&self) -> bool {
        self.failed_count() > 0
    }
}
