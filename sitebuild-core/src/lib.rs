//! SiteBuild Core - Static Website Build Pipeline
//!
//! # Stages (fixed order)
//! 1. Clean the output directory
//! 2. Create the output directory tree
//! 3. Minify CSS
//! 4. Minify JS
//! 5. Copy assets
//! 6. Rewrite HTML references to minified paths
//! 7. Emit build-info.json

pub mod config;
pub mod report;
pub mod hashing;
pub mod minify;
pub mod stages;
pub mod rewrite;
pub mod build_info;
pub mod reporter;
pub mod pipeline;

pub use config::{BuildConfig, MinifierCommand, Rewrite, minified_path};
pub use report::{BuildReport, ItemOutcome, ItemStatus, SkipReason, Stage, StageReport};
pub use hashing::{sha256_hex, canonical_json, tree_digest};
pub use minify::{CommandMinifier, Minifier, MinifyError};
pub use build_info::{BuildInfo, FileCounts, BUILD_INFO_FILE};
pub use reporter::{ConsoleReporter, NullReporter, Reporter};
pub use pipeline::{BuildPipeline, BuildError};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
