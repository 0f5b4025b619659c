//! Build progress reporting.
//!
//! The pipeline hands finished stage reports to a `Reporter`; rendering
//! lives here so stage code never touches stdout.

use std::io::Write;
use std::sync::Mutex;

use crate::config::BuildConfig;
use crate::pipeline::BuildError;
use crate::report::{BuildReport, ItemStatus, StageReport};

pub trait Reporter {
    fn build_started(&self, _config: &BuildConfig) {}
    fn stage_finished(&self, report: &StageReport);
    fn build_finished(&self, _report: &BuildReport) {}
    fn build_failed(&self, _error: &BuildError) {}
}

/// Discards all events
#[derive(Debug, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn stage_finished(&self, _report: &StageReport) {}
}

/// Console reporter with optional colors
pub struct ConsoleReporter {
    use_colors: bool,
    verbose: bool,
    output: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for ConsoleReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleReporter")
            .field("use_colors", &self.use_colors)
            .field("verbose", &self.verbose)
            .finish()
    }
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self {
            use_colors: true,
            verbose: false,
            output: Mutex::new(Box::new(std::io::stdout())),
        }
    }

    /// Write to a custom sink; colors off
    pub fn with_output<W: Write + Send + 'static>(output: W) -> Self {
        Self {
            use_colors: false,
            verbose: false,
            output: Mutex::new(Box::new(output)),
        }
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    /// Also list skipped directories and already-present items
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn color(&self, text: &str, color: &str) -> String {
        if self.use_colors {
            format!("{}{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    fn green(&self, text: &str) -> String {
        self.color(text, "\x1b[32m")
    }

    fn yellow(&self, text: &str) -> String {
        self.color(text, "\x1b[33m")
    }

    fn red(&self, text: &str) -> String {
        self.color(text, "\x1b[31m")
    }

    fn blue(&self, text: &str) -> String {
        self.color(text, "\x1b[34m")
    }

    fn cyan(&self, text: &str) -> String {
        self.color(text, "\x1b[36m")
    }

    fn writeln(&self, line: &str) {
        if let Ok(mut output) = self.output.lock() {
            let _ = writeln!(output, "{}", line);
        }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for ConsoleReporter {
    fn build_started(&self, config: &BuildConfig) {
        self.writeln(&self.cyan(&format!(
            "Building {} -> {}",
            config.source_dir.display(),
            config.output_root().display()
        )));
        self.writeln(&self.cyan(&"=".repeat(50)));
    }

    fn stage_finished(&self, report: &StageReport) {
        self.writeln(&self.blue(&format!("{}...", report.stage)));

        for outcome in &report.outcomes {
            match &outcome.status {
                ItemStatus::Done => {
                    let line = match &outcome.output {
                        Some(out) => format!("   ok {} -> {}", outcome.item, out.display()),
                        None => format!("   ok {}", outcome.item),
                    };
                    self.writeln(&self.green(&line));
                }
                ItemStatus::Skipped(reason) => {
                    if self.verbose || report.stage.reports_skips() {
                        self.writeln(&self.yellow(&format!("   skipped {} ({})", outcome.item, reason)));
                    }
                }
                ItemStatus::Failed(message) => {
                    self.writeln(&self.red(&format!("   FAILED {}: {}", outcome.item, message)));
                }
            }
        }
    }

    fn build_finished(&self, report: &BuildReport) {
        self.writeln(&self.cyan(&"=".repeat(50)));
        let failed = report.failed_count();
        if failed == 0 {
            self.writeln(&self.green("Build completed successfully"));
        } else {
            self.writeln(&self.yellow(&format!(
                "Build completed with {} file{} not processed",
                failed,
                if failed == 1 { "" } else { "s" }
            )));
        }
        self.writeln(&self.blue(&format!("Output written to {}", report.output_dir.display())));
    }

    fn build_failed(&self, error: &BuildError) {
        self.writeln(&self.red(&format!("Build failed: {}", error)));
    }
}
