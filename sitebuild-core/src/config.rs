//! Build Configuration - One Immutable Value Per Run
//!
//! Every list the pipeline walks lives here. Stages derive what they need
//! (minified names, rewrite pairs, output dirs) instead of repeating literals.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::pipeline::BuildError;

/// Config file picked up from the source directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "sitebuild.json";

pub const INPUT_PLACEHOLDER: &str = "{input}";
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildConfig {
    pub source_dir: PathBuf,
    /// Relative paths resolve against `source_dir`
    pub out_dir: PathBuf,
    pub css_files: Vec<String>,
    pub js_files: Vec<String>,
    pub html_files: Vec<String>,
    pub image_dir: String,
    pub components_dir: String,
    pub extra_files: Vec<String>,
    pub package_file: String,
    pub css_minifier: MinifierCommand,
    pub js_minifier: MinifierCommand,
}

/// External minifier invocation. `{input}` and `{output}` in `args` are
/// replaced with the file paths at call time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinifierCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl MinifierCommand {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn clean_css() -> Self {
        Self::new("npx", &["cleancss", "-o", OUTPUT_PLACEHOLDER, INPUT_PLACEHOLDER])
    }

    pub fn uglify_js() -> Self {
        Self::new("npx", &["uglifyjs", INPUT_PLACEHOLDER, "-o", OUTPUT_PLACEHOLDER, "-c", "-m"])
    }

    fn mentions(&self, placeholder: &str) -> bool {
        self.args.iter().any(|a| a.contains(placeholder))
    }
}

/// A literal substring replacement applied to HTML pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rewrite {
    pub from: String,
    pub to: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("."),
            out_dir: PathBuf::from("dist"),
            css_files: strings(&["css/style.css", "css/responsive.css"]),
            js_files: strings(&["js/main.js"]),
            html_files: strings(&[
                "index.html",
                "about-us.html",
                "solutions.html",
                "services.html",
                "contact.html",
            ]),
            image_dir: "assets/images".to_string(),
            components_dir: "components".to_string(),
            extra_files: strings(&[
                "manifest.json",
                "sw.js",
                "sitemap.xml",
                "browserconfig.xml",
                "security-headers.conf",
                "server.py",
            ]),
            package_file: "package.json".to_string(),
            css_minifier: MinifierCommand::clean_css(),
            js_minifier: MinifierCommand::uglify_js(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl BuildConfig {
    /// Load a config file. Fields absent from the file keep their defaults.
    pub fn load(path: &Path) -> Result<Self, BuildError> {
        let content = fs::read_to_string(path).map_err(|e| BuildError::io("read config", path, e))?;
        serde_json::from_str(&content).map_err(|source| BuildError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve the config for a source directory: an explicit file wins,
    /// then `sitebuild.json` inside `source_dir`, then the defaults.
    pub fn discover(explicit: Option<&Path>, source_dir: Option<&Path>) -> Result<Self, BuildError> {
        let mut config = match explicit {
            Some(path) => Self::load(path)?,
            None => {
                let root = source_dir.unwrap_or_else(|| Path::new("."));
                let candidate = root.join(DEFAULT_CONFIG_FILE);
                if candidate.is_file() {
                    Self::load(&candidate)?
                } else {
                    Self::default()
                }
            }
        };
        if let Some(dir) = source_dir {
            config.source_dir = dir.to_path_buf();
        }
        Ok(config)
    }

    /// Absolute-or-cwd-relative output root
    pub fn output_root(&self) -> PathBuf {
        if self.out_dir.is_absolute() {
            self.out_dir.clone()
        } else {
            self.source_dir.join(&self.out_dir)
        }
    }

    pub fn source_path(&self, rel: &str) -> PathBuf {
        self.source_dir.join(rel)
    }

    pub fn output_path(&self, rel: &str) -> PathBuf {
        self.output_root().join(rel)
    }

    /// Literal rewrites, CSS first then JS, in configuration order
    pub fn rewrites(&self) -> Vec<Rewrite> {
        self.css_files
            .iter()
            .chain(self.js_files.iter())
            .filter_map(|from| {
                minified_path(from).map(|to| Rewrite { from: from.clone(), to })
            })
            .collect()
    }

    /// Directories the initializer creates under the output root
    pub fn output_dirs(&self) -> Vec<String> {
        let mut dirs: Vec<String> = vec![];
        let parents = self
            .css_files
            .iter()
            .chain(self.js_files.iter())
            .filter_map(|f| f.rsplit_once('/').map(|(dir, _)| dir.to_string()));
        let flat = [self.image_dir.clone(), self.components_dir.clone()];

        for dir in parents.chain(flat) {
            if !dir.is_empty() && !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }
        dirs
    }

    /// Reject configurations that would damage the source tree or can't run
    pub fn validate(&self) -> Result<(), BuildError> {
        if self.out_dir.as_os_str().is_empty() {
            return Err(BuildError::Config("outDir must name a directory other than the source root".into()));
        }
        let out_root = resolve(&self.output_root())?;
        let source = resolve(&self.source_dir)?;
        if out_root == source {
            return Err(BuildError::Config(format!(
                "outDir {} is the source directory",
                self.out_dir.display()
            )));
        }
        if source.starts_with(&out_root) {
            return Err(BuildError::Config(format!(
                "outDir {} contains the source directory",
                self.out_dir.display()
            )));
        }

        for file in self.css_files.iter().chain(self.js_files.iter()) {
            if minified_path(file).is_none() {
                return Err(BuildError::Config(format!("{} has no file extension to minify", file)));
            }
        }

        for (label, command) in [("cssMinifier", &self.css_minifier), ("jsMinifier", &self.js_minifier)] {
            if command.program.trim().is_empty() {
                return Err(BuildError::Config(format!("{} program is empty", label)));
            }
            if !command.mentions(INPUT_PLACEHOLDER) || !command.mentions(OUTPUT_PLACEHOLDER) {
                return Err(BuildError::Config(format!(
                    "{} args must mention both {} and {}",
                    label, INPUT_PLACEHOLDER, OUTPUT_PLACEHOLDER
                )));
            }
        }

        Ok(())
    }
}

/// `css/style.css` -> `css/style.min.css`. None when the name has no extension.
pub fn minified_path(rel: &str) -> Option<String> {
    let name_start = rel.rfind('/').map_or(0, |i| i + 1);
    let dot = rel[name_start..].rfind('.')? + name_start;
    if dot == name_start {
        // dotfile, e.g. `.htaccess`
        return None;
    }
    Some(format!("{}.min{}", &rel[..dot], &rel[dot..]))
}

/// Absolute form of `path` for overlap checks: anchored at the current
/// directory, `.` and `..` folded, symlinks resolved on the part that exists.
fn resolve(path: &Path) -> Result<PathBuf, BuildError> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        let cwd = env::current_dir().map_err(|e| BuildError::io("read current directory", path, e))?;
        cwd.join(path)
    };

    let mut folded = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                folded.pop();
            }
            other => folded.push(other.as_os_str()),
        }
    }

    // canonicalize the deepest existing ancestor, re-append the rest
    let mut existing = folded.as_path();
    let mut missing = vec![];
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return Ok(folded),
        }
    }
    let mut resolved = existing.canonicalize().map_err(|e| BuildError::io("resolve", existing, e))?;
    resolved.extend(missing.iter().rev());
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_site_layout() {
        let config = BuildConfig::default();
        assert_eq!(config.css_files, vec!["css/style.css", "css/responsive.css"]);
        assert_eq!(config.js_files, vec!["js/main.js"]);
        assert_eq!(config.html_files.len(), 5);
        assert_eq!(config.extra_files.len(), 6);
        assert_eq!(config.output_root(), PathBuf::from("./dist"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_minified_path() {
        assert_eq!(minified_path("css/style.css").as_deref(), Some("css/style.min.css"));
        assert_eq!(minified_path("js/main.js").as_deref(), Some("js/main.min.js"));
        assert_eq!(minified_path("app.v2.js").as_deref(), Some("app.v2.min.js"));
        assert_eq!(minified_path("css.d/style").as_deref(), None);
        assert_eq!(minified_path("js/.hidden"), None);
    }

    #[test]
    fn test_rewrites_follow_file_lists() {
        let rewrites = BuildConfig::default().rewrites();
        let pairs: Vec<_> = rewrites.iter().map(|r| (r.from.as_str(), r.to.as_str())).collect();
        assert_eq!(
            pairs,
            vec![
                ("css/style.css", "css/style.min.css"),
                ("css/responsive.css", "css/responsive.min.css"),
                ("js/main.js", "js/main.min.js"),
            ]
        );
    }

    #[test]
    fn test_output_dirs_deduplicated() {
        let dirs = BuildConfig::default().output_dirs();
        assert_eq!(dirs, vec!["css", "js", "assets/images", "components"]);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: BuildConfig = serde_json::from_str(r#"{"outDir": "public", "jsFiles": ["js/app.js"]}"#).unwrap();
        assert_eq!(config.out_dir, PathBuf::from("public"));
        assert_eq!(config.js_files, vec!["js/app.js"]);
        assert_eq!(config.css_files, BuildConfig::default().css_files);
        assert_eq!(config.css_minifier, MinifierCommand::clean_css());
    }

    #[test]
    fn test_validate_rejects_source_root_as_output() {
        for out in [".", "", "./", "..", "dist/..", "a/../..", "./dist/../"] {
            let config = BuildConfig { out_dir: PathBuf::from(out), ..Default::default() };
            assert!(config.validate().is_err(), "outDir {:?} should be rejected", out);
        }
    }

    #[test]
    fn test_validate_rejects_absolute_ancestor() {
        let config = BuildConfig {
            source_dir: PathBuf::from("/srv/site"),
            out_dir: PathBuf::from("/srv"),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_absolute_parent_of_relative_source() {
        let cwd = env::current_dir().unwrap();
        let mut outs = vec![cwd.clone()];
        if let Some(parent) = cwd.parent() {
            outs.push(parent.to_path_buf());
        }
        for out in outs {
            let config = BuildConfig { out_dir: out.clone(), ..Default::default() };
            assert!(config.validate().is_err(), "outDir {} should be rejected", out.display());
        }
    }

    #[test]
    fn test_validate_allows_sibling_and_nested_output() {
        let dir = tempfile::TempDir::new().unwrap();
        let source = dir.path().join("site");
        fs::create_dir_all(&source).unwrap();

        for out in ["dist", "build/www", "../public"] {
            let config = BuildConfig { source_dir: source.clone(), out_dir: PathBuf::from(out), ..Default::default() };
            assert!(config.validate().is_ok(), "outDir {:?} should be accepted", out);
        }
        let config = BuildConfig { source_dir: source.clone(), out_dir: PathBuf::from("dist/../.."), ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_minifier_template() {
        let config = BuildConfig {
            css_minifier: MinifierCommand::new("cleancss", &["{input}"]),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("cssMinifier"));
    }

    #[test]
    fn test_validate_rejects_extensionless_asset() {
        let config = BuildConfig { js_files: vec!["js/main".into()], ..Default::default() };
        assert!(config.validate().is_err());
    }
}
