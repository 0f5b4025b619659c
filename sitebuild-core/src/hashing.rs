//! Hashing System - SHA-256 for Output Trees
//!
//! Provides a deterministic digest of a build's output so two runs over the
//! same sources can be compared without diffing every file.

use sha2::{Sha256, Digest};
use serde::Serialize;
use serde_json::{Value, to_string};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::fs;
use std::io;
use std::path::Path;

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    to_hex(&Sha256::digest(data))
}

/// Lowercase, two digits per byte
fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{:02x}", b);
        out
    })
}

/// Convert to canonical JSON (sorted keys, no whitespace)
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let v: Value = serde_json::to_value(value)?;
    let sorted = sort_value(&v);
    to_string(&sorted)
}

fn sort_value(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut sorted: Vec<_> = map.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(b.0));
            let sorted_map: serde_json::Map<String, Value> = sorted
                .into_iter()
                .map(|(k, v)| (k.clone(), sort_value(v)))
                .collect();
            Value::Object(sorted_map)
        }
        Value::Array(arr) => {
            Value::Array(arr.iter().map(sort_value).collect())
        }
        _ => v.clone()
    }
}

/// Hash every regular file under `root`, keyed by `/`-separated relative path.
/// Top-level entries named in `exclude` are left out.
pub fn file_hashes(root: &Path, exclude: &[&str]) -> io::Result<BTreeMap<String, String>> {
    let mut hashes = BTreeMap::new();
    if root.is_dir() {
        collect(root, "", exclude, &mut hashes)?;
    }
    Ok(hashes)
}

fn collect(
    dir: &Path,
    prefix: &str,
    exclude: &[&str],
    hashes: &mut BTreeMap<String, String>,
) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if prefix.is_empty() && exclude.contains(&name.as_str()) {
            continue;
        }
        let rel = if prefix.is_empty() { name } else { format!("{}/{}", prefix, name) };
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect(&entry.path(), &rel, exclude, hashes)?;
        } else if file_type.is_file() {
            let data = fs::read(entry.path())?;
            hashes.insert(rel, sha256_hex(&data));
        }
    }
    Ok(())
}

/// Digest of an output tree: sha256 over the canonical JSON of its file hashes
pub fn tree_digest(root: &Path, exclude: &[&str]) -> io::Result<String> {
    let hashes = file_hashes(root, exclude)?;
    let canonical = canonical_json(&hashes).map_err(io::Error::other)?;
    Ok(sha256_hex(canonical.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_canonical_json_sorted() {
        let obj = json!({"z": 1, "a": 2, "m": 3});
        let canonical = canonical_json(&obj).unwrap();
        assert_eq!(canonical, r#"{"a":2,"m":3,"z":1}"#);
    }

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_to_hex_pads_small_bytes() {
        assert_eq!(to_hex(&[0x00, 0x0a, 0xff]), "000aff");
        assert_eq!(to_hex(&[]), "");
    }

    #[test]
    fn test_file_hashes_nested_and_excluded() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("css")).unwrap();
        fs::write(dir.path().join("css/style.min.css"), "a{}").unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        fs::write(dir.path().join("build-info.json"), "{}").unwrap();

        let hashes = file_hashes(dir.path(), &["build-info.json"]).unwrap();
        let keys: Vec<_> = hashes.keys().cloned().collect();
        assert_eq!(keys, vec!["css/style.min.css", "index.html"]);
        assert_eq!(hashes["css/style.min.css"], sha256_hex(b"a{}"));
    }

    #[test]
    fn test_tree_digest_tracks_content() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "one").unwrap();
        let first = tree_digest(dir.path(), &[]).unwrap();
        assert_eq!(first, tree_digest(dir.path(), &[]).unwrap());

        fs::write(dir.path().join("a.txt"), "two").unwrap();
        assert_ne!(first, tree_digest(dir.path(), &[]).unwrap());
    }

    #[test]
    fn test_missing_root_is_empty() {
        let dir = TempDir::new().unwrap();
        let hashes = file_hashes(&dir.path().join("nope"), &[]).unwrap();
        assert!(hashes.is_empty());
    }
}
