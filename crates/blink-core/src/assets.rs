//! Virtual filesystems mounted into the engine.
//!
//! The engine resolves its internal resources (developer tools, bundled
//! pages) through named mounts. Each mount is backed by an `AssetProvider`
//! that answers three questions: the bytes at a path, the entries of a
//! directory, and the size/kind/MIME of an entry.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// Metadata for one asset entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetInfo {
    pub size: u64,
    pub is_dir: bool,
    pub mime: String,
}

pub trait AssetProvider: Send + Sync {
    /// Full contents of the file at `path`.
    fn asset(&self, path: &str) -> Option<Vec<u8>>;

    /// Entry names directly under the directory at `path`.
    fn asset_dir(&self, path: &str) -> Option<Vec<String>>;

    fn asset_info(&self, path: &str) -> Option<AssetInfo>;
}

fn clean_path(path: &str) -> &str {
    path.trim_start_matches('/')
}

// =============================================================================
// DIRECTORY PROVIDER
// =============================================================================

/// Serves files from a base directory.
///
/// A request for `app/index.html` resolves to `{root}/app/index.html`.
/// In-memory overrides take precedence over the filesystem.
pub struct DirAssetProvider {
    root: PathBuf,
    /// path -> (mime, data)
    overrides: HashMap<String, (String, Vec<u8>)>,
}

impl DirAssetProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            overrides: HashMap::new(),
        }
    }

    /// Register an in-memory asset override.
    pub fn add_override(
        &mut self,
        path: impl Into<String>,
        mime: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) {
        self.overrides
            .insert(path.into(), (mime.into(), data.into()));
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a request path to a canonical path inside the root.
    ///
    /// Both sides are canonicalized so `..` segments and symlinks cannot
    /// escape the root.
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let candidate = self.root.join(clean_path(path));
        let canonical_root = std::fs::canonicalize(&self.root).ok()?;
        let canonical = std::fs::canonicalize(&candidate).ok()?;
        if !canonical.starts_with(&canonical_root) {
            tracing::warn!(path, "asset request escapes provider root");
            return None;
        }
        Some(canonical)
    }
}

impl AssetProvider for DirAssetProvider {
    fn asset(&self, path: &str) -> Option<Vec<u8>> {
        if let Some((_, data)) = self.overrides.get(clean_path(path)) {
            return Some(data.clone());
        }
        let file = self.resolve(path)?;
        if !file.is_file() {
            return None;
        }
        std::fs::read(file).ok()
    }

    fn asset_dir(&self, path: &str) -> Option<Vec<String>> {
        let dir = self.resolve(path)?;
        let entries = std::fs::read_dir(dir).ok()?;
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        Some(names)
    }

    fn asset_info(&self, path: &str) -> Option<AssetInfo> {
        if let Some((mime, data)) = self.overrides.get(clean_path(path)) {
            return Some(AssetInfo {
                size: data.len() as u64,
                is_dir: false,
                mime: mime.clone(),
            });
        }
        let resolved = self.resolve(path)?;
        let meta = std::fs::metadata(&resolved).ok()?;
        Some(AssetInfo {
            size: if meta.is_dir() { 0 } else { meta.len() },
            is_dir: meta.is_dir(),
            mime: if meta.is_dir() {
                String::new()
            } else {
                mime_from_extension(&resolved).to_string()
            },
        })
    }
}

// =============================================================================
// EMBEDDED PROVIDER
// =============================================================================

/// Serves a static table of `(path, bytes)` compiled into the binary.
///
/// Directories are implied by path prefixes.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedAssets {
    files: HashMap<&'static str, &'static [u8]>,
}

impl EmbeddedAssets {
    pub fn new(files: &[(&'static str, &'static [u8])]) -> Self {
        Self {
            files: files
                .iter()
                .map(|&(path, data)| (clean_path(path), data))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn dir_prefix(path: &str) -> String {
        let clean = clean_path(path).trim_end_matches('/');
        if clean.is_empty() {
            String::new()
        } else {
            format!("{clean}/")
        }
    }
}

impl AssetProvider for EmbeddedAssets {
    fn asset(&self, path: &str) -> Option<Vec<u8>> {
        self.files.get(clean_path(path)).map(|data| data.to_vec())
    }

    fn asset_dir(&self, path: &str) -> Option<Vec<String>> {
        let prefix = Self::dir_prefix(path);
        let names: BTreeSet<String> = self
            .files
            .keys()
            .filter_map(|file| file.strip_prefix(prefix.as_str()))
            .filter_map(|rest| rest.split('/').next())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        if names.is_empty() && !prefix.is_empty() {
            return None;
        }
        Some(names.into_iter().collect())
    }

    fn asset_info(&self, path: &str) -> Option<AssetInfo> {
        if let Some(data) = self.files.get(clean_path(path)) {
            return Some(AssetInfo {
                size: data.len() as u64,
                is_dir: false,
                mime: mime_from_extension(Path::new(clean_path(path))).to_string(),
            });
        }
        let prefix = Self::dir_prefix(path);
        self.files
            .keys()
            .any(|file| file.starts_with(prefix.as_str()))
            .then(|| AssetInfo {
                size: 0,
                is_dir: true,
                mime: String::new(),
            })
    }
}

/// Guess MIME type from file extension.
pub fn mime_from_extension(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") | Some("htm") => "text/html",
        Some("css") => "text/css",
        Some("js") | Some("mjs") => "application/javascript",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("wasm") => "application/wasm",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("webp") => "image/webp",
        Some("txt") => "text/plain",
        Some("xml") => "application/xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn devtools_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("front_end/panels")).unwrap();
        std::fs::write(
            dir.path().join("front_end/inspector.html"),
            "<html>inspector</html>",
        )
        .unwrap();
        std::fs::write(dir.path().join("front_end/inspector.js"), "boot();").unwrap();
        std::fs::write(dir.path().join("front_end/panels/network.css"), "a{}").unwrap();
        dir
    }

    // -----------------------------------------------------------------
    // Directory provider
    // -----------------------------------------------------------------

    #[test]
    fn dir_provider_reads_file() {
        let dir = devtools_dir();
        let provider = DirAssetProvider::new(dir.path());
        let data = provider.asset("front_end/inspector.html").unwrap();
        assert_eq!(data, b"<html>inspector</html>");
    }

    #[test]
    fn dir_provider_strips_leading_slash() {
        let dir = devtools_dir();
        let provider = DirAssetProvider::new(dir.path());
        assert!(provider.asset("/front_end/inspector.js").is_some());
    }

    #[test]
    fn dir_provider_lists_sorted_entries() {
        let dir = devtools_dir();
        let provider = DirAssetProvider::new(dir.path());
        let entries = provider.asset_dir("front_end").unwrap();
        assert_eq!(entries, vec!["inspector.html", "inspector.js", "panels"]);
    }

    #[test]
    fn dir_provider_info() {
        let dir = devtools_dir();
        let provider = DirAssetProvider::new(dir.path());

        let file = provider.asset_info("front_end/panels/network.css").unwrap();
        assert_eq!(file.size, 3);
        assert!(!file.is_dir);
        assert_eq!(file.mime, "text/css");

        let folder = provider.asset_info("front_end/panels").unwrap();
        assert!(folder.is_dir);
    }

    #[test]
    fn dir_provider_directory_is_not_an_asset() {
        let dir = devtools_dir();
        let provider = DirAssetProvider::new(dir.path());
        assert!(provider.asset("front_end").is_none());
    }

    #[test]
    fn traversal_with_dotdot_is_blocked() {
        let outer = tempfile::tempdir().unwrap();
        std::fs::write(outer.path().join("secret.txt"), "secret").unwrap();
        std::fs::create_dir(outer.path().join("root")).unwrap();
        let provider = DirAssetProvider::new(outer.path().join("root"));
        assert!(provider.asset("../secret.txt").is_none());
        assert!(provider.asset_info("../secret.txt").is_none());
        assert!(provider.asset_dir("..").is_none());
    }

    #[test]
    fn nonexistent_file_returns_none() {
        let dir = devtools_dir();
        let provider = DirAssetProvider::new(dir.path());
        assert!(provider.asset("front_end/missing.html").is_none());
    }

    #[test]
    fn override_takes_precedence() {
        let dir = devtools_dir();
        let mut provider = DirAssetProvider::new(dir.path());
        provider.add_override(
            "front_end/inspector.html",
            "text/html",
            b"<html>override</html>".to_vec(),
        );
        assert_eq!(
            provider.asset("front_end/inspector.html").unwrap(),
            b"<html>override</html>"
        );
        assert_eq!(provider.asset_info("front_end/inspector.html").unwrap().size, 21);
    }

    // -----------------------------------------------------------------
    // Embedded provider
    // -----------------------------------------------------------------

    fn embedded() -> EmbeddedAssets {
        EmbeddedAssets::new(&[
            ("index.html", b"<html></html>".as_slice()),
            ("js/app.js", b"run()".as_slice()),
            ("js/vendor/lib.js", b"lib".as_slice()),
        ])
    }

    #[test]
    fn embedded_lookup() {
        let assets = embedded();
        assert_eq!(assets.len(), 3);
        assert_eq!(assets.asset("/js/app.js").unwrap(), b"run()");
        assert!(assets.asset("js").is_none());
    }

    #[test]
    fn embedded_directories_are_implied() {
        let assets = embedded();
        assert_eq!(assets.asset_dir("").unwrap(), vec!["index.html", "js"]);
        assert_eq!(assets.asset_dir("js").unwrap(), vec!["app.js", "vendor"]);
        assert!(assets.asset_dir("css").is_none());

        let info = assets.asset_info("js/vendor").unwrap();
        assert!(info.is_dir);
        let info = assets.asset_info("index.html").unwrap();
        assert_eq!(info.mime, "text/html");
        assert_eq!(info.size, 13);
    }

    // -----------------------------------------------------------------
    // MIME types
    // -----------------------------------------------------------------

    #[test]
    fn mime_types() {
        assert_eq!(mime_from_extension(Path::new("a.htm")), "text/html");
        assert_eq!(
            mime_from_extension(Path::new("m.mjs")),
            "application/javascript"
        );
        assert_eq!(
            mime_from_extension(Path::new("data.xyz")),
            "application/octet-stream"
        );
    }
}
