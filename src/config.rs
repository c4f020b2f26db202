use std::path::Path;

use serde::Deserialize;

use crate::codec::Format;
use crate::error::Error;
use crate::tree::FileTree;

/// Name of the optional configuration file at the document root.
pub const CONFIG_FILE: &str = ".oasdir.toml";

/// Project configuration loaded from `.oasdir.toml`.
/// Exclude patterns are path prefixes; matching files are never decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Path prefixes kept as opaque passthrough files.
    pub exclude: Vec<String>,
    /// Format of files created by edits.
    pub format: Format,
}

/// Raw TOML structure for `.oasdir.toml`.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct OasdirTomlConfig {
    /// See `Config::exclude`.
    #[serde(default)]
    exclude: Vec<String>,
    /// See `Config::format`.
    #[serde(default)]
    format: Format,
}

impl Config {
    /// Read the config file from a root tree, if it has one.
    ///
    /// # Errors
    ///
    /// Returns `Error::Decode` if the file is not UTF-8,
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn from_tree(tree: &FileTree) -> Result<Self, Error> {
        let Some(bytes) = tree.get_file(CONFIG_FILE) else {
            return Ok(Self::default());
        };
        let content = std::str::from_utf8(bytes).map_err(|err| {
            return Error::Decode { path: CONFIG_FILE.to_string(), reason: err.to_string() };
        })?;
        return Self::parse(content);
    }

    /// Whether a root-relative path falls under an exclude prefix.
    pub fn is_excluded(&self, relative_path: &str) -> bool {
        return self
            .exclude
            .iter()
            .any(|prefix| return relative_path.starts_with(prefix.trim_start_matches("./")));
    }

    /// Load config from `.oasdir.toml` in the given root directory.
    /// Returns defaults if the file doesn't exist. A file that exists but is
    /// malformed is an error, never a silent fallback.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(Error::Io(err)),
        };
        return Self::parse(&content);
    }

    /// Parse config text.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` if the TOML is malformed or has unknown keys.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let raw: OasdirTomlConfig = toml::from_str(content)?;
        return Ok(Self { exclude: raw.exclude, format: raw.format });
    }
}
