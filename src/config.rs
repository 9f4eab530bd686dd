use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, IoResultExt, Result};

/// hashing configuration, optionally stored as toml
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// how symbolic links inside the tree are treated
    pub symlinks: SymlinkPolicy,
    /// hash sibling entries on a thread pool (needs the `parallel` feature)
    pub parallel: bool,
}

impl Config {
    /// load config from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_path(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).with_path(path)?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            symlinks: SymlinkPolicy::default(),
            parallel: cfg!(feature = "parallel"),
        }
    }
}

/// treatment of symbolic links found below the root
///
/// the root path itself is always resolved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymlinkPolicy {
    /// fail on the first symlink
    #[default]
    Refuse,
    /// hash the link as a file using its target's content;
    /// links to anything but a regular file fail
    File,
    /// resolve links, descending into linked directories; cycles fail
    Follow,
}

impl SymlinkPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymlinkPolicy::Refuse => "refuse",
            SymlinkPolicy::File => "file",
            SymlinkPolicy::Follow => "follow",
        }
    }
}

impl fmt::Display for SymlinkPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SymlinkPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "refuse" => Ok(SymlinkPolicy::Refuse),
            "file" => Ok(SymlinkPolicy::File),
            "follow" => Ok(SymlinkPolicy::Follow),
            _ => Err(Error::InvalidSymlinkPolicy(s.to_string())),
        }
    }
}
