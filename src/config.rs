use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ast::{RedirectPolicy, RenderOptions};
use crate::error::{Error, Result};

/// Embedded default configuration.
pub const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub render: RenderOptions,
    #[serde(default)]
    pub redirect: RedirectPolicy,
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read a TOML config file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml(&text)?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_default_matches_default() {
        assert_eq!(Config::from_toml(DEFAULT_CONFIG).unwrap(), Config::default());
    }

    #[test]
    fn test_partial_config() {
        let config = Config::from_toml("[redirect]\nnoclobber = true\n").unwrap();
        assert!(config.redirect.noclobber);
        assert!(!config.redirect.restricted);
        assert_eq!(config.render.indent, 2);
    }

    #[test]
    fn test_empty_config() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn test_bad_config() {
        assert!(matches!(
            Config::from_toml("[render]\nindent = \"wide\"\n"),
            Err(Error::Toml(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load(Path::new("/nonexistent/bash-ast.toml")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
