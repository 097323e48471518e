// src/config.rs

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MigrateError, Result};
use crate::lfs;

/// Replacement identity for one `"Name <email>"` key of the authors table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub email: String,
}

/// One ordered search -> replacement pair, used both for path renames and
/// for content replacement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplacePair {
    pub search: String,
    pub replace: String,
}

/// The JSON configuration document produced by `analyze` and consumed by
/// `migrate` and `show`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Identity substitutions, keyed by the exact `"Name <email>"` string as
    /// it appears in source history.
    #[serde(default)]
    pub authors: BTreeMap<String, Author>,

    /// Advisory warnings collected during analysis. Informational only.
    #[serde(default)]
    pub warnings: Vec<String>,

    /// Ordered substring substitutions applied to every historical path.
    #[serde(default)]
    pub history_rename_files: Vec<ReplacePair>,

    /// Exact historical paths removed from every commit they appear in.
    #[serde(default)]
    pub history_delete_files: Vec<String>,

    /// Exact historical path -> ordered byte substitutions over its content.
    #[serde(default)]
    pub history_replace_file_contents: BTreeMap<String, Vec<ReplacePair>>,

    /// `"default"`, `"none"`, and/or literal patterns.
    #[serde(default = "default_lfs_patterns")]
    pub lfs_patterns: Vec<String>,

    /// Literal patterns always active on top of `lfs_patterns`.
    #[serde(default)]
    pub extra_lfs_patterns: Vec<String>,
}

fn default_lfs_patterns() -> Vec<String> {
    vec![lfs::PATTERNS_DEFAULT.to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Config {
            authors: BTreeMap::new(),
            warnings: Vec::new(),
            history_rename_files: Vec::new(),
            history_delete_files: Vec::new(),
            history_replace_file_contents: BTreeMap::new(),
            lfs_patterns: default_lfs_patterns(),
            extra_lfs_patterns: Vec::new(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        let data = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the config if the file exists, otherwise start from defaults.
    pub fn load_or_default(path: &Path) -> Result<Config> {
        if path.exists() {
            Config::load(path)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut data = serde_json::to_string_pretty(self)?;
        data.push('\n');
        fs::write(path, data)?;
        Ok(())
    }

    /// Reject configurations that would make the replay ambiguous or that a
    /// later stage could only fail on mid-run.
    pub fn validate(&self) -> Result<()> {
        for pair in &self.history_rename_files {
            if pair.search.is_empty() {
                return Err(MigrateError::ConfigValidation(
                    "history_rename_files entry with empty `search`".into(),
                ));
            }
        }
        for (path, pairs) in &self.history_replace_file_contents {
            if path.is_empty() {
                return Err(MigrateError::ConfigValidation(
                    "history_replace_file_contents entry with empty path".into(),
                ));
            }
            for pair in pairs {
                if pair.search.is_empty() {
                    return Err(MigrateError::ConfigValidation(format!(
                        "history_replace_file_contents for `{path}` has an empty `search`"
                    )));
                }
            }
        }
        for path in &self.history_delete_files {
            if path.is_empty() {
                return Err(MigrateError::ConfigValidation(
                    "history_delete_files entry with empty path".into(),
                ));
            }
        }
        // Pattern compilation errors surface here rather than mid-replay.
        lfs::PatternSet::from_config(self)?;
        Ok(())
    }

    /// Fold freshly analyzed data into this config. Analysis only appends:
    /// user-edited authors, rules, and pattern selections are preserved.
    pub fn absorb_analysis(
        &mut self,
        authors: BTreeMap<String, Author>,
        warnings: Vec<String>,
        extra_lfs_candidates: Vec<String>,
    ) {
        for (key, author) in authors {
            self.authors.entry(key).or_insert(author);
        }
        for warning in warnings {
            if !self.warnings.contains(&warning) {
                self.warnings.push(warning);
            }
        }
        for candidate in extra_lfs_candidates {
            if !self.extra_lfs_patterns.contains(&candidate) {
                self.extra_lfs_patterns.push(candidate);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_track_the_builtin_pattern_list() {
        let config = Config::default();
        assert_eq!(config.lfs_patterns, vec!["default".to_string()]);
        assert!(config.history_delete_files.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn json_roundtrip_preserves_rules() {
        let mut config = Config::default();
        config.history_delete_files.push("secrets/token.json".into());
        config.history_rename_files.push(ReplacePair {
            search: "old/".into(),
            replace: "new/".into(),
        });
        config.history_replace_file_contents.insert(
            "app/settings.ini".into(),
            vec![ReplacePair {
                search: "hunter2".into(),
                replace: "xxxxxxx".into(),
            }],
        );

        let json = serde_json::to_string_pretty(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.history_delete_files, config.history_delete_files);
        assert_eq!(back.history_rename_files, config.history_rename_files);
        assert_eq!(
            back.history_replace_file_contents,
            config.history_replace_file_contents
        );
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.lfs_patterns, vec!["default".to_string()]);
        assert!(config.authors.is_empty());
    }

    #[test]
    fn empty_rename_search_is_rejected() {
        let mut config = Config::default();
        config.history_rename_files.push(ReplacePair {
            search: String::new(),
            replace: "x".into(),
        });
        assert!(matches!(
            config.validate(),
            Err(MigrateError::ConfigValidation(_))
        ));
    }

    #[test]
    fn absorb_analysis_never_overwrites_user_entries() {
        let mut config = Config::default();
        config.authors.insert(
            "Ada <ada@example.com>".into(),
            Author {
                name: "Ada Lovelace".into(),
                email: "ada@corp.example".into(),
            },
        );
        config.extra_lfs_patterns.push("*.bin".into());

        let mut fresh = BTreeMap::new();
        fresh.insert(
            "Ada <ada@example.com>".into(),
            Author {
                name: "Ada".into(),
                email: "ada@example.com".into(),
            },
        );
        fresh.insert(
            "Bob <bob@example.com>".into(),
            Author {
                name: "Bob".into(),
                email: "bob@example.com".into(),
            },
        );

        config.absorb_analysis(
            fresh,
            vec!["File can contain sensitive info: a.pem".into()],
            vec!["*.bin".into(), "assets/big.dat".into()],
        );

        // The user-edited mapping survives; new identities are added.
        assert_eq!(
            config.authors["Ada <ada@example.com>"].email,
            "ada@corp.example"
        );
        assert!(config.authors.contains_key("Bob <bob@example.com>"));
        assert_eq!(
            config.extra_lfs_patterns,
            vec!["*.bin".to_string(), "assets/big.dat".to_string()]
        );
        assert_eq!(config.warnings.len(), 1);
    }
}
