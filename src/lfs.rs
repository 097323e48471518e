// src/lfs.rs

use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::config::Config;
use crate::error::{MigrateError, Result};

/// Keyword enabling the built-in pattern list inside `lfs_patterns`.
pub const PATTERNS_DEFAULT: &str = "default";
/// Keyword suppressing the built-in pattern list inside `lfs_patterns`.
pub const PATTERNS_NONE: &str = "none";

/// Files at or above this size are proposed as LFS candidates during analysis
/// even when no pattern matches them.
pub const LFS_SIZE_THRESHOLD: u64 = 1024 * 1024;

/// Non-exhaustive list of typical binary/large file types. Bare extensions;
/// entries containing `*` are full glob patterns.
const DEFAULT_PATTERNS: &[&str] = &[
    // Archives
    "zip", "7z", "gz", "rar", "tar",
    // Audio
    "mp3", "m4a", "ogg", "wav", "aiff", "aif", "mod", "it", "s3m", "xm",
    // Image
    "jpg", "jpeg", "png", "apng", "gif", "bmp", "ico", "exr", "tga", "tiff",
    "tif", "iff", "pict", "dds", "xcf", "kra", "kpp", "clip", "webm", "webp",
    "svg", "svgz", "psd", "afphoto", "afdesign", "qoi", "ai", "dwg",
    // 3D
    "fbx", "obj", "max", "blend", "blender", "dae", "mb", "ma", "3ds", "dfx",
    "c4d", "lwo", "lwo2", "abc", "3dm", "glb",
    // Docs
    "pdf", "doc", "docx", "ppt", "pptx", "rtf", "odt", "xls", "xlsx",
    // Fonts
    "ttf", "otf", "font",
    // Video
    "mov", "avi", "asf", "mpg", "mpeg", "mp4", "flv", "ogv", "wmv",
    // Executables
    "slo", "lo", "o", "gch", "pch", "so", "dylib", "dll", "lai", "la", "a",
    "lib", "exe", "out", "app", "class", "jar", "war", "ear", "keystore",
    "dex", "apk", "dmg",
    // Other binaries
    "bin", "dat", "pak", "pack",
    // Unity
    "cubemap", "unitypackage", "*-[Tt]errain.asset", "*-[Nn]av[Mm]esh.asset",
];

/// Classification result for one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub tracked: bool,
    /// The pattern that matched, when tracked.
    pub pattern: Option<String>,
}

/// The effective set of active LFS patterns, resolved from the config.
pub struct PatternSet {
    patterns: Vec<String>,
    set: GlobSet,
}

/// Bare extensions become `*.ext`; anything already containing `*` is kept
/// as a full pattern.
fn normalize(pattern: &str) -> String {
    if pattern.contains('*') {
        pattern.to_string()
    } else {
        format!("*.{pattern}")
    }
}

impl PatternSet {
    /// Resolve `lfs_patterns` + `extra_lfs_patterns` into one matcher.
    /// `"none"` suppresses the built-in list; `"default"` (or neither
    /// keyword) enables it; extras are always active.
    pub fn from_config(config: &Config) -> Result<PatternSet> {
        let none = config.lfs_patterns.iter().any(|p| p == PATTERNS_NONE);

        let mut patterns = Vec::new();
        if !none {
            patterns.extend(DEFAULT_PATTERNS.iter().map(|p| normalize(p)));
        }
        for pattern in &config.lfs_patterns {
            if pattern == PATTERNS_DEFAULT || pattern == PATTERNS_NONE {
                continue;
            }
            patterns.push(normalize(pattern));
        }
        for pattern in &config.extra_lfs_patterns {
            patterns.push(normalize(pattern));
        }
        let mut seen = std::collections::BTreeSet::new();
        patterns.retain(|pattern| seen.insert(pattern.clone()));

        let mut builder = GlobSetBuilder::new();
        for pattern in &patterns {
            let glob = Glob::new(pattern).map_err(|source| MigrateError::Pattern {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        let set = builder.build().map_err(|source| MigrateError::Pattern {
            pattern: "<pattern set>".into(),
            source,
        })?;

        Ok(PatternSet { patterns, set })
    }

    /// Decide whether `path` belongs in LFS. Patterns are tried against the
    /// full path and against the bare filename.
    pub fn classify(&self, path: &str) -> Verdict {
        let mut matches = self.set.matches(path);
        if matches.is_empty() {
            if let Some(name) = Path::new(path).file_name().and_then(|n| n.to_str()) {
                matches = self.set.matches(name);
            }
        }
        match matches.first() {
            Some(&index) => Verdict {
                tracked: true,
                pattern: Some(self.patterns[index].clone()),
            },
            None => Verdict {
                tracked: false,
                pattern: None,
            },
        }
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.classify(path).tracked
    }

    /// Render the `.gitattributes` content for the active patterns: one line
    /// per pattern, each routed through the LFS filter and marked binary.
    pub fn gitattributes(&self) -> String {
        let mut out = String::new();
        for pattern in &self.patterns {
            out.push_str(&format!(
                "{pattern} filter=lfs diff=lfs merge=lfs -text\n"
            ));
        }
        out
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

/// Analysis heuristic for files no pattern covers: large, or NUL bytes in
/// the leading window.
pub fn looks_large_or_binary(size: u64, head: &[u8]) -> bool {
    if size >= LFS_SIZE_THRESHOLD {
        return true;
    }
    head[..head.len().min(1024)].contains(&0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_for(lfs_patterns: &[&str], extra: &[&str]) -> PatternSet {
        let mut config = Config::default();
        config.lfs_patterns = lfs_patterns.iter().map(|s| s.to_string()).collect();
        config.extra_lfs_patterns = extra.iter().map(|s| s.to_string()).collect();
        PatternSet::from_config(&config).unwrap()
    }

    #[test]
    fn default_list_tracks_common_binaries() {
        let set = set_for(&["default"], &[]);
        assert!(set.is_match("art/logo.png"));
        assert!(set.is_match("music/theme.mp3"));
        assert!(!set.is_match("src/main.rs"));
    }

    #[test]
    fn extra_patterns_track_on_top_of_defaults() {
        let set = set_for(&["default"], &["*.bin"]);
        let verdict = set.classify("build/output.bin");
        assert!(verdict.tracked);
        assert_eq!(verdict.pattern.as_deref(), Some("*.bin"));
    }

    #[test]
    fn none_disables_the_builtin_list() {
        let set = set_for(&["none"], &[]);
        assert!(!set.is_match("art/logo.png"));
        assert!(!set.is_match("build/output.bin"));
    }

    #[test]
    fn extras_stay_active_under_none() {
        let set = set_for(&["none"], &["*.bin"]);
        assert!(set.is_match("build/output.bin"));
        assert!(!set.is_match("art/logo.png"));
    }

    #[test]
    fn bare_extensions_are_normalized() {
        let set = set_for(&["none", "pdf"], &["psd"]);
        assert!(set.is_match("docs/handbook.pdf"));
        assert!(set.is_match("art/mock.psd"));
    }

    #[test]
    fn unity_patterns_match_by_filename() {
        let set = set_for(&["default"], &[]);
        assert!(set.is_match("Assets/Scenes/Level1-Terrain.asset"));
        assert!(set.is_match("Assets/Scenes/Level1-NavMesh.asset"));
        assert!(!set.is_match("Assets/Scenes/Level1.asset"));
    }

    #[test]
    fn gitattributes_lines_declare_the_lfs_filter() {
        let set = set_for(&["none"], &["*.png"]);
        assert_eq!(
            set.gitattributes(),
            "*.png filter=lfs diff=lfs merge=lfs -text\n"
        );
    }

    #[test]
    fn invalid_glob_is_a_pattern_error() {
        let mut config = Config::default();
        config.extra_lfs_patterns.push("a{b".into());
        assert!(matches!(
            PatternSet::from_config(&config),
            Err(MigrateError::Pattern { .. })
        ));
    }

    #[test]
    fn size_and_nul_bytes_flag_binary_candidates() {
        assert!(looks_large_or_binary(LFS_SIZE_THRESHOLD, b"text"));
        assert!(looks_large_or_binary(10, b"ab\0cd"));
        assert!(!looks_large_or_binary(10, b"plain text"));
    }
}
