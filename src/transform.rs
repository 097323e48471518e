// src/transform.rs

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::config::Config;
use crate::error::{MigrateError, Result};
use crate::model::{FileMode, Snapshot};

/// Minimal read capability over a content store. Implemented for the source
/// repository; tests substitute an in-memory map.
pub trait ContentSource {
    fn read(&self, oid: git2::Oid) -> Result<Vec<u8>>;
}

impl ContentSource for git2::Repository {
    fn read(&self, oid: git2::Oid) -> Result<Vec<u8>> {
        Ok(self.find_blob(oid)?.content().to_vec())
    }
}

/// Transformed content for one path: either still a reference into the
/// source store, or replaced bytes held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Blob(git2::Oid),
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutEntry {
    pub content: Content,
    pub mode: FileMode,
}

/// Ordered path -> transformed content mapping for one commit.
pub type TransformedSnapshot = BTreeMap<String, OutEntry>;

/// Compiled transform rules. Deletion and content replacement are keyed by
/// exact historical paths as they appear at each revision (pre-rename); a
/// file that held several names over history must be listed under each name
/// to be fully affected.
#[derive(Debug, Default)]
pub struct TransformRules {
    deletes: BTreeSet<String>,
    renames: Vec<(String, String)>,
    replaces: HashMap<String, Vec<(Vec<u8>, Vec<u8>)>>,
}

impl TransformRules {
    pub fn from_config(config: &Config) -> TransformRules {
        TransformRules {
            deletes: config.history_delete_files.iter().cloned().collect(),
            renames: config
                .history_rename_files
                .iter()
                .map(|pair| (pair.search.clone(), pair.replace.clone()))
                .collect(),
            replaces: config
                .history_replace_file_contents
                .iter()
                .map(|(path, pairs)| {
                    let pairs = pairs
                        .iter()
                        .map(|pair| {
                            (pair.search.as_bytes().to_vec(), pair.replace.as_bytes().to_vec())
                        })
                        .collect();
                    (path.clone(), pairs)
                })
                .collect(),
        }
    }

    fn rename(&self, path: &str) -> String {
        self.renames
            .iter()
            .fold(path.to_string(), |p, (search, replace)| {
                p.replace(search.as_str(), replace)
            })
    }
}

/// Apply delete, rename, and content-replace rules to one full-tree snapshot.
/// Pure and deterministic: the same snapshot and rules always produce the
/// same output, so analysis can dry-run the exact transformation migrate
/// will perform.
pub fn transform(
    files: &Snapshot,
    rules: &TransformRules,
    source: &dyn ContentSource,
) -> Result<TransformedSnapshot> {
    let mut out = TransformedSnapshot::new();
    let mut origin: HashMap<String, String> = HashMap::new();

    for (path, entry) in files {
        if rules.deletes.contains(path) {
            continue;
        }

        let new_path = rules.rename(path);
        if let Some(first) = origin.get(&new_path) {
            return Err(MigrateError::RenameCollision {
                first: first.clone(),
                second: path.clone(),
                target: new_path,
            });
        }

        let content = match rules.replaces.get(path) {
            Some(pairs) => {
                let mut data = source.read(entry.oid)?;
                for (search, replace) in pairs {
                    data = replace_bytes(&data, search, replace);
                }
                Content::Bytes(data)
            }
            None => Content::Blob(entry.oid),
        };

        origin.insert(new_path.clone(), path.clone());
        out.insert(
            new_path,
            OutEntry {
                content,
                mode: entry.mode,
            },
        );
    }

    Ok(out)
}

/// Exact byte-sequence substitution, left to right, non-overlapping.
pub fn replace_bytes(data: &[u8], search: &[u8], replace: &[u8]) -> Vec<u8> {
    if search.is_empty() || search.len() > data.len() {
        return data.to_vec();
    }
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        if data[i..].starts_with(search) {
            out.extend_from_slice(replace);
            i += search.len();
        } else {
            out.push(data[i]);
            i += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReplacePair;
    use crate::model::FileEntry;

    struct MemorySource(HashMap<git2::Oid, Vec<u8>>);

    impl ContentSource for MemorySource {
        fn read(&self, oid: git2::Oid) -> Result<Vec<u8>> {
            Ok(self.0.get(&oid).cloned().unwrap_or_default())
        }
    }

    fn oid(n: u8) -> git2::Oid {
        git2::Oid::from_str(&format!("{:040x}", n)).unwrap()
    }

    fn entry(n: u8) -> FileEntry {
        FileEntry {
            oid: oid(n),
            mode: FileMode::Normal,
        }
    }

    fn snapshot(paths: &[(&str, u8)]) -> Snapshot {
        paths
            .iter()
            .map(|&(path, n)| (path.to_string(), entry(n)))
            .collect()
    }

    fn rules(config: &Config) -> TransformRules {
        TransformRules::from_config(config)
    }

    fn empty_source() -> MemorySource {
        MemorySource(HashMap::new())
    }

    #[test]
    fn delete_removes_the_exact_path_only() {
        let mut config = Config::default();
        config.history_delete_files.push("secret.cer".into());
        let snap = snapshot(&[("secret.cer", 1), ("keep/secret.cer", 2)]);

        let out = transform(&snap, &rules(&config), &empty_source()).unwrap();
        assert!(!out.contains_key("secret.cer"));
        assert!(out.contains_key("keep/secret.cer"));
    }

    #[test]
    fn renames_compose_left_to_right() {
        let mut config = Config::default();
        config.history_rename_files.push(ReplacePair {
            search: "docs/".into(),
            replace: "manual/".into(),
        });
        config.history_rename_files.push(ReplacePair {
            search: ".txt".into(),
            replace: ".md".into(),
        });
        let snap = snapshot(&[("docs/intro.txt", 1)]);

        let out = transform(&snap, &rules(&config), &empty_source()).unwrap();
        assert!(out.contains_key("manual/intro.md"));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn rename_collision_is_fatal_and_names_both_paths() {
        let mut config = Config::default();
        config.history_rename_files.push(ReplacePair {
            search: "a.txt".into(),
            replace: "c.txt".into(),
        });
        config.history_rename_files.push(ReplacePair {
            search: "b.txt".into(),
            replace: "c.txt".into(),
        });
        let snap = snapshot(&[("a.txt", 1), ("b.txt", 2)]);

        match transform(&snap, &rules(&config), &empty_source()) {
            Err(MigrateError::RenameCollision {
                first,
                second,
                target,
            }) => {
                assert_eq!(first, "a.txt");
                assert_eq!(second, "b.txt");
                assert_eq!(target, "c.txt");
            }
            other => panic!("expected RenameCollision, got {other:?}"),
        }
    }

    #[test]
    fn content_replace_is_exact_bytes_and_keyed_by_original_path() {
        let mut config = Config::default();
        config.history_replace_file_contents.insert(
            "app/settings.ini".into(),
            vec![ReplacePair {
                search: "password=hunter2".into(),
                replace: "password=REDACTED".into(),
            }],
        );
        config.history_rename_files.push(ReplacePair {
            search: "app/".into(),
            replace: "config/".into(),
        });

        let source = MemorySource(
            [(oid(1), b"password=hunter2\nport=80\n".to_vec())]
                .into_iter()
                .collect(),
        );
        let snap = snapshot(&[("app/settings.ini", 1)]);

        let out = transform(&snap, &rules(&config), &source).unwrap();
        // The rule is keyed by the pre-rename path; output lives at the
        // renamed path.
        let entry = &out["config/settings.ini"];
        assert_eq!(
            entry.content,
            Content::Bytes(b"password=REDACTED\nport=80\n".to_vec())
        );
    }

    #[test]
    fn second_pass_without_the_needle_is_a_noop() {
        let replaced = replace_bytes(b"secret secret", b"secret", b"xxxx");
        assert_eq!(replaced, b"xxxx xxxx");
        let again = replace_bytes(&replaced, b"secret", b"xxxx");
        assert_eq!(again, replaced);
    }

    #[test]
    fn replace_bytes_is_binary_safe() {
        let data = [0u8, 1, 2, 0, 1, 3];
        let out = replace_bytes(&data, &[0, 1], &[9]);
        assert_eq!(out, vec![9, 2, 9, 3]);
    }

    #[test]
    fn untouched_paths_keep_their_content_reference() {
        let config = Config::default();
        let snap = snapshot(&[("src/lib.rs", 7)]);
        let out = transform(&snap, &rules(&config), &empty_source()).unwrap();
        assert_eq!(out["src/lib.rs"].content, Content::Blob(oid(7)));
    }
}
