//! Dry-run planning.
//!
//! Applies the same bucket and unique-name rules as a real run, without
//! touching the filesystem. Files are planned in path order, so the result
//! is deterministic; names already planned in a folder count as taken
//! (case-insensitively), on top of whatever exists on disk.

use anyhow::Result;
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::config::types::bucket_dir;
use crate::fs_ops::{ConflictResolved, bucket_for, fold_name, unique_path_with};

use super::walker::DiscoveryError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub from: PathBuf,
    pub to: PathBuf,
}

#[derive(Debug, Default)]
pub struct Plan {
    pub moves: Vec<PlannedMove>,
    /// Non-directory entries that would be moved into their new folder.
    pub conflicts: Vec<ConflictResolved>,
    pub discovery_errors: Vec<DiscoveryError>,
}

impl Plan {
    /// Distinct destination folders the run would use.
    pub fn folders(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self
            .moves
            .iter()
            .filter_map(|m| m.to.parent().map(Path::to_path_buf))
            .collect();
        dirs.sort();
        dirs.dedup();
        dirs
    }
}

#[derive(Default)]
struct Reservations {
    // (folder, case-folded file name)
    names: HashSet<(PathBuf, String)>,
    // buckets already examined
    buckets: HashSet<OsString>,
}

impl Reservations {
    fn key(path: &Path) -> Option<(PathBuf, String)> {
        let parent = path.parent()?.to_path_buf();
        Some((parent, fold_name(path.file_name()?)))
    }

    fn taken(&self, path: &Path) -> bool {
        Self::key(path).is_some_and(|k| self.names.contains(&k))
    }

    fn reserve(&mut self, path: &Path) {
        if let Some(k) = Self::key(path) {
            self.names.insert(k);
        }
    }
}

/// Build the plan for an already-discovered file list.
pub fn plan_moves(
    cfg: &Config,
    mut files: Vec<PathBuf>,
    discovery_errors: Vec<DiscoveryError>,
) -> Result<Plan> {
    files.sort();
    let mut plan = Plan {
        discovery_errors,
        ..Default::default()
    };
    let mut reserved = Reservations::default();

    for src in files {
        let Some(name) = src.file_name() else {
            continue;
        };
        let bucket = bucket_for(name, &cfg.no_extension_dir);
        let folder = bucket_dir(&cfg.output, &bucket);

        if reserved.buckets.insert(bucket.clone()) {
            if let Some(conflict) = planned_conflict(&folder) {
                reserved.reserve(&conflict.new);
                plan.conflicts.push(conflict);
            }
        }

        let candidate = folder.join(name);
        let to = unique_path_with(&candidate, |p| {
            reserved.taken(p) || fs::symlink_metadata(p).is_ok()
        })?;
        reserved.reserve(&to);
        plan.moves.push(PlannedMove { from: src, to });
    }
    Ok(plan)
}

fn planned_conflict(folder: &Path) -> Option<ConflictResolved> {
    let meta = fs::symlink_metadata(folder).ok()?;
    if meta.is_dir() {
        return None;
    }
    let name = folder.file_name()?;
    Some(ConflictResolved {
        old: folder.to_path_buf(),
        new: folder.join(name),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn cfg(src: &Path, out: &Path) -> Config {
        Config::new(src, out)
    }

    #[test]
    fn same_names_are_numbered_in_path_order() {
        let td = tempdir().unwrap();
        let out = td.path().join("out");
        fs::create_dir_all(&out).unwrap();
        let files = vec![
            PathBuf::from("/s/b/2.txt"),
            PathBuf::from("/s/a/2.txt"),
            PathBuf::from("/s/a/Readme"),
        ];
        let plan = plan_moves(&cfg(Path::new("/s"), &out), files, Vec::new()).unwrap();
        assert_eq!(
            plan.moves,
            vec![
                PlannedMove { from: "/s/a/2.txt".into(), to: out.join(".txt/2.txt") },
                PlannedMove { from: "/s/a/Readme".into(), to: out.join("no_extension/Readme") },
                PlannedMove { from: "/s/b/2.txt".into(), to: out.join(".txt/2_renamed_001_.txt") },
            ]
        );
        assert_eq!(plan.folders(), vec![out.join(".txt"), out.join("no_extension")]);
        assert!(fs::read_dir(&out).unwrap().next().is_none(), "nothing may be created");
    }

    #[test]
    fn case_variants_collide() {
        let td = tempdir().unwrap();
        let files = vec![PathBuf::from("/s/a/x.md"), PathBuf::from("/s/b/X.md")];
        let plan = plan_moves(&cfg(Path::new("/s"), td.path()), files, Vec::new()).unwrap();
        assert_eq!(plan.moves[1].to, td.path().join(".md/X_renamed_001_.md"));
    }

    #[test]
    fn existing_destination_files_are_respected() {
        let td = tempdir().unwrap();
        fs::create_dir_all(td.path().join(".log")).unwrap();
        fs::write(td.path().join(".log/app.log"), b"old").unwrap();
        let plan = plan_moves(
            &cfg(Path::new("/s"), td.path()),
            vec![PathBuf::from("/s/app.log")],
            Vec::new(),
        )
        .unwrap();
        assert_eq!(plan.moves[0].to, td.path().join(".log/app_renamed_001_.log"));
    }

    #[test]
    fn conflict_artifact_is_reported_and_reserved() {
        let td = tempdir().unwrap();
        fs::write(td.path().join(".txt"), b"stray").unwrap();
        let plan = plan_moves(
            &cfg(Path::new("/s"), td.path()),
            vec![PathBuf::from("/s/1.txt")],
            Vec::new(),
        )
        .unwrap();
        assert_eq!(
            plan.conflicts,
            vec![ConflictResolved {
                old: td.path().join(".txt"),
                new: td.path().join(".txt/.txt"),
            }]
        );
        assert_eq!(plan.moves[0].to, td.path().join(".txt/1.txt"));
        assert!(td.path().join(".txt").is_file());
    }
}
