// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Backup retention: bounded count and bounded age, as two separate passes.

use crate::config::RetentionPolicy;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tracing::warn;

/// Errors from the retention manager.
#[derive(Debug, Error)]
pub enum PruneError {
    /// The backup directory could not be listed.
    #[error("[RETAIN_LIST] failed to list backup directory: {0}")]
    List(#[from] io::Error),
}

/// One backup directory entry considered for pruning.
#[derive(Debug, Clone)]
struct BackupEntry {
    path: PathBuf,
    /// File name; tie-break key when two entries share a modified time.
    name: String,
    /// Backups are immutable, so last-modified doubles as creation time.
    modified: SystemTime,
}

/// Delete backups in `backup_dir` that fall outside `policy`.
///
/// Considers every entry whose name ends in `.{extension}`. Keeps the
/// `max_count` newest when the cap is positive, then independently deletes
/// survivors older than `max_age_days` — two passes, not one combined
/// cutoff. Individual deletion failures are logged and skipped; they never
/// abort the remaining deletions.
///
/// Returns the number of entries actually deleted.
///
/// # Errors
///
/// Returns [`PruneError::List`] only when the directory listing itself
/// fails.
pub fn prune(
    backup_dir: &Path,
    extension: &str,
    policy: &RetentionPolicy,
) -> Result<usize, PruneError> {
    let entries = list_backups(backup_dir, &format!(".{extension}"))?;
    let doomed = select_doomed(entries, policy, SystemTime::now());

    let mut deleted = 0usize;
    for entry in doomed {
        match fs::remove_file(&entry.path) {
            Ok(()) => deleted += 1,
            Err(err) => {
                warn!(path = %entry.path.display(), %err, "failed to delete backup, skipping");
            }
        }
    }
    Ok(deleted)
}

fn list_backups(backup_dir: &Path, suffix: &str) -> Result<Vec<BackupEntry>, PruneError> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(backup_dir)? {
        let entry = entry?;
        let Ok(name) = entry.file_name().into_string() else {
            // Non-UTF-8 names are never Quill backups.
            continue;
        };
        if !name.ends_with(suffix) {
            continue;
        }
        let modified = match entry.metadata().and_then(|meta| meta.modified()) {
            Ok(modified) => modified,
            Err(err) => {
                warn!(name = %name, %err, "skipping backup with unreadable metadata");
                continue;
            }
        };
        entries.push(BackupEntry {
            path: entry.path(),
            name,
            modified,
        });
    }
    Ok(entries)
}

/// Pure selection of entries to delete. Sorted newest-first; equal modified
/// times fall back to descending name order, which for Quill's timestamped
/// names also means newest-first. The tie-break exists for determinism only.
fn select_doomed(
    entries: Vec<BackupEntry>,
    policy: &RetentionPolicy,
    now: SystemTime,
) -> Vec<BackupEntry> {
    let mut survivors = entries;
    survivors.sort_by(|a, b| {
        b.modified
            .cmp(&a.modified)
            .then_with(|| b.name.cmp(&a.name))
    });

    let mut doomed = Vec::new();

    if policy.max_count > 0 {
        if let Ok(cap) = usize::try_from(policy.max_count) {
            if survivors.len() > cap {
                doomed.extend(survivors.split_off(cap));
            }
        }
    }

    if policy.max_age_days > 0 {
        let horizon = Duration::from_secs(u64::from(policy.max_age_days) * 24 * 60 * 60);
        if let Some(cutoff) = now.checked_sub(horizon) {
            doomed.extend(survivors.into_iter().filter(|e| e.modified < cutoff));
        }
    }

    doomed
}
