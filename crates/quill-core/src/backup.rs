// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Backup snapshot naming and creation.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

/// ISO-8601 with `:` and `.` swapped for `-` so the stamp is filesystem-safe
/// on every platform. Millisecond precision; lexical order == creation order.
const STAMP_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]-[minute]-[second]-[subsecond digits:3]Z"
);

/// Copy `document` into `backup_dir` under a timestamped name, creating the
/// directory if needed. Returns the path of the snapshot.
pub(crate) fn snapshot(
    document: &Path,
    backup_dir: &Path,
    base: &str,
    extension: &str,
) -> io::Result<PathBuf> {
    fs::create_dir_all(backup_dir)?;
    let stamp = timestamp()?;
    let target = unique_backup_path(backup_dir, base, extension, &stamp);
    fs::copy(document, &target)?;
    Ok(target)
}

/// Pick a backup name that does not collide with an existing entry.
///
/// Two saves inside the same millisecond would otherwise share a stamp and
/// the second would silently overwrite the first; a numeric suffix keeps
/// both. Suffixed names still sort after the plain name, so newest-first
/// ordering by name stays correct for equal timestamps.
fn unique_backup_path(backup_dir: &Path, base: &str, extension: &str, stamp: &str) -> PathBuf {
    let mut candidate = backup_dir.join(format!("{base}_{stamp}.{extension}"));
    let mut suffix = 1u32;
    while candidate.exists() {
        candidate = backup_dir.join(format!("{base}_{stamp}_{suffix}.{extension}"));
        suffix += 1;
    }
    candidate
}

fn timestamp() -> io::Result<String> {
    OffsetDateTime::now_utc()
        .format(STAMP_FORMAT)
        .map_err(io::Error::other)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamp_is_filesystem_safe() {
        let stamp = timestamp().unwrap();
        assert!(!stamp.contains(':'), "no colons in {stamp}");
        assert!(!stamp.contains('.'), "no dots in {stamp}");
        assert!(stamp.ends_with('Z'), "UTC marker in {stamp}");
    }

    #[test]
    fn collision_appends_counter_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let stamp = "2026-08-07T12-30-45-123Z";

        let first = unique_backup_path(dir.path(), "notes", "html", stamp);
        assert_eq!(first, dir.path().join("notes_2026-08-07T12-30-45-123Z.html"));

        fs::write(&first, "taken").unwrap();
        let second = unique_backup_path(dir.path(), "notes", "html", stamp);
        assert_eq!(
            second,
            dir.path().join("notes_2026-08-07T12-30-45-123Z_1.html")
        );

        fs::write(&second, "taken").unwrap();
        let third = unique_backup_path(dir.path(), "notes", "html", stamp);
        assert_eq!(
            third,
            dir.path().join("notes_2026-08-07T12-30-45-123Z_2.html")
        );
    }

    #[test]
    fn suffixed_names_sort_after_the_plain_name() {
        // Name ordering is the tie-break for equal mtimes in the retention
        // pass, so a same-stamp suffix must compare greater than no suffix.
        assert!("notes_2026-08-07T12-30-45-123Z_1.html" > "notes_2026-08-07T12-30-45-123Z.html");
        assert!("notes_2026-08-07T12-30-45-123Z_2.html" > "notes_2026-08-07T12-30-45-123Z_1.html");
    }

    #[test]
    fn snapshot_copies_document_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let document = dir.path().join("notes.html");
        fs::write(&document, "<p>previous</p>").unwrap();

        let backup_dir = dir.path().join("backups");
        let snap = snapshot(&document, &backup_dir, "notes", "html").unwrap();

        assert_eq!(fs::read_to_string(&snap).unwrap(), "<p>previous</p>");
        assert!(snap.starts_with(&backup_dir));
    }
}
