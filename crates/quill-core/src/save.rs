// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The save pipeline: validate, back up, overwrite, prune.

use crate::backup;
use crate::config::RetentionPolicy;
use crate::retain;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from the save pipeline.
///
/// [`EmptyContent`](SaveError::EmptyContent) and
/// [`IdentityMismatch`](SaveError::IdentityMismatch) are validation failures
/// raised before any filesystem mutation — the request can simply be
/// corrected and resent. [`Backup`](SaveError::Backup) and
/// [`Write`](SaveError::Write) are I/O failures during mutation and usually
/// indicate a persistent environment problem (full disk, permissions).
#[derive(Debug, Error)]
pub enum SaveError {
    /// The request carried no content.
    #[error("[SAVE_EMPTY] no content received")]
    EmptyContent,
    /// The client claims to be editing a different document.
    #[error(
        "[SAVE_IDENTITY] claimed document '{claimed}' does not match configured document \
         '{configured}'; save aborted to prevent overwriting"
    )]
    IdentityMismatch {
        /// Filename the client asserted, as received.
        claimed: String,
        /// Base name this instance is configured to persist.
        configured: String,
    },
    /// Copying the current document into the backup directory failed.
    #[error("[SAVE_BACKUP_IO] failed to back up current document: {0}")]
    Backup(#[source] io::Error),
    /// Overwriting the document with the new content failed.
    #[error("[SAVE_WRITE_IO] failed to write document: {0}")]
    Write(#[source] io::Error),
}

/// Outcome of a successful save. Informational only.
#[derive(Debug)]
pub struct SaveReceipt {
    /// Snapshot taken of the previous content, when one was taken.
    pub backup: Option<PathBuf>,
    /// Backups removed by the retention pass that followed the write.
    pub pruned: usize,
}

/// One instance's document plus its backup location and retention rules.
///
/// `save` is the only mutation path for the document file. The store holds
/// no interior locking; callers serving concurrent requests must serialize
/// `save` calls per document so the backup-then-write order is preserved.
#[derive(Debug)]
pub struct DocumentStore {
    document: PathBuf,
    backup_dir: PathBuf,
    base_name: String,
    extension: String,
    policy: RetentionPolicy,
}

impl DocumentStore {
    /// Build a store for `document`, backing up into `backup_dir`.
    ///
    /// The base name and extension are derived from the document path; a
    /// path without an extension falls back to `html`, the document format
    /// Quill instances serve.
    pub fn new(document: PathBuf, backup_dir: PathBuf, policy: RetentionPolicy) -> Self {
        let base_name = document
            .file_stem()
            .map_or_else(String::new, |s| s.to_string_lossy().into_owned());
        let extension = document
            .extension()
            .map_or_else(|| "html".to_owned(), |s| s.to_string_lossy().into_owned());
        Self {
            document,
            backup_dir,
            base_name,
            extension,
            policy,
        }
    }

    /// Path of the document this store persists.
    pub fn document(&self) -> &Path {
        &self.document
    }

    /// Configured base name, the identity the claimed filename is checked
    /// against.
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Retention rules this store prunes with.
    pub fn policy(&self) -> RetentionPolicy {
        self.policy
    }

    /// Persist `content` as the new full document.
    ///
    /// Pipeline, in order: content check, identity check (when
    /// `claimed_name` is present), backup of the previous content (unless
    /// backups are disabled or no document exists yet), write, retention
    /// pass. A retention failure is logged and does not fail the save — the
    /// save has already committed by then.
    ///
    /// # Errors
    ///
    /// Validation errors ([`SaveError::EmptyContent`],
    /// [`SaveError::IdentityMismatch`]) guarantee the filesystem is
    /// untouched. [`SaveError::Backup`] and [`SaveError::Write`] surface
    /// mutation I/O failures; after a failed write the pre-existing backup
    /// (if any) is left in place.
    pub fn save(
        &self,
        content: &str,
        claimed_name: Option<&str>,
    ) -> Result<SaveReceipt, SaveError> {
        if content.is_empty() {
            return Err(SaveError::EmptyContent);
        }
        if let Some(claimed) = claimed_name {
            self.verify_identity(claimed)?;
        }

        let backup = if self.policy.backups_disabled() || !self.document.exists() {
            None
        } else {
            let snap =
                backup::snapshot(&self.document, &self.backup_dir, &self.base_name, &self.extension)
                    .map_err(SaveError::Backup)?;
            debug!(backup = %snap.display(), "snapshot taken");
            Some(snap)
        };

        fs::write(&self.document, content).map_err(SaveError::Write)?;

        let pruned = match retain::prune(&self.backup_dir, &self.extension, &self.policy) {
            Ok(count) => count,
            Err(err) => {
                // The save has committed; pruning retries on the next save.
                warn!(%err, "retention pass failed");
                0
            }
        };

        Ok(SaveReceipt { backup, pruned })
    }

    /// Compare the client-claimed filename against the configured base name.
    ///
    /// The claim may arrive with or without the document extension; a
    /// trailing `.{extension}` is stripped before comparison. An absent
    /// claim is not checked at all (permissive mode for older clients).
    fn verify_identity(&self, claimed: &str) -> Result<(), SaveError> {
        let suffix = format!(".{}", self.extension);
        let claimed_base = claimed.strip_suffix(&suffix).unwrap_or(claimed);
        if claimed_base == self.base_name {
            Ok(())
        } else {
            Err(SaveError::IdentityMismatch {
                claimed: claimed.to_owned(),
                configured: self.base_name.clone(),
            })
        }
    }
}
