// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Save-and-retain engine for Quill document instances.
//!
//! `quill-core` owns everything with real invariants in a Quill deployment:
//! the save pipeline ([`DocumentStore`]) with its validate → backup → write →
//! prune ordering, and the retention manager ([`retain::prune`]) that bounds
//! backup growth. The HTTP surface (`quill-saver`) and the provisioning CLI
//! (`quill-deploy`) are thin shells over this crate.
//!
//! # Ordering Invariant
//!
//! A backup snapshots the document's *previous* content and is taken before
//! the write, never after. A backup may therefore outlive a failed write —
//! that is acceptable; the reverse (new content written, old content gone)
//! is not.
//!
//! [`DocumentStore::save`] is a straight-line pipeline with no internal
//! locking. Callers that serve requests concurrently must serialize calls
//! per document to preserve the ordering invariant; the saver daemon does so
//! by holding the store behind a mutex.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::use_self
)]

pub mod config;
pub mod retain;
pub mod save;

mod backup;

pub use config::{ConfigError, InstanceConfig, RetentionPolicy};
pub use retain::PruneError;
pub use save::{DocumentStore, SaveError, SaveReceipt};
