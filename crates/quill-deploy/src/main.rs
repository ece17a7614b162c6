// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Quill provisioning CLI.
//!
//! Stamps out one saver instance per document: renders the editor template
//! with the chosen port and document name, writes the instance config the
//! saver daemon reads at startup, and creates the backup directory. The
//! saver binary itself is shared between instances; only the config is
//! per-instance.
//!
//! # Usage
//! ```text
//! quill-deploy <target-dir> <name> <port> [--template editor.html]
//! ```
//!
//! Exits `0` printing a deployment summary, or non-zero with a descriptive
//! error on a missing argument, an out-of-range port, or a document name
//! outside `[A-Za-z0-9_-]`.

// The CLI is expected to print to stdout/stderr.
#![allow(clippy::print_stdout, clippy::print_stderr)]

use anyhow::{bail, Context, Result};
use clap::Parser;
use quill_core::{InstanceConfig, RetentionPolicy};
use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Markers the editor template carries for instance stamping.
const PORT_MARKER: &str = "let nodePort = 0;";
const NAME_MARKER: &str = "let fileName = \"help\";";

#[derive(Parser, Debug)]
#[command(author, version, about = "Provision a Quill saver instance")]
struct Args {
    /// Directory the instance is written to (created if missing)
    target: PathBuf,
    /// Document base name (letters, digits, '_' and '-')
    name: String,
    /// Port the saver instance will listen on
    #[arg(value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,
    /// Editor document template to render
    #[arg(long, default_value = "editor.html")]
    template: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if !valid_name(&args.name) {
        bail!(
            "invalid document name '{}': use letters, digits, '_' or '-'",
            args.name
        );
    }

    let template = fs::read_to_string(&args.template)
        .with_context(|| format!("read template {}", args.template.display()))?;

    fs::create_dir_all(&args.target)
        .with_context(|| format!("create target directory {}", args.target.display()))?;

    let rendered = render_template(&template, &args.name, args.port);
    if rendered == template {
        eprintln!(
            "warning: template {} carries no instance markers; copied as-is",
            args.template.display()
        );
    }
    let document_name = format!("{}.html", args.name);
    fs::write(args.target.join(&document_name), rendered)
        .with_context(|| format!("write {document_name}"))?;

    let config = InstanceConfig {
        document: PathBuf::from(&document_name),
        backup_dir: PathBuf::from("backups"),
        listen: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), args.port),
        retention: RetentionPolicy::default(),
    };
    let config_name = format!("svr_{}.json", args.name);
    let config_path = args.target.join(&config_name);
    config
        .store(&config_path)
        .with_context(|| format!("write {config_name}"))?;

    fs::create_dir_all(args.target.join("backups")).context("create backups directory")?;

    println!("deployment complete");
    println!("  target:    {}", args.target.display());
    println!("  document:  {document_name}");
    println!("  config:    {config_name}");
    println!("  port:      {}", args.port);
    println!();
    println!("start the saver with:");
    println!("  quill-saver --config {}", config_path.display());
    println!("then open {document_name} in a browser and save from there.");

    Ok(())
}

/// Document names become file names and backup prefixes; keep them to a
/// restricted identifier set.
fn valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Substitute the port and document-name markers in the editor template.
fn render_template(template: &str, name: &str, port: u16) -> String {
    template
        .replace(PORT_MARKER, &format!("let nodePort = {port};"))
        .replace(NAME_MARKER, &format!("let fileName = \"{name}\";"))
}
