pub mod check;
pub mod drop;
pub mod repair;

pub use check::{check, CheckArgs};
pub use drop::{drop, DropArgs};
pub use repair::{repair, RepairArgs};

use anyhow::{Context, Result};
use colored::Colorize;
use scenekit_editor::{AliasOutcome, EditSession, RepairEntry};
use std::fs;
use std::path::Path;

/// Open a document, with the config found next to it
fn open(path: &Path) -> Result<EditSession> {
    EditSession::open(path).with_context(|| format!("Failed to load {}", path.display()))
}

fn save(session: &EditSession, path: &Path) -> Result<()> {
    let json = session.to_json()?;
    fs::write(path, json + "\n").with_context(|| format!("Failed to write {}", path.display()))
}

/// One report line, e.g. `✓ name (Expression, labelFor) resolved`
fn print_entry(entry: &RepairEntry) {
    let property = entry.property.as_deref().unwrap_or("-");
    let target = format!("{} ({:?}, {})", entry.source, entry.kind, property);
    match entry.outcome {
        None => println!("   {} {} resolved", "✓".green(), target),
        Some(AliasOutcome::Reported) => println!("   {} {} {:?}", "✗".red(), target, entry.state),
        Some(outcome) => println!("   {} {} {:?} → {:?}", "!".yellow(), target, entry.state, outcome),
    }
}
