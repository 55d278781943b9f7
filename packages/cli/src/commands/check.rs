use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use super::{open, print_entry};

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Document to check (JSON tree form)
    pub input: PathBuf,

    /// List resolved aliases too
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn check(args: CheckArgs) -> Result<()> {
    println!("🔍 {} {}", "Checking".green().bold(), args.input.display());

    let session = open(&args.input)?;
    let report = session.audit();

    for entry in &report.entries {
        if args.verbose || !entry.state.is_resolved() {
            print_entry(entry);
        }
    }

    let unresolved = report.unresolved().count();
    println!();
    if unresolved > 0 {
        bail!(
            "{} of {} aliases do not resolve (run `scenekit repair`)",
            unresolved,
            report.entries.len()
        );
    }
    println!("   {} {} aliases, all resolved", "✓".green(), report.entries.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_check_fails_on_forward_reference() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("scene.json");
        fs::write(
            &input,
            r#"{ "root": { "type": "instance", "class": "VBox", "properties": [
                { "name": "children", "values": [
                    { "type": "reference", "source": "ok" },
                    { "type": "instance", "class": "Button", "fxId": "ok" }
                ] }
            ] } }"#,
        )
        .unwrap();

        let err = check(CheckArgs { input, verbose: true }).unwrap_err();
        assert!(err.to_string().contains("1 of 1 aliases"));
    }

    #[test]
    fn test_check_passes_clean_document() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("scene.json");
        fs::write(&input, r#"{ "root": { "type": "instance", "class": "VBox" } }"#).unwrap();

        assert!(check(CheckArgs { input, verbose: false }).is_ok());
    }

    #[test]
    fn test_check_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = check(CheckArgs {
            input: dir.path().join("missing.json"),
            verbose: false,
        })
        .unwrap_err();
        assert!(err.to_string().starts_with("Failed to load"));
    }
}
