use anyhow::Result;
use clap::Args;
use colored::Colorize;
use scenekit_editor::AliasOutcome;
use std::path::PathBuf;

use super::{open, print_entry, save};

#[derive(Args, Debug)]
pub struct RepairArgs {
    /// Document to repair (JSON tree form)
    pub input: PathBuf,

    /// Where to write the result (defaults to the input file)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print the repair report as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

pub fn repair(args: RepairArgs) -> Result<()> {
    let mut session = open(&args.input)?;
    let report = session.repair()?;

    let output = args.output.as_ref().unwrap_or(&args.input);
    save(&session, output)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("🔧 {} {}", "Repaired".green().bold(), args.input.display());
    for entry in report.unresolved() {
        print_entry(entry);
    }
    println!();
    println!("   Aliases:    {}", report.entries.len());
    println!("   Inlined:    {}", report.count(AliasOutcome::Inlined));
    println!("   Deleted:    {}", report.count(AliasOutcome::Deleted));
    println!("   Retargeted: {}", report.count(AliasOutcome::Retargeted));

    let reported = report.count(AliasOutcome::Reported);
    if reported > 0 {
        println!("   {} {} (left in place)", "Unresolved:".red(), reported);
    }
    println!("   Output:     {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenekit_model::Document;
    use std::fs;

    const SCENE: &str = r#"{ "root": { "type": "instance", "class": "VBox", "properties": [
        { "name": "children", "values": [
            { "type": "instance", "class": "Label", "properties": [
                { "name": "labelFor", "value": "$field" }
            ] },
            { "type": "reference", "source": "field" },
            { "type": "instance", "class": "TextField", "fxId": "field" }
        ] }
    ] } }"#;

    #[test]
    fn test_repair_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("scene.json");
        let output = dir.path().join("fixed.json");
        fs::write(&input, SCENE).unwrap();

        repair(RepairArgs {
            input: input.clone(),
            output: Some(output.clone()),
            json: false,
        })
        .unwrap();

        // input untouched
        assert_eq!(fs::read_to_string(&input).unwrap(), SCENE);
        let fixed = Document::from_json(&fs::read_to_string(&output).unwrap()).unwrap();
        assert!(fixed.collect_aliases(None).is_empty());
        let root = fixed.root().unwrap();
        assert_eq!(fixed.children_of(root).len(), 3);
    }

    #[test]
    fn test_repair_in_place_with_config() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("scene.json");
        fs::write(&input, SCENE).unwrap();
        // `labelFor` is no longer weak, so its alias gets inlined instead
        fs::write(
            dir.path().join(scenekit_editor::DEFAULT_CONFIG_NAME),
            r#"{ "references": { "weakProperties": [] } }"#,
        )
        .unwrap();

        repair(RepairArgs {
            input: input.clone(),
            output: None,
            json: true,
        })
        .unwrap();

        let fixed = Document::from_json(&fs::read_to_string(&input).unwrap()).unwrap();
        let root = fixed.root().unwrap();
        let label = fixed.children_of(root)[0];
        let label_for = fixed.property_named(label, "labelFor").unwrap();
        assert!(fixed.property(label_for).is_collection());
    }
}
