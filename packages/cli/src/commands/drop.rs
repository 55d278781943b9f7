use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use scenekit_editor::grid::{DropArea, GridDropTarget};
use std::path::PathBuf;

use super::{open, save};

#[derive(Args, Debug)]
pub struct DropArgs {
    /// Document to edit (JSON tree form)
    pub input: PathBuf,

    /// fx:id of the target grid
    #[arg(long)]
    pub grid: String,

    /// fx:id of an object to move; repeat for several, the first one
    /// lands on the target cell
    #[arg(long = "source", required = true)]
    pub sources: Vec<String>,

    #[arg(long)]
    pub column: usize,

    #[arg(long)]
    pub row: usize,

    /// Open a new column before/after the target cell
    #[arg(long, value_enum, default_value_t = Area::Center)]
    pub column_area: Area,

    /// Open a new row before/after the target cell
    #[arg(long, value_enum, default_value_t = Area::Center)]
    pub row_area: Area,

    /// Where to write the result (defaults to the input file)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Area {
    Before,
    Center,
    After,
}

impl From<Area> for DropArea {
    fn from(area: Area) -> Self {
        match area {
            Area::Before => DropArea::Before,
            Area::Center => DropArea::Center,
            Area::After => DropArea::After,
        }
    }
}

pub fn drop(args: DropArgs) -> Result<()> {
    let mut session = open(&args.input)?;

    let grid = session.object_with_fx_id(&args.grid)?;
    let sources = args
        .sources
        .iter()
        .map(|fx_id| session.object_with_fx_id(fx_id))
        .collect::<Result<Vec<_>, _>>()?;
    let target = GridDropTarget::cell(grid, args.column, args.row)
        .with_areas(args.column_area.into(), args.row_area.into());

    session
        .drop_on_grid(sources, target)
        .with_context(|| format!("Cannot drop onto column {}, row {}", args.column, args.row))?;

    let output = args.output.as_ref().unwrap_or(&args.input);
    save(&session, output)?;

    println!(
        "📦 {} {} → {} [{}, {}]",
        "Moved".green().bold(),
        args.sources.join(", "),
        args.grid,
        args.column,
        args.row
    );
    println!("   Output: {}", output.display());
    Ok(())
}
