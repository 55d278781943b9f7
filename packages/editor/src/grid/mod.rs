//! # Structural grid editing
//!
//! A grid is an instance with `columnConstraints`, `rowConstraints` and
//! `children` properties. Children place themselves with the attached
//! properties `GridPane.columnIndex`, `GridPane.rowIndex`,
//! `GridPane.columnSpan` and `GridPane.rowSpan`, which default to 0, 0, 1
//! and 1 when absent.

mod bounds;
mod drop;
mod insert;

use scenekit_model::{Document, ObjectId};
use serde::{Deserialize, Serialize};

pub use bounds::{GridBounds, GridItem, GridSnapshot};
pub use drop::{DropArea, GridDropJob, GridDropTarget};
pub use insert::InsertLinesJob;

pub const CHILDREN: &str = "children";
pub const COLUMN_CONSTRAINTS: &str = "columnConstraints";
pub const ROW_CONSTRAINTS: &str = "rowConstraints";
pub const COLUMN_INDEX: &str = "GridPane.columnIndex";
pub const ROW_INDEX: &str = "GridPane.rowIndex";
pub const COLUMN_SPAN: &str = "GridPane.columnSpan";
pub const ROW_SPAN: &str = "GridPane.rowSpan";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GridAxis {
    Column,
    Row,
}

impl GridAxis {
    pub fn index_property(self) -> &'static str {
        match self {
            GridAxis::Column => COLUMN_INDEX,
            GridAxis::Row => ROW_INDEX,
        }
    }

    pub fn span_property(self) -> &'static str {
        match self {
            GridAxis::Column => COLUMN_SPAN,
            GridAxis::Row => ROW_SPAN,
        }
    }

    pub fn constraints_property(self) -> &'static str {
        match self {
            GridAxis::Column => COLUMN_CONSTRAINTS,
            GridAxis::Row => ROW_CONSTRAINTS,
        }
    }

    /// Class of the entries in the constraints property
    pub fn constraint_class(self) -> &'static str {
        match self {
            GridAxis::Column => "ColumnConstraints",
            GridAxis::Row => "RowConstraints",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            GridAxis::Column => "column",
            GridAxis::Row => "row",
        }
    }
}

/// Integer value of the property `name`, or `default` when it is missing or
/// not a number
pub fn read_index(doc: &Document, object: ObjectId, name: &str, default: i32) -> i32 {
    if !doc.object(object).owns_properties() {
        return default;
    }
    doc.value_of(object, name)
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

/// Objects laid out by `grid`
pub fn grid_children(doc: &Document, grid: ObjectId) -> Vec<ObjectId> {
    doc.property_named(grid, CHILDREN)
        .map(|property| doc.property(property).values().to_vec())
        .unwrap_or_default()
}

/// Number of constraint entries of `grid` along `axis`
pub fn constraint_count(doc: &Document, grid: ObjectId, axis: GridAxis) -> usize {
    doc.property_named(grid, axis.constraints_property())
        .map(|property| doc.property(property).values().len())
        .unwrap_or(0)
}

/// Number of lines along `axis`: the larger of the constraint count and the
/// lines covered by children
pub fn grid_extent(doc: &Document, grid: ObjectId, axis: GridAxis) -> usize {
    let covered = grid_children(doc, grid)
        .into_iter()
        .map(|child| {
            let start = read_index(doc, child, axis.index_property(), 0).max(0);
            let span = read_index(doc, child, axis.span_property(), 1).max(1);
            (start + span) as usize
        })
        .max()
        .unwrap_or(0);
    covered.max(constraint_count(doc, grid, axis))
}
