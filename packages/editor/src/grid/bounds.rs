use scenekit_model::{Document, ObjectId};

use super::{read_index, GridAxis, COLUMN_INDEX, COLUMN_SPAN, ROW_INDEX, ROW_SPAN};

/// Cells covered by one or more grid children. Maxima are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridBounds {
    pub min_column: i32,
    pub max_column: i32,
    pub min_row: i32,
    pub max_row: i32,
}

impl GridBounds {
    pub fn new(column: i32, row: i32, column_span: i32, row_span: i32) -> Self {
        Self {
            min_column: column,
            max_column: column + column_span.max(1) - 1,
            min_row: row,
            max_row: row + row_span.max(1) - 1,
        }
    }

    pub fn of_object(doc: &Document, object: ObjectId) -> Self {
        Self::new(
            read_index(doc, object, COLUMN_INDEX, 0),
            read_index(doc, object, ROW_INDEX, 0),
            read_index(doc, object, COLUMN_SPAN, 1),
            read_index(doc, object, ROW_SPAN, 1),
        )
    }

    pub fn union(self, other: GridBounds) -> Self {
        Self {
            min_column: self.min_column.min(other.min_column),
            max_column: self.max_column.max(other.max_column),
            min_row: self.min_row.min(other.min_row),
            max_row: self.max_row.max(other.max_row),
        }
    }

    pub fn translate(self, columns: i32, rows: i32) -> Self {
        Self {
            min_column: self.min_column + columns,
            max_column: self.max_column + columns,
            min_row: self.min_row + rows,
            max_row: self.max_row + rows,
        }
    }

    pub fn min(&self, axis: GridAxis) -> i32 {
        match axis {
            GridAxis::Column => self.min_column,
            GridAxis::Row => self.min_row,
        }
    }

    pub fn max(&self, axis: GridAxis) -> i32 {
        match axis {
            GridAxis::Column => self.max_column,
            GridAxis::Row => self.max_row,
        }
    }

    pub fn column_span(&self) -> i32 {
        self.max_column - self.min_column + 1
    }

    pub fn row_span(&self) -> i32 {
        self.max_row - self.min_row + 1
    }
}

/// Position of one dragged object, read before anything moved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridItem {
    pub object: ObjectId,
    pub column: i32,
    pub row: i32,
    pub bounds: GridBounds,
    /// Object the item was laid out by
    pub container: Option<ObjectId>,
}

/// Layout of a dragged selection.
///
/// Has to be captured before any detach: once an object leaves its grid its
/// attached properties no longer describe a position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridSnapshot {
    pub items: Vec<GridItem>,
}

impl GridSnapshot {
    pub fn capture(doc: &Document, objects: &[ObjectId]) -> Self {
        let items = objects
            .iter()
            .map(|&object| {
                let bounds = GridBounds::of_object(doc, object);
                GridItem {
                    object,
                    column: bounds.min_column,
                    row: bounds.min_row,
                    bounds,
                    container: doc.parent_object(object),
                }
            })
            .collect();
        Self { items }
    }

    /// Union of every item's bounds
    pub fn bounds(&self) -> Option<GridBounds> {
        self.items
            .iter()
            .map(|item| item.bounds)
            .reduce(GridBounds::union)
    }

    /// Cell of the first item; drop deltas are measured from here
    pub fn anchor(&self) -> Option<(i32, i32)> {
        self.items.first().map(|item| (item.column, item.row))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
