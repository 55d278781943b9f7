use scenekit_model::{Document, ObjectId, ParentSlot, PropertyId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{grid_extent, GridAxis, GridBounds, GridSnapshot, InsertLinesJob, CHILDREN};
use crate::job::{Job, JobState};
use crate::jobs::{
    AddPropertyJob, AddPropertyValueJob, JobRecorder, ModifyObjectJob, RemoveObjectJob,
    UpdateSelectionJob,
};

/// Part of the hovered cell the pointer is over, per axis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DropArea {
    /// Open a new line before the cell
    Before,
    #[default]
    Center,
    /// Open a new line after the cell
    After,
}

impl DropArea {
    /// Line to insert, if any, and the line the drop lands on
    fn resolve(self, line: usize) -> (Option<usize>, usize) {
        match self {
            DropArea::Before => (Some(line), line),
            DropArea::Center => (None, line),
            DropArea::After => (Some(line + 1), line + 1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridDropTarget {
    pub grid: ObjectId,
    pub column: usize,
    pub row: usize,
    pub column_area: DropArea,
    pub row_area: DropArea,
}

impl GridDropTarget {
    /// Centre of the cell at `column`, `row`
    pub fn cell(grid: ObjectId, column: usize, row: usize) -> Self {
        Self {
            grid,
            column,
            row,
            column_area: DropArea::Center,
            row_area: DropArea::Center,
        }
    }

    pub fn with_areas(mut self, column_area: DropArea, row_area: DropArea) -> Self {
        self.column_area = column_area;
        self.row_area = row_area;
        self
    }

    /// Column and row the drop lands on once the areas are applied, or
    /// `None` when they do not fit a grid index
    pub fn landing(&self) -> Option<(i32, i32)> {
        let line = |index: usize, area: DropArea| {
            let index = i32::try_from(index).ok()?;
            match area {
                DropArea::After => index.checked_add(1),
                DropArea::Before | DropArea::Center => Some(index),
            }
        };
        Some((line(self.column, self.column_area)?, line(self.row, self.row_area)?))
    }
}

/// Drop dragged objects onto a grid cell.
///
/// The dragged objects keep their relative layout: the first one lands on
/// the target cell and the others follow by the same delta. Lines are
/// inserted wherever the moved block would leave the grid, each insertion
/// being a sub-job of its own.
#[derive(Debug)]
pub struct GridDropJob {
    sources: Vec<ObjectId>,
    target: GridDropTarget,
    recorded: JobRecorder,
    state: JobState,
}

impl GridDropJob {
    pub fn new(sources: Vec<ObjectId>, target: GridDropTarget) -> Self {
        Self {
            sources,
            target,
            recorded: JobRecorder::default(),
            state: JobState::default(),
        }
    }

    fn children_property(doc: &Document, grid: ObjectId) -> Option<PropertyId> {
        doc.property_named(grid, CHILDREN)
    }

    fn is_noop(&self, doc: &Document) -> bool {
        let target = &self.target;
        if target.column_area != DropArea::Center || target.row_area != DropArea::Center {
            return false;
        }
        let in_place = self
            .sources
            .iter()
            .all(|source| doc.parent_object(*source) == Some(target.grid));
        let anchor = GridSnapshot::capture(doc, &self.sources[..1]).anchor();
        in_place && anchor.is_some() && anchor == target.landing()
    }

    /// Whether every moved object, head spill included, keeps an index
    /// below `i32::MAX`
    fn fits(&self, doc: &Document) -> bool {
        let Some((column, row)) = self.target.landing() else {
            return false;
        };
        let snapshot = GridSnapshot::capture(doc, &self.sources);
        let (Some((anchor_column, anchor_row)), Some(bounds)) = (snapshot.anchor(), snapshot.bounds()) else {
            return false;
        };
        let axis_fits = |min: i32, max: i32, from: i32, to: i32| {
            let delta = i64::from(to) - i64::from(from);
            let head = (-(i64::from(min) + delta)).max(0);
            i64::from(max) + delta + head < i64::from(i32::MAX)
        };
        axis_fits(bounds.min_column, bounds.max_column, anchor_column, column)
            && axis_fits(bounds.min_row, bounds.max_row, anchor_row, row)
    }

    /// Insert lines at either end of the grid so `moved` fits. Returns the
    /// number of lines inserted at the head.
    fn spill(&self, doc: &mut Document, jobs: &mut JobRecorder, axis: GridAxis, moved: GridBounds) -> i32 {
        let grid = self.target.grid;
        let head = (-moved.min(axis)).max(0);
        if head > 0 {
            jobs.run(doc, InsertLinesJob::new(grid, axis, 0, head as usize));
        }

        let extent = grid_extent(doc, grid, axis) as i32;
        let last = moved.max(axis) + head;
        if last >= extent {
            jobs.run(doc, InsertLinesJob::new(grid, axis, extent as usize, (last + 1 - extent) as usize));
        }
        head
    }

    fn plan(&self, doc: &mut Document, jobs: &mut JobRecorder) {
        let grid = self.target.grid;
        let snapshot = GridSnapshot::capture(doc, &self.sources);
        let (Some((anchor_column, anchor_row)), Some(bounds)) = (snapshot.anchor(), snapshot.bounds()) else {
            return;
        };

        let Some((column, row)) = self.target.landing() else {
            return;
        };
        let (column_insert, _) = self.target.column_area.resolve(self.target.column);
        let (row_insert, _) = self.target.row_area.resolve(self.target.row);
        if let Some(index) = column_insert {
            jobs.run(doc, InsertLinesJob::columns(grid, index, 1));
        }
        if let Some(index) = row_insert {
            jobs.run(doc, InsertLinesJob::rows(grid, index, 1));
        }

        let delta_columns = column - anchor_column;
        let delta_rows = row - anchor_row;
        let moved = bounds.translate(delta_columns, delta_rows);
        let head_columns = self.spill(doc, jobs, GridAxis::Column, moved);
        let head_rows = self.spill(doc, jobs, GridAxis::Row, moved);

        let children = match Self::children_property(doc, grid) {
            Some(property) => property,
            None => {
                let property = doc.new_collection_property(CHILDREN);
                jobs.run(doc, AddPropertyJob::new(property, grid, None));
                property
            }
        };
        for item in &snapshot.items {
            if doc.object(item.object).parent() != Some(ParentSlot::Property(children)) {
                jobs.all_or_nothing(doc, |doc, jobs| {
                    jobs.run(doc, RemoveObjectJob::new(item.object))
                        && jobs.run(doc, AddPropertyValueJob::new(item.object, children, None))
                });
            }
        }

        // absolute positions: insertions above may have shifted sources
        // that were already in this grid
        for item in &snapshot.items {
            let column = item.column + delta_columns + head_columns;
            let row = item.row + delta_rows + head_rows;
            jobs.run(doc, ModifyObjectJob::set(item.object, GridAxis::Column.index_property(), column.to_string()));
            jobs.run(doc, ModifyObjectJob::set(item.object, GridAxis::Row.index_property(), row.to_string()));
        }

        jobs.run(doc, UpdateSelectionJob::new(self.sources.clone()));
        debug!(
            grid = %grid,
            objects = self.sources.len(),
            delta_columns,
            delta_rows,
            "grid drop planned"
        );
    }
}

impl Job for GridDropJob {
    fn is_executable(&self, doc: &Document) -> bool {
        let grid = self.target.grid;
        if self.sources.is_empty() || !doc.object(grid).is_instance() || !doc.is_attached(grid) {
            return false;
        }
        if let Some(children) = Self::children_property(doc, grid) {
            if !doc.property(children).is_collection() {
                return false;
            }
        }
        let movable = self.sources.iter().all(|&source| {
            doc.root() != Some(source) && doc.is_attached(source) && !doc.is_within(grid, source)
        });
        movable && self.fits(doc) && !self.is_noop(doc)
    }

    fn execute(&mut self, doc: &mut Document) {
        self.state.executed();
        let recorded = JobRecorder::record(doc, |doc, jobs| self.plan(doc, jobs));
        self.recorded = recorded;
    }

    fn undo(&mut self, doc: &mut Document) {
        self.state.undone();
        self.recorded.undo(doc);
    }

    fn redo(&mut self, doc: &mut Document) {
        self.state.redone();
        self.recorded.redo(doc);
    }

    fn description(&self) -> String {
        let noun = if self.sources.len() == 1 { "object" } else { "objects" };
        format!(
            "Move {} {} to column {}, row {}",
            self.sources.len(),
            noun,
            self.target.column,
            self.target.row
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{
        constraint_count, grid_children, read_index, COLUMN_CONSTRAINTS, COLUMN_INDEX, ROW_CONSTRAINTS,
        ROW_INDEX,
    };
    use scenekit_model::{DocumentSpec, NodeSpec};

    fn cell(class: &str, column: usize, row: usize) -> NodeSpec {
        NodeSpec::instance(class)
            .with_value(COLUMN_INDEX, column.to_string())
            .with_value(ROW_INDEX, row.to_string())
    }

    fn grid_spec(columns: usize, rows: usize, children: Vec<NodeSpec>) -> NodeSpec {
        NodeSpec::instance("GridPane")
            .with_values(
                COLUMN_CONSTRAINTS,
                (0..columns).map(|_| NodeSpec::instance("ColumnConstraints")).collect(),
            )
            .with_values(
                ROW_CONSTRAINTS,
                (0..rows).map(|_| NodeSpec::instance("RowConstraints")).collect(),
            )
            .with_values(CHILDREN, children)
    }

    fn load(root: NodeSpec) -> Document {
        Document::from_spec(&DocumentSpec { root: Some(root) }).unwrap()
    }

    fn position(doc: &Document, object: ObjectId) -> (i32, i32) {
        (
            read_index(doc, object, COLUMN_INDEX, 0),
            read_index(doc, object, ROW_INDEX, 0),
        )
    }

    #[test]
    fn test_drop_past_the_end_adds_columns() {
        let mut doc = load(grid_spec(
            3,
            2,
            vec![cell("Label", 0, 0), cell("Button", 1, 0), cell("Label", 2, 1)],
        ));
        let grid = doc.root().unwrap();
        let label = grid_children(&doc, grid)[0];
        let before = doc.snapshot();

        let mut job = GridDropJob::new(vec![label], GridDropTarget::cell(grid, 5, 0));
        assert!(job.is_executable(&doc));
        job.execute(&mut doc);

        assert_eq!(position(&doc, label), (5, 0));
        assert!(grid_extent(&doc, grid, GridAxis::Column) >= 6);
        assert_eq!(constraint_count(&doc, grid, GridAxis::Column), 6);
        assert_eq!(constraint_count(&doc, grid, GridAxis::Row), 2);
        assert_eq!(doc.selection(), &[label]);

        job.undo(&mut doc);
        assert_eq!(doc.snapshot(), before);
        job.redo(&mut doc);
        assert_eq!(position(&doc, label), (5, 0));
    }

    #[test]
    fn test_drop_before_opens_a_column() {
        let mut doc = load(grid_spec(
            2,
            1,
            vec![cell("Label", 0, 0), cell("Button", 1, 0)],
        ));
        let grid = doc.root().unwrap();
        let children = grid_children(&doc, grid);
        let (label, button) = (children[0], children[1]);

        let target = GridDropTarget::cell(grid, 0, 0).with_areas(DropArea::Before, DropArea::Center);
        let mut job = GridDropJob::new(vec![button], target);
        assert!(job.is_executable(&doc));
        job.execute(&mut doc);

        assert_eq!(position(&doc, button), (0, 0));
        assert_eq!(position(&doc, label), (1, 0));
        assert_eq!(constraint_count(&doc, grid, GridAxis::Column), 3);
    }

    #[test]
    fn test_drop_before_the_head_spills() {
        let mut doc = load(grid_spec(
            3,
            1,
            vec![cell("A", 0, 0), cell("B", 1, 0), cell("C", 2, 0)],
        ));
        let grid = doc.root().unwrap();
        let children = grid_children(&doc, grid);
        let (a, b, c) = (children[0], children[1], children[2]);

        // anchor is `b`; `a` would end up at column -1
        let mut job = GridDropJob::new(vec![b, a], GridDropTarget::cell(grid, 0, 0));
        job.execute(&mut doc);

        assert_eq!(position(&doc, a), (0, 0));
        assert_eq!(position(&doc, b), (1, 0));
        assert_eq!(position(&doc, c), (3, 0));
        assert_eq!(constraint_count(&doc, grid, GridAxis::Column), 4);
    }

    #[test]
    fn test_drop_into_another_grid_reparents() {
        let mut doc = load(NodeSpec::instance("VBox").with_values(
            "children",
            vec![
                grid_spec(1, 1, vec![cell("Label", 0, 0)]),
                grid_spec(2, 2, vec![]),
            ],
        ));
        let root = doc.root().unwrap();
        let grids = doc.children_of(root);
        let label = grid_children(&doc, grids[0])[0];
        let before = doc.snapshot();

        let mut job = GridDropJob::new(vec![label], GridDropTarget::cell(grids[1], 1, 1));
        assert!(job.is_executable(&doc));
        job.execute(&mut doc);

        assert_eq!(doc.parent_object(label), Some(grids[1]));
        assert!(grid_children(&doc, grids[0]).is_empty());
        assert_eq!(position(&doc, label), (1, 1));

        job.undo(&mut doc);
        assert_eq!(doc.snapshot(), before);
    }

    #[test]
    fn test_refused_drops() {
        let mut doc = load(grid_spec(
            2,
            1,
            vec![cell("Label", 1, 0), grid_spec(1, 1, vec![])],
        ));
        let grid = doc.root().unwrap();
        let children = grid_children(&doc, grid);
        let (label, inner) = (children[0], children[1]);

        // same cell, same grid
        assert!(!GridDropJob::new(vec![label], GridDropTarget::cell(grid, 1, 0)).is_executable(&doc));
        // a grid cannot go inside itself
        assert!(!GridDropJob::new(vec![inner], GridDropTarget::cell(inner, 0, 0)).is_executable(&doc));
        assert!(!GridDropJob::new(vec![grid], GridDropTarget::cell(inner, 0, 0)).is_executable(&doc));
        assert!(!GridDropJob::new(vec![], GridDropTarget::cell(grid, 0, 0)).is_executable(&doc));

        let detached = doc.new_instance("Label");
        assert!(!GridDropJob::new(vec![detached], GridDropTarget::cell(grid, 0, 0)).is_executable(&doc));

        // the same cell with a new line is a real move
        let target = GridDropTarget::cell(grid, 1, 0).with_areas(DropArea::After, DropArea::Center);
        assert!(GridDropJob::new(vec![label], target).is_executable(&doc));
    }

    #[test]
    fn test_targets_beyond_grid_indices_are_refused() {
        let doc = load(grid_spec(2, 1, vec![cell("Label", 0, 0), cell("Button", 1, 0)]));
        let grid = doc.root().unwrap();
        let children = grid_children(&doc, grid);
        let (label, button) = (children[0], children[1]);
        let max = i32::MAX as usize;

        for column in [max + 1, usize::MAX, max] {
            let target = GridDropTarget::cell(grid, column, 0);
            assert_eq!(target.landing().is_some(), column == max);
            assert!(!GridDropJob::new(vec![label], target).is_executable(&doc), "{column}");
        }
        let after = GridDropTarget::cell(grid, max, 0).with_areas(DropArea::After, DropArea::Center);
        assert_eq!(after.landing(), None);

        // `button` trails the anchor by one column
        let target = GridDropTarget::cell(grid, max - 1, 0);
        assert!(!GridDropJob::new(vec![label, button], target).is_executable(&doc));
        let target = GridDropTarget::cell(grid, max - 2, 0);
        assert!(GridDropJob::new(vec![label, button], target).is_executable(&doc));
    }
}
