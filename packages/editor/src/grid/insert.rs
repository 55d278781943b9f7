use scenekit_model::{Document, ObjectId};

use super::{grid_children, read_index, GridAxis};
use crate::job::{Job, JobState};
use crate::jobs::{AddPropertyValueJob, JobRecorder, ModifyObjectJob};

/// Insert `count` empty columns or rows before line `index`.
///
/// Children at or after `index` move along. When the grid declares
/// constraints for that axis, fresh constraint entries are inserted too; a
/// constraint list shorter than `index` is padded first so the new entries
/// land at the right position.
#[derive(Debug)]
pub struct InsertLinesJob {
    grid: ObjectId,
    axis: GridAxis,
    index: usize,
    count: usize,
    recorded: JobRecorder,
    state: JobState,
}

impl InsertLinesJob {
    pub fn new(grid: ObjectId, axis: GridAxis, index: usize, count: usize) -> Self {
        Self {
            grid,
            axis,
            index,
            count,
            recorded: JobRecorder::default(),
            state: JobState::default(),
        }
    }

    pub fn columns(grid: ObjectId, index: usize, count: usize) -> Self {
        Self::new(grid, GridAxis::Column, index, count)
    }

    pub fn rows(grid: ObjectId, index: usize, count: usize) -> Self {
        Self::new(grid, GridAxis::Row, index, count)
    }

    fn plan(&self, doc: &mut Document, jobs: &mut JobRecorder) {
        let axis = self.axis;
        let constraints = doc
            .property_named(self.grid, axis.constraints_property())
            .filter(|property| doc.property(*property).is_collection());
        if let Some(constraints) = constraints {
            // padding entries first, when the list stops short of `index`
            let start = doc.property(constraints).values().len().min(self.index);
            for position in start..self.index + self.count {
                let entry = doc.new_instance(axis.constraint_class());
                jobs.run(doc, AddPropertyValueJob::new(entry, constraints, Some(position)));
            }
        }

        let shift = self.count as i32;
        for child in grid_children(doc, self.grid) {
            let current = read_index(doc, child, axis.index_property(), 0);
            if current >= self.index as i32 {
                jobs.run(doc, ModifyObjectJob::set(child, axis.index_property(), (current + shift).to_string()));
            }
        }
    }
}

impl Job for InsertLinesJob {
    fn is_executable(&self, doc: &Document) -> bool {
        self.count > 0 && doc.object(self.grid).is_instance() && doc.is_attached(self.grid)
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
        let plural = if self.count == 1 { "" } else { "s" };
        format!("Insert {} {}{} at {}", self.count, self.axis.name(), plural, self.index)
    }
}
