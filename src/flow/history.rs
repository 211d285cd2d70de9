//! Undo/redo over graph values
//!
//! Each successful edit pushes the previous graph onto the undo stack. Graphs share
//! structure, so holding many of them costs little.

use crate::error::EditError;
use crate::flow::editor::{GraphEdit, GraphEditor};
use crate::flow::graph::FlowGraph;

#[derive(Debug, Clone, Default)]
pub struct EditHistory {
    current: FlowGraph,
    undo: Vec<FlowGraph>,
    redo: Vec<FlowGraph>,
}

impl EditHistory {
    /// Start a history at `graph` with nothing to undo.
    pub fn new(graph: FlowGraph) -> Self {
        Self {
            current: graph,
            undo: Vec::new(),
            redo: Vec::new(),
        }
    }

    pub fn current(&self) -> &FlowGraph {
        &self.current
    }

    pub fn into_current(self) -> FlowGraph {
        self.current
    }

    /// Apply an edit to the current graph.
    ///
    /// A rejected edit leaves the history exactly as it was. An accepted one
    /// discards anything that could have been redone.
    pub fn apply(&mut self, editor: &GraphEditor<'_>, edit: &GraphEdit) -> Result<&FlowGraph, EditError> {
        let next = editor.apply(&self.current, edit)?;
        self.undo.push(std::mem::replace(&mut self.current, next));
        self.redo.clear();
        Ok(&self.current)
    }

    /// Step back one edit. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.undo.pop() {
            Some(previous) => {
                self.redo.push(std::mem::replace(&mut self.current, previous));
                true
            }
            None => false,
        }
    }

    /// Re-apply the last undone edit. Returns false when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        match self.redo.pop() {
            Some(next) => {
                self.undo.push(std::mem::replace(&mut self.current, next));
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }
}
