//! Tree DragDrop Utilities
//!
//! Pointer-driven drag-and-drop state for hierarchical lists.
//! Uses a movement threshold to distinguish click from drag, and resolves
//! the hovered row into a before / after / inside drop position.
//!
//! The state machine is framework agnostic: the view layer forwards pointer
//! coordinates and row geometry, and receives a [`DropIntent`] on release.

use serde::{Deserialize, Serialize};

/// Movement threshold in pixels to start dragging
pub const DRAG_THRESHOLD_PX: i32 = 5;

/// Where the dragged item lands relative to the target row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropPosition {
    /// Sibling placed immediately before the target
    Before,
    /// Sibling placed immediately after the target
    After,
    /// Last child of the target (containers only)
    Inside,
}

impl DropPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropPosition::Before => "before",
            DropPosition::After => "after",
            DropPosition::Inside => "inside",
        }
    }
}

/// Current hover target
#[derive(Debug, Clone, PartialEq)]
pub struct DropTarget<Id> {
    pub target_id: Id,
    pub position: DropPosition,
}

/// Completed drop, handed to the reorder engine
#[derive(Debug, Clone, PartialEq)]
pub struct DropIntent<Id> {
    pub dragged_id: Id,
    pub target_id: Id,
    pub position: DropPosition,
}

/// Resolve a vertical offset inside a row into a drop position.
///
/// Top quarter is `Before`, bottom quarter is `After`. The middle band is
/// `Inside` for rows that accept children, otherwise the nearer half wins.
pub fn resolve_position(offset_y: f64, row_height: f64, accepts_children: bool) -> DropPosition {
    if row_height <= 0.0 {
        return DropPosition::After;
    }
    let ratio = (offset_y / row_height).clamp(0.0, 1.0);

    if ratio < 0.25 {
        DropPosition::Before
    } else if ratio > 0.75 {
        DropPosition::After
    } else if accepts_children {
        DropPosition::Inside
    } else if ratio < 0.5 {
        DropPosition::Before
    } else {
        DropPosition::After
    }
}

/// DnD gesture state
#[derive(Debug, Clone)]
pub struct DragState<Id> {
    /// Pending item id (pressed but not yet dragging)
    pending: Option<Id>,
    /// Item being dragged once the threshold is crossed
    dragging: Option<Id>,
    drop_target: Option<DropTarget<Id>>,
    /// Start position for movement detection
    start: (i32, i32),
}

impl<Id> Default for DragState<Id> {
    fn default() -> Self {
        Self {
            pending: None,
            dragging: None,
            drop_target: None,
            start: (0, 0),
        }
    }
}

impl<Id: Clone + PartialEq> DragState<Id> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Primary button pressed on a draggable row
    pub fn press(&mut self, id: Id, x: i32, y: i32) {
        self.pending = Some(id);
        self.dragging = None;
        self.drop_target = None;
        self.start = (x, y);
    }

    /// Pointer moved anywhere; starts the drag once it passes the threshold.
    /// Returns true while a drag is in progress.
    pub fn motion(&mut self, x: i32, y: i32) -> bool {
        if self.dragging.is_none() {
            if let Some(pending) = &self.pending {
                let dx = (x - self.start.0).abs();
                let dy = (y - self.start.1).abs();
                if dx > DRAG_THRESHOLD_PX || dy > DRAG_THRESHOLD_PX {
                    self.dragging = Some(pending.clone());
                }
            }
        }
        self.dragging.is_some()
    }

    /// Pointer over a row while dragging. Hovering the dragged row itself clears the target.
    pub fn hover(&mut self, id: Id, offset_y: f64, row_height: f64, accepts_children: bool) {
        let Some(dragging) = &self.dragging else {
            return;
        };
        if *dragging == id {
            self.drop_target = None;
            return;
        }
        self.drop_target = Some(DropTarget {
            target_id: id,
            position: resolve_position(offset_y, row_height, accepts_children),
        });
    }

    /// Pointer left the current row
    pub fn leave(&mut self) {
        if self.dragging.is_some() {
            self.drop_target = None;
        }
    }

    /// Button released. Yields an intent only for a real drag over a target;
    /// a press without movement is a click and yields nothing.
    pub fn release(&mut self) -> Option<DropIntent<Id>> {
        let dragging = self.dragging.take();
        let target = self.drop_target.take();
        self.pending = None;

        match (dragging, target) {
            (Some(dragged_id), Some(target)) => Some(DropIntent {
                dragged_id,
                target_id: target.target_id,
                position: target.position,
            }),
            _ => None,
        }
    }

    /// Abort the gesture (e.g. Escape)
    pub fn cancel(&mut self) {
        *self = Self::default();
    }

    pub fn dragging(&self) -> Option<&Id> {
        self.dragging.as_ref()
    }

    pub fn drop_target(&self) -> Option<&DropTarget<Id>> {
        self.drop_target.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging.is_some()
    }
}
