//! Drag-reorder gestures.
//!
//! ```text
//! Idle ──begin──► Dragging ──drop──► DroppedValid | DroppedNoOp
//! ```
//!
//! A valid drop reorders the visible list immediately, allocates a new
//! position from the post-move neighbours and hands back the
//! [`Reposition`] to persist. The local order is never rolled back.

use hearth_core::{allocate, Neighbors, Slot, TaskId, TaskPatch};
use tracing::debug;

use crate::state::LocalListState;

/// The single droppable list of the task board.
pub const DEFAULT_CONTAINER: &str = "tasks";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragLocation {
    pub container: String,
    pub index: usize,
}

impl DragLocation {
    pub fn new(container: impl Into<String>, index: usize) -> Self {
        Self {
            container: container.into(),
            index,
        }
    }

    /// A location in [`DEFAULT_CONTAINER`].
    pub fn at(index: usize) -> Self {
        Self::new(DEFAULT_CONTAINER, index)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragPhase {
    Idle,
    Dragging { task_id: TaskId, source: DragLocation },
    DroppedValid,
    DroppedNoOp,
}

/// Position update to send to the server.
#[derive(Debug, Clone, PartialEq)]
pub struct Reposition {
    pub id: TaskId,
    pub position: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    /// Nothing changed locally and nothing should be persisted.
    NoOp,
    /// The task now sits at `index`. `reposition` is `None` when the
    /// allocated position equals the current one.
    Moved {
        index: usize,
        reposition: Option<Reposition>,
    },
}

#[derive(Debug, Clone)]
pub struct DragController {
    phase: DragPhase,
}

impl Default for DragController {
    fn default() -> Self {
        Self::new()
    }
}

impl DragController {
    pub fn new() -> Self {
        Self {
            phase: DragPhase::Idle,
        }
    }

    pub fn phase(&self) -> &DragPhase {
        &self.phase
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, DragPhase::Dragging { .. })
    }

    /// Start dragging a task. Only one gesture can be active at a time.
    pub fn begin(&mut self, task_id: TaskId, source: DragLocation) -> bool {
        if self.is_dragging() {
            debug!(task = %task_id, "Drag already in progress");
            return false;
        }
        self.phase = DragPhase::Dragging { task_id, source };
        true
    }

    pub fn cancel(&mut self) {
        self.phase = DragPhase::Idle;
    }

    /// Finish the gesture against the visible list of `state`.
    pub fn drop(
        &mut self,
        state: &mut LocalListState,
        destination: Option<DragLocation>,
    ) -> DropOutcome {
        let DragPhase::Dragging { task_id, source } =
            std::mem::replace(&mut self.phase, DragPhase::Idle)
        else {
            return DropOutcome::NoOp;
        };

        let outcome = match destination {
            Some(destination) => relocate(state, &task_id, &source, &destination),
            None => DropOutcome::NoOp,
        };
        self.phase = match outcome {
            DropOutcome::NoOp => DragPhase::DroppedNoOp,
            DropOutcome::Moved { .. } => DragPhase::DroppedValid,
        };
        outcome
    }
}

fn relocate(
    state: &mut LocalListState,
    task_id: &TaskId,
    source: &DragLocation,
    destination: &DragLocation,
) -> DropOutcome {
    if destination == source {
        return DropOutcome::NoOp;
    }
    if destination.container != source.container {
        debug!(
            from = %source.container,
            to = %destination.container,
            "Cross-container drop ignored"
        );
        return DropOutcome::NoOp;
    }

    // The list may have shifted under the gesture; trust the id over the index.
    let from = match state.visible().get(source.index) {
        Some(task) if &task.id == task_id => source.index,
        _ => match state.index_of(task_id) {
            Some(index) => index,
            None => return DropOutcome::NoOp,
        },
    };
    if from == destination.index {
        return DropOutcome::NoOp;
    }

    let current = state.visible()[from].position;
    let displaced = state
        .visible()
        .get(destination.index)
        .map(|task| task.position);

    let Some(index) = state.move_visible(from, destination.index) else {
        return DropOutcome::NoOp;
    };

    let visible = state.visible();
    let neighbors = Neighbors {
        previous: index
            .checked_sub(1)
            .and_then(|i| visible.get(i))
            .map(|task| task.position),
        next: visible.get(index + 1).map(|task| task.position),
        displaced,
    };
    let position = allocate(neighbors, Slot::of(index, visible.len()));

    if position == current {
        debug!(task = %task_id, position, "Position unchanged, skipping persist");
        return DropOutcome::Moved {
            index,
            reposition: None,
        };
    }

    state.apply_patch(task_id, &TaskPatch::position(position));
    DropOutcome::Moved {
        index,
        reposition: Some(Reposition {
            id: task_id.clone(),
            position,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tests::{ids, page, task};

    fn board() -> LocalListState {
        let mut state = LocalListState::new(5);
        state.apply_fetched_pages(vec![page(
            vec![task("a", "A", 30.0), task("b", "B", 20.0), task("c", "C", 10.0)],
            None,
        )]);
        state
    }

    fn drag(state: &mut LocalListState, from: usize, to: Option<usize>) -> DropOutcome {
        let mut controller = DragController::new();
        let id = state.visible()[from].id.clone();
        assert!(controller.begin(id, DragLocation::at(from)));
        controller.drop(state, to.map(DragLocation::at))
    }

    fn position_of(state: &LocalListState, id: &str) -> f64 {
        state
            .visible()
            .iter()
            .find(|t| t.id.as_str() == id)
            .map(|t| t.position)
            .unwrap()
    }

    #[test]
    fn test_drop_to_front() {
        let mut state = board();
        let outcome = drag(&mut state, 2, Some(0));

        assert_eq!(ids(state.visible()), vec!["c", "a", "b"]);
        match outcome {
            DropOutcome::Moved {
                index,
                reposition: Some(reposition),
            } => {
                assert_eq!(index, 0);
                assert_eq!(reposition.id.as_str(), "c");
                assert_eq!(reposition.position, 1054.0);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(position_of(&state, "c"), 1054.0);
    }

    #[test]
    fn test_drop_to_back_and_middle() {
        let mut state = board();
        drag(&mut state, 0, Some(2));
        assert_eq!(ids(state.visible()), vec!["b", "c", "a"]);
        assert_eq!(position_of(&state, "a"), -1014.0);

        let mut state = board();
        drag(&mut state, 2, Some(1));
        assert_eq!(ids(state.visible()), vec!["a", "c", "b"]);
        assert_eq!(position_of(&state, "c"), 25.0);
    }

    #[test]
    fn test_drop_in_place_is_noop() {
        let mut state = board();
        let before = state.visible().to_vec();
        let mut controller = DragController::new();
        controller.begin(state.visible()[1].id.clone(), DragLocation::at(1));

        assert_eq!(
            controller.drop(&mut state, Some(DragLocation::at(1))),
            DropOutcome::NoOp
        );
        assert_eq!(controller.phase(), &DragPhase::DroppedNoOp);
        assert_eq!(state.visible(), before.as_slice());
    }

    #[test]
    fn test_drop_outside_is_noop() {
        let mut state = board();
        assert_eq!(drag(&mut state, 0, None), DropOutcome::NoOp);
        assert_eq!(ids(state.visible()), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_unchanged_position_is_not_persisted() {
        // b already sits exactly one increment above a, so moving it to the
        // front allocates the position it has.
        let mut state = LocalListState::new(5);
        state.apply_fetched_pages(vec![page(
            vec![task("a", "A", 2048.0), task("b", "B", 3072.0), task("c", "C", 0.0)],
            None,
        )]);

        let outcome = drag(&mut state, 1, Some(0));
        assert_eq!(
            outcome,
            DropOutcome::Moved {
                index: 0,
                reposition: None
            }
        );
        assert_eq!(ids(state.visible()), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_second_gesture_is_rejected_while_dragging() {
        let mut controller = DragController::new();
        assert!(controller.begin(TaskId::parse("a").unwrap(), DragLocation::at(0)));
        assert!(!controller.begin(TaskId::parse("b").unwrap(), DragLocation::at(1)));

        controller.cancel();
        assert_eq!(controller.phase(), &DragPhase::Idle);
    }
}
