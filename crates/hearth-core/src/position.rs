//! Fractional position allocation for drag-reorder.
//!
//! Tasks are displayed by `position` descending. Moving one task only
//! rewrites that task's position: the new key is derived from the positions
//! of its neighbours after the move. Repeated inserts at the same boundary
//! slowly lose precision; positions are never rebalanced.

/// Gap used when a task moves past either end of the list.
pub const INCREMENT: f64 = 1024.0;

/// Returned when the list has a single element and there is nothing to order against.
pub const DEGENERATE_POSITION: f64 = INCREMENT;

/// Where the moved task lands in the post-move list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// The list holds only the moved task.
    Only,
    First,
    Last,
    Interior,
}

impl Slot {
    /// Classify a destination index within a list of `len` elements.
    pub fn of(index: usize, len: usize) -> Self {
        if len <= 1 {
            Slot::Only
        } else if index == 0 {
            Slot::First
        } else if index + 1 >= len {
            Slot::Last
        } else {
            Slot::Interior
        }
    }
}

/// Neighbour positions of the moved task.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Neighbors {
    /// Position of the element just before the destination, after the move.
    pub previous: Option<f64>,
    /// Position of the element just after the destination, after the move.
    pub next: Option<f64>,
    /// Position of the element that sat at the destination index before the move.
    pub displaced: Option<f64>,
}

/// Compute a new position for a moved task.
///
/// * first slot: with no previous neighbour, a previous bound is synthesized
///   as `next + INCREMENT`, the displaced element becomes the next bound, and
///   the synthesized bound is the result
/// * last slot: the last remaining item's position minus `INCREMENT`
/// * interior: midpoint of both neighbours
///
/// If the result lands exactly on the next bound it is decremented by one.
pub fn allocate(neighbors: Neighbors, slot: Slot) -> f64 {
    let Neighbors {
        mut previous,
        mut next,
        displaced,
    } = neighbors;

    if slot == Slot::First && previous.is_none() {
        if let Some(following) = next {
            previous = Some(following + INCREMENT);
            next = displaced;
        }
    }

    let candidate = match (slot, previous, next) {
        (Slot::Only, _, _) | (_, None, None) => return DEGENERATE_POSITION,
        (Slot::First, Some(prev), _) => prev,
        (Slot::First, None, Some(following)) => following + INCREMENT,
        (Slot::Last, _, Some(last)) | (Slot::Last, Some(last), None) => last - INCREMENT,
        (Slot::Interior, Some(prev), Some(following)) => (prev + following) / 2.0,
        (Slot::Interior, Some(prev), None) => prev - INCREMENT,
        (Slot::Interior, None, Some(following)) => following + INCREMENT,
    };

    match next {
        Some(following) if candidate == following => candidate - 1.0,
        _ => candidate,
    }
}
