use super::direction::Direction;
use super::grid::Bounds;
use ratatui::layout::Position;

/// Snake state.  Snate.
///
/// The head is `segments[0]` and the tail is the last element.  Each step
/// every segment takes the place of the one in front of it, so the body
/// follows the head's trail; consecutive segments need not be adjacent.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Snake {
    /// Current cell of every segment, head first
    pub(super) segments: Vec<Position>,

    /// Cell of every segment before the most recent step, index-aligned with
    /// `segments`.  Used for drawing in-between frames.
    pub(super) previous: Vec<Position>,

    /// The direction in which the snake moved on its last step
    pub(super) direction: Direction,
}

impl Snake {
    /// Create a snake of `length` segments with its head at `head` facing
    /// `direction`; the rest of the body trails out behind it.
    pub(crate) fn new(head: Position, direction: Direction, length: usize, bounds: Bounds) -> Snake {
        debug_assert!(bounds.contains(head), "snake should start on the grid");
        let behind = direction.reverse();
        let segments = std::iter::successors(Some(head), |&p| Some(behind.advance(p, bounds)))
            .take(length.max(1))
            .collect::<Vec<_>>();
        Snake {
            previous: segments.clone(),
            segments,
            direction,
        }
    }

    pub(crate) fn head(&self) -> Position {
        self.segments[0]
    }

    pub(crate) fn segments(&self) -> &[Position] {
        &self.segments
    }

    pub(crate) fn previous(&self) -> &[Position] {
        &self.previous
    }

    pub(crate) fn direction(&self) -> Direction {
        self.direction
    }

    pub(crate) fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` if `pos` is covered by any segment
    pub(crate) fn occupies(&self, pos: Position) -> bool {
        self.segments.contains(&pos)
    }

    /// Move the snake one cell.  If `requested` would turn the snake back
    /// onto itself, the current direction is kept instead.
    pub(crate) fn step(&mut self, requested: Direction, bounds: Bounds) {
        if requested != self.direction.reverse() {
            self.direction = requested;
        }
        self.previous.clone_from(&self.segments);
        self.segments.rotate_right(1);
        self.segments[0] = self.direction.advance(self.previous[0], bounds);
    }

    /// Add one segment on top of the current tail.  It separates from the
    /// tail on the next step.
    pub(crate) fn grow(&mut self) {
        let tail = self.segments[self.segments.len() - 1];
        let prev_tail = self.previous[self.previous.len() - 1];
        self.segments.push(tail);
        self.previous.push(prev_tail);
    }
}
