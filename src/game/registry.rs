use super::grid::Bounds;
use super::snake::Snake;
use ratatui::layout::Position;
use std::collections::HashSet;

/// Everything that sits on the grid during one session
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Registry {
    pub(super) bounds: Bounds,
    pub(super) snake: Snake,
    pub(super) apples: HashSet<Position>,
    /// Only ever grows within a session
    pub(super) obstacles: HashSet<Position>,
}

impl Registry {
    pub(crate) fn new(bounds: Bounds, snake: Snake) -> Registry {
        Registry {
            bounds,
            snake,
            apples: HashSet::new(),
            obstacles: HashSet::new(),
        }
    }

    pub(crate) fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub(crate) fn snake(&self) -> &Snake {
        &self.snake
    }

    pub(crate) fn apples(&self) -> &HashSet<Position> {
        &self.apples
    }

    pub(crate) fn obstacles(&self) -> &HashSet<Position> {
        &self.obstacles
    }

    /// Is `pos` covered by a snake segment, an obstacle, or an apple?
    pub(crate) fn is_occupied(&self, pos: Position) -> bool {
        self.snake.occupies(pos) || self.obstacles.contains(&pos) || self.apples.contains(&pos)
    }

    pub(crate) fn free_cells(&self) -> impl Iterator<Item = Position> + '_ {
        self.bounds.positions().filter(|&p| !self.is_occupied(p))
    }
}
