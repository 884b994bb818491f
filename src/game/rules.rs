use super::grid::cells_intersect;
use super::registry::Registry;
use std::num::NonZeroU32;

/// What the snake's head ran into on its latest step
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Outcome {
    Continue,
    AteApple,
    SelfCollision,
    ObstacleCollision,
}

impl Outcome {
    pub(crate) fn is_collision(self) -> bool {
        matches!(self, Outcome::SelfCollision | Outcome::ObstacleCollision)
    }
}

/// Classify the snake's current head cell.  Must be called right after each
/// step, before anything else mutates the registry.
pub(crate) fn evaluate(registry: &Registry) -> Outcome {
    let head = registry.snake().head();
    if registry.snake().segments()[1..]
        .iter()
        .any(|&seg| cells_intersect(head, seg))
    {
        Outcome::SelfCollision
    } else if registry.obstacles().contains(&head) {
        Outcome::ObstacleCollision
    } else if registry.apples().contains(&head) {
        Outcome::AteApple
    } else {
        Outcome::Continue
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct Scoring {
    pub(crate) score: u32,
    /// Number of apples eaten on consecutive steps
    pub(crate) combo: u32,
}

impl Scoring {
    /// Credit one eaten apple and return the points awarded.  With `combo`
    /// enabled, the n-th apple of a streak is worth n points.
    pub(crate) fn award(&mut self, combo: bool) -> u32 {
        self.combo = self.combo.saturating_add(1);
        let points = if combo { self.combo } else { 1 };
        self.score = self.score.saturating_add(points);
        points
    }

    /// Called on every step in which nothing was eaten
    pub(crate) fn break_streak(&mut self) {
        self.combo = 0;
    }
}

/// Number of multiples of `interval` passed when the score went from `old` to
/// `new`
pub(crate) fn crossings(old: u32, new: u32, interval: NonZeroU32) -> u32 {
    (new / interval).saturating_sub(old / interval)
}
