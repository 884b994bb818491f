use super::registry::Registry;
use rand::{seq::IteratorRandom, Rng};
use ratatui::layout::Position;
use thiserror::Error;

/// How many random cells to try before scanning the whole grid for a free one
const SPAWN_ATTEMPTS: usize = 64;

#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[error("no free cell left on the grid")]
pub(crate) struct GridFull;

/// Pick a uniformly random unoccupied cell.
///
/// Random cells are drawn until a free one turns up; after
/// [`SPAWN_ATTEMPTS`] misses the free cells are enumerated and one of them is
/// chosen directly, so a nearly-full grid cannot stall the game.
pub(crate) fn free_cell<R: Rng>(rng: &mut R, registry: &Registry) -> Result<Position, GridFull> {
    free_cell_outside(rng, registry, &[])
}

/// Like [`free_cell()`], but the cells in `keep_clear` are never chosen
fn free_cell_outside<R: Rng>(
    rng: &mut R,
    registry: &Registry,
    keep_clear: &[Position],
) -> Result<Position, GridFull> {
    let bounds = registry.bounds();
    if bounds.cell_count() == 0 {
        return Err(GridFull);
    }
    let usable = |pos: Position| !registry.is_occupied(pos) && !keep_clear.contains(&pos);
    for _ in 0..SPAWN_ATTEMPTS {
        let pos = Position::new(
            rng.random_range(0..bounds.width),
            rng.random_range(0..bounds.height),
        );
        if usable(pos) {
            return Ok(pos);
        }
    }
    registry
        .free_cells()
        .filter(|p| !keep_clear.contains(p))
        .choose(rng)
        .ok_or(GridFull)
}

/// Place up to `count` apples, each on a cell free at the time it is placed.
/// On `Err`, the apples placed before the grid ran out stay in place.
pub(crate) fn spawn_apples<R: Rng>(
    rng: &mut R,
    registry: &mut Registry,
    count: usize,
) -> Result<Vec<Position>, GridFull> {
    let mut placed = Vec::with_capacity(count);
    for _ in 0..count {
        let pos = free_cell(rng, registry)?;
        registry.apples.insert(pos);
        placed.push(pos);
    }
    Ok(placed)
}

/// Place an obstacle on a free cell not in `keep_clear`
pub(crate) fn spawn_obstacle<R: Rng>(
    rng: &mut R,
    registry: &mut Registry,
    keep_clear: &[Position],
) -> Result<Position, GridFull> {
    let pos = free_cell_outside(rng, registry, keep_clear)?;
    registry.obstacles.insert(pos);
    Ok(pos)
}
