use ratatui::layout::{Position, Positions, Rect, Size};

/// The dimensions of the playfield, in grid cells.  The playfield is a torus:
/// leaving one edge re-enters from the opposite edge.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Bounds {
    pub(crate) width: u16,
    pub(crate) height: u16,
}

impl Bounds {
    pub(crate) fn new(width: u16, height: u16) -> Bounds {
        Bounds { width, height }
    }

    pub(crate) fn size(self) -> Size {
        Size {
            width: self.width,
            height: self.height,
        }
    }

    /// Iterate over every cell of the grid in row-major order
    pub(crate) fn positions(self) -> Positions {
        Rect::from((Position::ORIGIN, self.size())).positions()
    }

    pub(crate) fn cell_count(self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }

    pub(crate) fn center(self) -> Position {
        Position::new(self.width / 2, self.height / 2)
    }

    pub(crate) fn contains(self, pos: Position) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    /// Normalize a possibly out-of-range coordinate pair onto the grid by
    /// adding or subtracting whole grid extents on each axis.
    pub(crate) fn wrap(self, x: i32, y: i32) -> Position {
        Position::new(wrap_axis(x, self.width), wrap_axis(y, self.height))
    }
}

/// Every entity occupies exactly one whole cell, so two entities intersect
/// iff they are on the same cell.
pub(crate) fn cells_intersect(a: Position, b: Position) -> bool {
    a == b
}

fn wrap_axis(v: i32, extent: u16) -> u16 {
    if extent == 0 {
        return 0;
    }
    // `rem_euclid()` is always in `0..extent`, which fits in a `u16`.
    u16::try_from(v.rem_euclid(i32::from(extent))).unwrap_or_default()
}
