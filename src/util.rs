use crate::consts;
use ratatui::layout::{Constraint, Flex, Layout, Rect, Size};

/// Return the area of `buffer_area` in which the program draws, i.e., a
/// [`DISPLAY_SIZE`][consts::DISPLAY_SIZE] rectangle in its center
pub(crate) fn get_display_area(buffer_area: Rect) -> Rect {
    center_rect(buffer_area, consts::DISPLAY_SIZE)
}

/// Return a rectangle of the given size centered in `area`, shrunk to fit if
/// `area` is too small
pub(crate) fn center_rect(area: Rect, size: Size) -> Rect {
    let [area] = Layout::horizontal([Constraint::Length(size.width)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::vertical([Constraint::Length(size.height)])
        .flex(Flex::Center)
        .areas(area);
    area
}
