//! Pure shape helpers: hexagon outlines and label wrapping.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use crate::camera::Point;
use crate::consts::{HEX_BASE_HEIGHT, HEX_BASE_WIDTH};

/// Vertices of the canonical flat-top hexagon at its base size, clockwise from top-left.
const HEX_BASE_VERTICES: [(f64, f64); 6] =
    [(35.0, 0.0), (105.0, 0.0), (140.0, 60.5), (105.0, 121.0), (35.0, 121.0), (0.0, 60.5)];

/// Hexagon vertices scaled to fit a `width` x `height` box.
#[must_use]
pub fn hex_vertices(width: f64, height: f64) -> Vec<Point> {
    let sx = width / HEX_BASE_WIDTH;
    let sy = height / HEX_BASE_HEIGHT;
    HEX_BASE_VERTICES
        .iter()
        .map(|&(x, y)| Point::new(x * sx, y * sy))
        .collect()
}

/// SVG `points` attribute for a hexagon fitted to `width` x `height`.
#[must_use]
pub fn hex_points(width: f64, height: f64) -> String {
    hex_vertices(width, height)
        .iter()
        .map(|p| format!("{},{}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Greedily pack whitespace-separated words into lines of at most `max_chars`
/// characters, keeping at most `max_lines` lines.
///
/// A word longer than `max_chars` gets a line of its own and is not split.
/// Words that do not fit in `max_lines` lines are dropped without an ellipsis,
/// so callers rendering user text should expect silent truncation.
#[must_use]
pub fn wrap_lines(text: &str, max_chars: usize, max_lines: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    if max_lines == 0 {
        return lines;
    }

    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        if current.chars().count() + 1 + word.chars().count() <= max_chars {
            current.push(' ');
            current.push_str(word);
            continue;
        }
        lines.push(std::mem::take(&mut current));
        if lines.len() == max_lines {
            return lines;
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
