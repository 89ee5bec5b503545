#![allow(clippy::float_cmp)]

use super::*;

fn parse_points(points: &str) -> Vec<(f64, f64)> {
    points
        .split(' ')
        .map(|pair| {
            let (x, y) = pair.split_once(',').unwrap();
            (x.parse().unwrap(), y.parse().unwrap())
        })
        .collect()
}

// =============================================================
// hex_points / hex_vertices
// =============================================================

#[test]
fn hex_points_base_size_is_canonical_outline() {
    assert_eq!(hex_points(140.0, 121.0), "35,0 105,0 140,60.5 105,121 35,121 0,60.5");
}

#[test]
fn hex_points_double_size_is_exactly_double() {
    let base = parse_points(&hex_points(140.0, 121.0));
    let doubled = parse_points(&hex_points(280.0, 242.0));
    assert_eq!(base.len(), 6);
    for ((bx, by), (dx, dy)) in base.iter().zip(doubled.iter()) {
        assert_eq!(*dx, bx * 2.0);
        assert_eq!(*dy, by * 2.0);
    }
    assert_eq!(hex_points(280.0, 242.0), "70,0 210,0 280,121 210,242 70,242 0,121");
}

#[test]
fn hex_points_scale_axes_independently() {
    let pts = parse_points(&hex_points(70.0, 242.0));
    assert_eq!(pts[2], (70.0, 121.0));
    assert_eq!(pts[3], (52.5, 242.0));
}

#[test]
fn hex_vertices_fit_inside_box() {
    for p in hex_vertices(200.0, 90.0) {
        assert!(p.x >= 0.0 && p.x <= 200.0);
        assert!(p.y >= 0.0 && p.y <= 90.0);
    }
}

#[test]
fn hex_vertices_zero_size_collapses_to_origin() {
    assert!(hex_vertices(0.0, 0.0).iter().all(|p| p.x == 0.0 && p.y == 0.0));
}

// =============================================================
// wrap_lines
// =============================================================

#[test]
fn wrap_lines_reference_case() {
    assert_eq!(wrap_lines("a b c d e f", 3, 2), vec!["a b", "c d"]);
}

#[test]
fn wrap_lines_fits_on_one_line() {
    assert_eq!(wrap_lines("hello world", 20, 3), vec!["hello world"]);
}

#[test]
fn wrap_lines_exact_budget_breaks_between_words() {
    assert_eq!(wrap_lines("hello world", 5, 3), vec!["hello", "world"]);
}

#[test]
fn wrap_lines_long_word_keeps_its_own_line() {
    assert_eq!(wrap_lines("extraordinary idea", 5, 3), vec!["extraordinary", "idea"]);
}

#[test]
fn wrap_lines_empty_text() {
    assert!(wrap_lines("", 5, 3).is_empty());
    assert!(wrap_lines("   \n\t ", 5, 3).is_empty());
}

#[test]
fn wrap_lines_zero_lines() {
    assert!(wrap_lines("anything at all", 10, 0).is_empty());
}

#[test]
fn wrap_lines_drops_overflow_without_ellipsis() {
    let lines = wrap_lines("one two three four five six", 7, 2);
    assert_eq!(lines, vec!["one two", "three"]);
    assert!(lines.iter().all(|l| !l.contains('…') && !l.ends_with("...")));
}

#[test]
fn wrap_lines_collapses_repeated_whitespace() {
    assert_eq!(wrap_lines("  key    partners  ", 20, 2), vec!["key partners"]);
}

#[test]
fn wrap_lines_counts_characters_not_bytes() {
    assert_eq!(wrap_lines("é é é", 3, 5), vec!["é é", "é"]);
}
