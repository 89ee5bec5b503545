#![allow(clippy::clone_on_copy, clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-10;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn point_approx_eq(a: Point, b: Point) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
}

fn no_origin() -> Point {
    Point::new(0.0, 0.0)
}

// --- Point ---

#[test]
fn point_new() {
    let p = Point::new(3.0, 4.0);
    assert_eq!(p.x, 3.0);
    assert_eq!(p.y, 4.0);
}

#[test]
fn point_distance() {
    assert!(approx_eq(Point::new(0.0, 0.0).distance(Point::new(3.0, 4.0)), 5.0));
}

// --- screen_to_canvas ---

#[test]
fn screen_to_canvas_identity_at_100_percent() {
    let p = screen_to_canvas(Point::new(120.0, 80.0), 100.0, Point::new(0.0, 0.0), no_origin());
    assert!(point_approx_eq(p, Point::new(120.0, 80.0)));
}

#[test]
fn screen_to_canvas_subtracts_origin_then_pan() {
    let p = screen_to_canvas(Point::new(132.0, 92.0), 100.0, Point::new(10.0, 20.0), Point::new(32.0, 32.0));
    assert!(point_approx_eq(p, Point::new(90.0, 40.0)));
}

#[test]
fn screen_to_canvas_divides_by_zoom_factor() {
    let p = screen_to_canvas(Point::new(232.0, 132.0), 200.0, Point::new(0.0, 0.0), Point::new(32.0, 32.0));
    assert!(point_approx_eq(p, Point::new(100.0, 50.0)));
}

#[test]
fn screen_to_canvas_half_zoom_doubles_distance() {
    let p = screen_to_canvas(Point::new(50.0, 25.0), 50.0, Point::new(0.0, 0.0), no_origin());
    assert!(point_approx_eq(p, Point::new(100.0, 50.0)));
}

#[test]
fn canvas_to_screen_inverts_screen_to_canvas() {
    let pan = Point::new(-40.0, 15.0);
    let origin = Point::new(32.0, 32.0);
    let screen = Point::new(317.0, -12.5);
    for zoom in [25.0, 80.0, 100.0, 150.0, 300.0] {
        let back = canvas_to_screen(screen_to_canvas(screen, zoom, pan, origin), zoom, pan, origin);
        assert!(point_approx_eq(back, screen), "zoom {zoom}");
    }
}

// --- Camera ---

#[test]
fn camera_default_is_100_percent_with_padding_origin() {
    let cam = Camera::default();
    assert_eq!(cam.zoom, 100.0);
    assert_eq!(cam.pan_x, 0.0);
    assert_eq!(cam.pan_y, 0.0);
    assert_eq!(cam.origin, Point::new(32.0, 32.0));
    assert_eq!(cam.scale(), 1.0);
}

#[test]
fn camera_screen_to_canvas_matches_free_function() {
    let cam = Camera { pan_x: 12.0, pan_y: -8.0, zoom: 125.0, origin: Point::new(32.0, 32.0) };
    let screen = Point::new(400.0, 300.0);
    let expected = screen_to_canvas(screen, 125.0, Point::new(12.0, -8.0), Point::new(32.0, 32.0));
    assert!(point_approx_eq(cam.screen_to_canvas(screen), expected));
}

#[test]
fn camera_screen_dist_to_canvas() {
    let cam = Camera { zoom: 200.0, ..Camera::default() };
    assert!(approx_eq(cam.screen_dist_to_canvas(10.0), 5.0));
}

#[test]
fn camera_zoom_in_and_out_step_by_ten() {
    let mut cam = Camera::default();
    cam.zoom_in();
    assert_eq!(cam.zoom, 110.0);
    cam.zoom_out();
    cam.zoom_out();
    assert_eq!(cam.zoom, 90.0);
}

#[test]
fn camera_zoom_clamps_to_bounds() {
    let mut cam = Camera::default();
    cam.set_zoom(5.0);
    assert_eq!(cam.zoom, 25.0);
    cam.zoom_out();
    assert_eq!(cam.zoom, 25.0);
    cam.set_zoom(1000.0);
    assert_eq!(cam.zoom, 300.0);
    cam.zoom_in();
    assert_eq!(cam.zoom, 300.0);
}

#[test]
fn camera_reset_restores_default_zoom_and_pan() {
    let mut cam = Camera::default();
    cam.set_zoom(180.0);
    cam.pan_by(40.0, -20.0);
    cam.reset();
    assert_eq!(cam.zoom, 100.0);
    assert_eq!(cam.pan(), Point::new(0.0, 0.0));
}

#[test]
fn camera_pan_by_accumulates() {
    let mut cam = Camera::default();
    cam.pan_by(5.0, 6.0);
    cam.pan_by(-2.0, 1.0);
    assert_eq!(cam.pan(), Point::new(3.0, 7.0));
}
