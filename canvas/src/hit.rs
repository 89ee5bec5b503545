#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::Point;
use crate::doc::{CanvasElement, ElementId};

/// Axis-aligned rectangle in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    /// Normalized rectangle spanning two arbitrary corners.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self { left: a.x.min(b.x), top: a.y.min(b.y), right: a.x.max(b.x), bottom: a.y.max(b.y) }
    }

    /// Bounding box of an element.
    #[must_use]
    pub fn of_element(el: &CanvasElement) -> Self {
        Self {
            left: el.position.x,
            top: el.position.y,
            right: el.position.x + el.size.width,
            bottom: el.position.y + el.size.height,
        }
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }

    /// Strict overlap test; rectangles that only touch along an edge do not intersect.
    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left < other.right && self.right > other.left && self.top < other.bottom && self.bottom > other.top
    }

    /// Smallest rectangle containing both.
    #[must_use]
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }
}

/// Top-most element under `point`. Later elements in the list draw on top.
#[must_use]
pub fn hit_test<'a>(point: Point, elements: &'a [CanvasElement]) -> Option<&'a CanvasElement> {
    elements
        .iter()
        .rev()
        .find(|el| Rect::of_element(el).contains(point))
}

/// Ids of every element whose bounding box intersects `marquee`, in document order.
#[must_use]
pub fn elements_in_rect(marquee: &Rect, elements: &[CanvasElement]) -> Vec<ElementId> {
    elements
        .iter()
        .filter(|el| marquee.intersects(&Rect::of_element(el)))
        .map(|el| el.id.clone())
        .collect()
}

/// Bounding box enclosing all `elements`, or `None` when empty.
#[must_use]
pub fn bounds_of<'a, I>(elements: I) -> Option<Rect>
where
    I: IntoIterator<Item = &'a CanvasElement>,
{
    elements
        .into_iter()
        .map(Rect::of_element)
        .reduce(|acc, r| acc.union(&r))
}
