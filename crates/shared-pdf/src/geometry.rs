//! Rectangles in PDF user space (bottom-left origin, points)

/// An axis-aligned rectangle anchored at its bottom-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn top(&self) -> f64 {
        self.y + self.height
    }

    /// True when `other` lies entirely inside this rectangle.
    ///
    /// A small epsilon absorbs float noise from scaling arithmetic.
    pub fn contains(&self, other: &Rect) -> bool {
        const EPSILON: f64 = 1e-6;
        other.x >= self.x - EPSILON
            && other.y >= self.y - EPSILON
            && other.right() <= self.right() + EPSILON
            && other.top() <= self.top() + EPSILON
    }

    /// Check if two rectangles overlap (touching edges do not count)
    pub fn overlaps(&self, other: &Rect) -> bool {
        !(self.right() <= other.x
            || other.right() <= self.x
            || self.top() <= other.y
            || other.top() <= self.y)
    }
}

/// A page's MediaBox expressed as origin plus size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PageBox {
    /// Build from a `[x1, y1, x2, y2]` MediaBox array
    pub fn from_corners(values: [f64; 4]) -> Self {
        Self {
            x: values[0],
            y: values[1],
            width: values[2] - values[0],
            height: values[3] - values[1],
        }
    }

    /// Pages with a non-positive side cannot be drawn on
    pub fn is_drawable(&self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_corners_offset_media_box() {
        let page = PageBox::from_corners([10.0, 20.0, 622.0, 812.0]);
        assert_eq!(page.width, 612.0);
        assert_eq!(page.height, 792.0);
        assert!(page.is_drawable());
    }

    #[test]
    fn test_inverted_media_box_is_not_drawable() {
        let page = PageBox::from_corners([612.0, 0.0, 0.0, 792.0]);
        assert!(!page.is_drawable());
    }

    #[test]
    fn test_contains_and_overlaps() {
        let outer = Rect::new(0.0, 0.0, 100.0, 100.0);
        let inner = Rect::new(10.0, 10.0, 20.0, 20.0);
        let adjacent = Rect::new(100.0, 0.0, 50.0, 50.0);

        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert!(outer.overlaps(&inner));
        assert!(!outer.overlaps(&adjacent));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn rect() -> impl Strategy<Value = Rect> {
        (-500.0f64..500.0, -500.0f64..500.0, 0.5f64..800.0, 0.5f64..800.0)
            .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
    }

    proptest! {
        /// Property: a rectangle cut from another by fractions stays inside it
        #[test]
        fn sub_rect_is_contained(
            outer in rect(),
            left in 0.0f64..0.45,
            bottom in 0.0f64..0.45,
            right in 0.55f64..1.0,
            top in 0.55f64..1.0,
        ) {
            let inner = Rect::new(
                outer.x + outer.width * left,
                outer.y + outer.height * bottom,
                outer.width * (right - left),
                outer.height * (top - bottom),
            );
            prop_assert!(outer.contains(&inner));
            prop_assert!(outer.overlaps(&inner));
            prop_assert!(inner.overlaps(&outer));
        }

        /// Property: overlap does not depend on argument order
        #[test]
        fn overlap_is_symmetric(a in rect(), b in rect()) {
            prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
        }

        /// Property: rectangles sharing only an edge never overlap
        #[test]
        fn edge_neighbours_do_not_overlap(a in rect(), w in 0.5f64..800.0) {
            let right = Rect::new(a.right(), a.y, w, a.height);
            let above = Rect::new(a.x, a.top(), a.width, w);
            prop_assert!(!a.overlaps(&right));
            prop_assert!(!a.overlaps(&above));
        }
    }
}
