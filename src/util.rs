use fxhash::{FxHashMap, FxHashSet};
use glam::Vec2;

/**
 * Hash map with a fast non-cryptographically secure hash function.
 */
pub type HashMap<K, V> = FxHashMap<K, V>;

/**
 * Hash set with a fast non-cryptographically secure hash function.
 */
pub type HashSet<V> = FxHashSet<V>;


/// Basic rectangle primitive in pixel space.
/// Origin is the top-left corner and y grows downwards.
#[derive(Copy, Clone, PartialEq, Default, Debug)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self { origin: center - size / 2.0, size }
    }

    pub fn left(&self) -> f32 { self.origin.x }
    pub fn right(&self) -> f32 { self.origin.x + self.size.x }
    pub fn top(&self) -> f32 { self.origin.y }
    pub fn bottom(&self) -> f32 { self.origin.y + self.size.y }

    pub fn center(&self) -> Vec2 {
        self.origin + self.size / 2.0
    }

    /// Same size, moved so that its center lands on `center`.
    pub fn with_center(self, center: Vec2) -> Self {
        Self::from_center(center, self.size)
    }

    pub fn mid_top(&self) -> Vec2 { Vec2::new(self.center().x, self.top()) }
    pub fn mid_bottom(&self) -> Vec2 { Vec2::new(self.center().x, self.bottom()) }
    pub fn mid_left(&self) -> Vec2 { Vec2::new(self.left(), self.center().y) }
    pub fn mid_right(&self) -> Vec2 { Vec2::new(self.right(), self.center().y) }

    /// True if the two rectangles overlap with a non-zero area.
    /// Touching edges do not count.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right() &&
        other.left() < self.right() &&
        self.top() < other.bottom() &&
        other.top() < self.bottom()
    }

    /// Scales the rectangle around its center.
    /// A ratio of (1, 1) leaves it untouched.
    pub fn scaled(self, ratio: Vec2) -> Self {
        Self::from_center(self.center(), self.size * ratio)
    }

    /// Largest side.
    pub fn max_side(&self) -> f32 {
        self.size.x.max(self.size.y)
    }
}


/// Size of an image of `image_size` scaled to fit inside `bounds`.
/// The longer side of the image matches the corresponding side of the bounds.
pub fn fit_preserving_aspect(image_size: Vec2, bounds: Vec2) -> Vec2 {
    if image_size.x <= 0.0 || image_size.y <= 0.0 {
        return bounds;
    }
    if image_size.x > image_size.y {
        let scale = bounds.x / image_size.x;
        Vec2::new(bounds.x, image_size.y * scale)
    }
    else {
        let scale = bounds.y / image_size.y;
        Vec2::new(image_size.x * scale, bounds.y)
    }
}

/// Formats a ratio as a whole percentage, truncating.
pub fn percentage_format(ratio: f32) -> String {
    format!("{}%", (ratio * 100.0) as i32)
}
