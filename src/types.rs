use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

/// A 2D point, used for both positions and velocities.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length_sq(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(self) -> f32 {
        self.length_sq().sqrt()
    }

    pub fn distance(self, other: Point) -> f32 {
        (other - self).length()
    }

    /// Multiplies each axis by its own factor.
    pub fn scale_axes(&mut self, fx: f32, fy: f32) {
        self.x *= fx;
        self.y *= fy;
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Point {
    fn sub_assign(&mut self, rhs: Point) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f32> for Point {
    type Output = Point;

    fn mul(self, rhs: f32) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// Axis-aligned rectangle in screen orientation: `top <= bottom`, `left <= right`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub top: f32,
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
}

impl Rect {
    pub fn new(top: f32, left: f32, bottom: f32, right: f32) -> Self {
        Self {
            top,
            left: left.min(right),
            bottom: bottom.max(top),
            right: right.max(left),
        }
    }

    /// Moves every edge inwards by `margin`. Edges that would cross collapse
    /// onto the midpoint instead.
    pub fn shrink(self, margin: f32) -> Rect {
        let (top, bottom) = if self.height() >= margin * 2.0 {
            (self.top + margin, self.bottom - margin)
        } else {
            let mid = self.mid_y();
            (mid, mid)
        };
        let (left, right) = if self.width() >= margin * 2.0 {
            (self.left + margin, self.right - margin)
        } else {
            let mid = self.mid_x();
            (mid, mid)
        };
        Rect {
            top,
            left,
            bottom,
            right,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn mid_x(&self) -> f32 {
        self.left + self.width() / 2.0
    }

    pub fn mid_y(&self) -> f32 {
        self.top + self.height() / 2.0
    }

    pub fn midpoint(&self) -> Point {
        Point::new(self.mid_x(), self.mid_y())
    }
}

/// An sRGB color with straight alpha in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::opaque([0, 0, 0]);

    pub const fn opaque(rgb: [u8; 3]) -> Self {
        Self {
            r: rgb[0],
            g: rgb[1],
            b: rgb[2],
            a: 1.0,
        }
    }

    pub fn with_alpha(rgb: [u8; 3], alpha: f32) -> Self {
        Self {
            a: alpha.clamp(0.0, 1.0),
            ..Self::opaque(rgb)
        }
    }

    /// Composites this color over an opaque backdrop.
    pub fn over(self, backdrop: [u8; 3]) -> [u8; 3] {
        let mix = |fg: u8, bg: u8| -> u8 {
            (fg as f32 * self.a + bg as f32 * (1.0 - self.a)).round() as u8
        };
        [
            mix(self.r, backdrop[0]),
            mix(self.g, backdrop[1]),
            mix(self.b, backdrop[2]),
        ]
    }
}
