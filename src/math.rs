/// Plain 2D value types shared by every other module.
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2<T> {
    pub x: T,
    pub y: T,
}

pub type Vec2f = Vec2<f32>;
pub type Vec2i = Vec2<i32>;

pub const fn vec2<T>(x: T, y: T) -> Vec2<T> {
    Vec2 { x, y }
}

impl Eq for Vec2<i32> {}

impl std::hash::Hash for Vec2<i32> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.x.hash(state);
        self.y.hash(state);
    }
}

impl<T: Add<Output = T>> Add for Vec2<T> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        vec2(self.x + rhs.x, self.y + rhs.y)
    }
}

impl<T: Sub<Output = T>> Sub for Vec2<T> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        vec2(self.x - rhs.x, self.y - rhs.y)
    }
}

impl<T: AddAssign> AddAssign for Vec2<T> {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl<T: SubAssign> SubAssign for Vec2<T> {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl<T: Mul<Output = T> + Copy> Mul<T> for Vec2<T> {
    type Output = Self;
    fn mul(self, s: T) -> Self {
        vec2(self.x * s, self.y * s)
    }
}

impl<T: Div<Output = T> + Copy> Div<T> for Vec2<T> {
    type Output = Self;
    fn div(self, s: T) -> Self {
        vec2(self.x / s, self.y / s)
    }
}

impl<T: Neg<Output = T>> Neg for Vec2<T> {
    type Output = Self;
    fn neg(self) -> Self {
        vec2(-self.x, -self.y)
    }
}

impl Vec2f {
    pub fn sqr_len(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn len(self) -> f32 {
        self.sqr_len().sqrt()
    }

    /// Unit vector in the same direction.  The zero vector stays zero.
    pub fn normalize(self) -> Self {
        let l = self.len();
        if l == 0.0 {
            self
        } else {
            self / l
        }
    }

    /// Truncates towards negative infinity, so world positions left of
    /// the origin land in tile -1 and not tile 0.
    pub fn floor_to_i32(self) -> Vec2i {
        vec2(self.x.floor() as i32, self.y.floor() as i32)
    }
}

impl Vec2i {
    pub fn as_f32(self) -> Vec2f {
        vec2(self.x as f32, self.y as f32)
    }
}

pub fn sqr_dist(a: Vec2f, b: Vec2f) -> f32 {
    (b - a).sqr_len()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect<T> {
    pub x: T,
    pub y: T,
    pub w: T,
    pub h: T,
}

pub type Rectf = Rect<f32>;

pub fn rect(pos: Vec2f, w: f32, h: f32) -> Rectf {
    Rect { x: pos.x, y: pos.y, w, h }
}

impl Rectf {
    /// Rectangle of size `size` centred on `center`.
    pub fn centered(center: Vec2f, size: Vec2f) -> Self {
        rect(center - size * 0.5, size.x, size.y)
    }

    pub fn pos(&self) -> Vec2f {
        vec2(self.x, self.y)
    }

    pub fn center(&self) -> Vec2f {
        vec2(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }
}

impl Add<Vec2f> for Rectf {
    type Output = Self;
    fn add(self, v: Vec2f) -> Self {
        rect(self.pos() + v, self.w, self.h)
    }
}

impl Sub<Vec2f> for Rectf {
    type Output = Self;
    fn sub(self, v: Vec2f) -> Self {
        rect(self.pos() - v, self.w, self.h)
    }
}

/// Half-open containment: the left/top edges belong to the rect, the
/// right/bottom edges do not.
pub fn rect_contains_vec2(r: Rectf, p: Vec2f) -> bool {
    r.x <= p.x && p.x < r.right() && r.y <= p.y && p.y < r.bottom()
}

/// Strict overlap; rects that only share an edge do not overlap.
pub fn rects_overlap(a: Rectf, b: Rectf) -> bool {
    a.x < b.right() && b.x < a.right() && a.y < b.bottom() && b.y < a.bottom()
}
