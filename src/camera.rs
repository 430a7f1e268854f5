use crate::math::{Rectf, Vec2f};

/// World-to-screen offset.  Only `follow` writes `pos`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Camera {
    pub pos: Vec2f,
}

impl Camera {
    /// Centre the viewport (in world units) on `target`.
    pub fn follow(&mut self, target: Vec2f, viewport: Vec2f) {
        self.pos = target - viewport * 0.5;
    }

    pub fn to_screen(&self, world: Vec2f) -> Vec2f {
        world - self.pos
    }

    pub fn rect_to_screen(&self, r: Rectf) -> Rectf {
        r - self.pos
    }

    pub fn to_world(&self, screen: Vec2f) -> Vec2f {
        screen + self.pos
    }
}
