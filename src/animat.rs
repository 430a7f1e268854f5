/// Frame animations.
///
/// An `Animat` is the shared template (how many frames, how long each one
/// lasts) and is loaded once.  Every entity or projectile keeps only an
/// `AnimatCursor` into it, so the template is never copied per instance.
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Animat {
    /// Sprite sheet key the renderer resolves.
    pub name: String,
    pub frame_count: usize,
    /// Seconds per frame.
    pub frame_duration: f32,
    pub looping: bool,
}

impl Animat {
    pub fn new(name: &str, frame_count: usize, frame_duration: f32, looping: bool) -> Self {
        Animat {
            name: name.to_string(),
            frame_count,
            frame_duration,
            looping,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AnimatCursor {
    pub frame_current: usize,
    pub frame_cooldown: f32,
}

impl AnimatCursor {
    pub fn reset(&mut self, animat: &Animat) {
        self.frame_current = 0;
        self.frame_cooldown = animat.frame_duration;
    }

    /// Advance by `dt`.  A non-looping cursor stops at `frame_count`,
    /// which is one past the last drawable frame.
    pub fn update(&mut self, animat: &Animat, dt: f32) {
        if animat.frame_count == 0 || self.is_finished(animat) {
            return;
        }

        self.frame_cooldown -= dt;
        while self.frame_cooldown <= 0.0 {
            self.frame_current += 1;
            self.frame_cooldown += animat.frame_duration.max(f32::EPSILON);

            if self.frame_current >= animat.frame_count {
                if animat.looping {
                    self.frame_current = 0;
                } else {
                    self.frame_current = animat.frame_count;
                    return;
                }
            }
        }
    }

    pub fn is_finished(&self, animat: &Animat) -> bool {
        !animat.looping && self.frame_current >= animat.frame_count
    }

    /// Frame to draw, clamped into the template.
    pub fn frame(&self, animat: &Animat) -> usize {
        self.frame_current.min(animat.frame_count.saturating_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looping_wraps() {
        let a = Animat::new("walk", 3, 0.1, true);
        let mut c = AnimatCursor::default();
        c.reset(&a);
        c.update(&a, 0.35);
        assert_eq!(c.frame_current, 0);
        assert!(!c.is_finished(&a));
    }

    #[test]
    fn one_shot_finishes_and_stays() {
        let a = Animat::new("poof", 2, 0.1, false);
        let mut c = AnimatCursor::default();
        c.reset(&a);
        c.update(&a, 0.15);
        assert_eq!(c.frame_current, 1);
        assert!(!c.is_finished(&a));
        c.update(&a, 0.1);
        assert!(c.is_finished(&a));
        c.update(&a, 10.0);
        assert_eq!(c.frame_current, 2);
        assert_eq!(c.frame(&a), 1);
    }
}
