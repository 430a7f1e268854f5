/// Fixed-capacity projectile pool.
///
/// Slots are never allocated or compacted.  Each slot carries its own
/// state tag and a generation counter that bumps on every spawn, so a
/// `ProjectileHandle` held across ticks can tell when its slot was freed
/// or reused.
use crate::animat::{Animat, AnimatCursor};
use crate::config::{Config, PROJECTILE_CAPACITY};
use crate::entities::EntityIndex;
use crate::math::{rect, rect_contains_vec2, vec2, Rectf, Vec2f};
use crate::room::RoomRow;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProjectileState {
    #[default]
    Ded,
    Active,
    /// Playing the death animation; no longer collides.
    Poof,
}

impl ProjectileState {
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectileState::Ded => "Ded",
            ProjectileState::Active => "Active",
            ProjectileState::Poof => "Poof",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Projectile {
    pub state: ProjectileState,
    pub pos: Vec2f,
    pub vel: Vec2f,
    /// Never hit by its own projectile.
    pub shooter: EntityIndex,
    /// Seconds left before an active projectile poofs on its own.
    pub lifetime: f32,
    pub bolt_animat: AnimatCursor,
    pub poof_animat: AnimatCursor,
    pub generation: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProjectileHandle {
    pub index: usize,
    pub generation: u32,
}

#[derive(Clone, Debug)]
pub struct ProjectilePool {
    slots: [Projectile; PROJECTILE_CAPACITY],
    /// One past the highest slot that may be live.
    watermark: usize,
    pub bolt: Animat,
    pub poof: Animat,
    hitbox: Vec2f,
    lifetime: f32,
    retire_margin: f32,
}

impl ProjectilePool {
    /// The animation templates are stored once here; projectiles only keep
    /// cursors into them.
    pub fn init(bolt: Animat, poof: Animat, config: &Config) -> ProjectilePool {
        ProjectilePool {
            slots: [Projectile::default(); PROJECTILE_CAPACITY],
            watermark: 0,
            bolt,
            poof,
            hitbox: config.projectile_hitbox,
            lifetime: config.projectile_lifetime,
            retire_margin: config.projectile_retire_margin,
        }
    }

    pub fn capacity(&self) -> usize {
        PROJECTILE_CAPACITY
    }

    pub fn watermark(&self) -> usize {
        self.watermark
    }

    /// Claims the first free slot.  When the pool is full the request is
    /// dropped and `None` is returned; live projectiles are untouched.
    pub fn spawn(&mut self, pos: Vec2f, vel: Vec2f, shooter: EntityIndex) -> Option<ProjectileHandle> {
        let Some(index) = self
            .slots
            .iter()
            .position(|p| p.state == ProjectileState::Ded)
        else {
            log::trace!("projectile pool full, dropping shot of {:?}", shooter);
            return None;
        };

        let slot = &mut self.slots[index];
        let generation = slot.generation.wrapping_add(1);
        *slot = Projectile {
            state: ProjectileState::Active,
            pos,
            vel,
            shooter,
            lifetime: self.lifetime,
            generation,
            ..Projectile::default()
        };
        slot.bolt_animat.reset(&self.bolt);

        self.watermark = self.watermark.max(index + 1);
        Some(ProjectileHandle { index, generation })
    }

    /// Starts the death animation at frame 0.  Only active projectiles poof.
    pub fn poof(&mut self, index: usize) {
        let slot = &mut self.slots[index];
        if slot.state == ProjectileState::Active {
            slot.state = ProjectileState::Poof;
            slot.poof_animat.reset(&self.poof);
        }
    }

    pub fn update(&mut self, dt: f32, rooms: &RoomRow) {
        let bounds = rooms.boundary();
        let m = self.retire_margin;
        let retire_bounds = rect(bounds.pos() - vec2(m, m), bounds.w + 2.0 * m, bounds.h + 2.0 * m);

        for index in 0..self.watermark {
            match self.slots[index].state {
                ProjectileState::Active => {
                    let slot = &mut self.slots[index];
                    slot.pos += slot.vel * dt;
                    slot.lifetime -= dt;
                    slot.bolt_animat.update(&self.bolt, dt);

                    if !rect_contains_vec2(retire_bounds, slot.pos) {
                        slot.state = ProjectileState::Ded;
                    } else if slot.lifetime <= 0.0 || !rooms.is_tile_empty_abs(slot.pos) {
                        self.poof(index);
                    }
                }
                ProjectileState::Poof => {
                    let slot = &mut self.slots[index];
                    slot.poof_animat.update(&self.poof, dt);
                    if slot.poof_animat.is_finished(&self.poof) {
                        slot.state = ProjectileState::Ded;
                    }
                }
                ProjectileState::Ded => {}
            }
        }

        while self.watermark > 0 && self.slots[self.watermark - 1].state == ProjectileState::Ded {
            self.watermark -= 1;
        }
    }

    pub fn slot(&self, index: usize) -> &Projectile {
        &self.slots[index]
    }

    pub fn handle_of(&self, index: usize) -> ProjectileHandle {
        ProjectileHandle {
            index,
            generation: self.slots[index].generation,
        }
    }

    /// Resolves a handle, or `None` if its projectile died or the slot was
    /// reused since the handle was taken.
    pub fn get(&self, handle: ProjectileHandle) -> Option<&Projectile> {
        self.slots
            .get(handle.index)
            .filter(|p| p.generation == handle.generation && p.state != ProjectileState::Ded)
    }

    pub fn hitbox(&self, index: usize) -> Rectf {
        Rectf::centered(self.slots[index].pos, self.hitbox)
    }

    /// Active and poofing projectiles, in slot order.
    pub fn iter_live(&self) -> impl Iterator<Item = (usize, &Projectile)> {
        self.slots[..self.watermark]
            .iter()
            .enumerate()
            .filter(|(_, p)| p.state != ProjectileState::Ded)
    }

    pub fn count_alive(&self) -> usize {
        self.iter_live().count()
    }

    /// First live projectile whose hitbox contains `pos`.
    pub fn projectile_at_position(&self, pos: Vec2f) -> Option<ProjectileHandle> {
        self.iter_live()
            .find(|(index, _)| rect_contains_vec2(self.hitbox(*index), pos))
            .map(|(index, _)| self.handle_of(index))
    }
}
