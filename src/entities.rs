/// Player and enemy entities.
///
/// The pool is a fixed array.  Slot 0 is always the player and slots
/// `ENEMY_ENTITY_INDEX_OFFSET..` are enemies; indices stay stable for the
/// whole session because slots are reset in place, never reallocated.
use std::rc::Rc;

use crate::animat::{Animat, AnimatCursor};
use crate::audio::{Sample, SampleMixer};
use crate::config::{Config, ENTITY_CAPACITY, TILE_SIZE};
use crate::math::{rect, vec2, Rectf, Vec2f};
use crate::projectiles::{ProjectileHandle, ProjectilePool};
use crate::room::RoomRow;

/// Where `spawn` puts an entity when no position is given.
pub const DEFAULT_SPAWN_POS: Vec2f = vec2(TILE_SIZE, 0.0);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityIndex(pub usize);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EntityState {
    /// Skipped by update, collision and rendering until respawned.
    #[default]
    Ded,
    Alive,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EntityDir {
    #[default]
    Right,
    Left,
}

impl EntityDir {
    pub fn sign(self) -> f32 {
        match self {
            EntityDir::Right => 1.0,
            EntityDir::Left => -1.0,
        }
    }
}

/// Which animation an alive entity is playing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AliveState {
    #[default]
    Idle,
    Walking,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Entity {
    pub state: EntityState,
    pub alive_state: AliveState,
    pub dir: EntityDir,
    /// Centre of the hitbox.
    pub pos: Vec2f,
    pub vel: Vec2f,
    pub walking: Rc<Animat>,
    pub idle: Rc<Animat>,
    pub animat: AnimatCursor,
    /// Seconds until the entity may shoot again.
    pub cooldown_weapon: f32,
    pub grounded: bool,
}

impl Entity {
    pub fn is_alive(&self) -> bool {
        self.state == EntityState::Alive
    }

    pub fn current_animat(&self) -> &Animat {
        match self.alive_state {
            AliveState::Idle => &self.idle,
            AliveState::Walking => &self.walking,
        }
    }

    fn switch_animat(&mut self, alive_state: AliveState) {
        if self.alive_state != alive_state {
            self.alive_state = alive_state;
            let animat = match alive_state {
                AliveState::Idle => &self.idle,
                AliveState::Walking => &self.walking,
            };
            self.animat.reset(animat);
        }
    }
}

#[derive(Clone, Debug)]
pub struct EntityPool {
    entities: [Entity; ENTITY_CAPACITY],
    hitbox: Vec2f,
    texbox: Vec2f,
    jump_height: f32,
    jump_cut: f32,
    projectile_speed: f32,
    weapon_cooldown: f32,
}

impl EntityPool {
    /// Every slot starts out `Ded`.
    pub fn new(config: &Config) -> EntityPool {
        EntityPool {
            entities: std::array::from_fn(|_| Entity::default()),
            hitbox: config.entity_hitbox,
            texbox: config.entity_texbox,
            jump_height: config.jump_height,
            jump_cut: config.jump_cut,
            projectile_speed: config.projectile_speed,
            weapon_cooldown: config.weapon_cooldown,
        }
    }

    pub fn entity(&self, index: EntityIndex) -> &Entity {
        &self.entities[index.0]
    }

    pub fn entity_mut(&mut self, index: EntityIndex) -> &mut Entity {
        &mut self.entities[index.0]
    }

    /// Alive entities with their indices.
    pub fn iter_alive(&self) -> impl Iterator<Item = (EntityIndex, &Entity)> {
        self.entities
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_alive())
            .map(|(i, e)| (EntityIndex(i), e))
    }

    pub fn hitbox_world(&self, index: EntityIndex) -> Rectf {
        Rectf::centered(self.entities[index.0].pos, self.hitbox)
    }

    /// Sprite rect, bottom-aligned with the hitbox.
    pub fn texbox_world(&self, index: EntityIndex) -> Rectf {
        let hitbox = self.hitbox_world(index);
        let center_x = self.entities[index.0].pos.x;
        rect(
            vec2(center_x - self.texbox.x * 0.5, hitbox.bottom() - self.texbox.y),
            self.texbox.x,
            self.texbox.y,
        )
    }

    /// Reinitialises the slot in place.  Valid at any time, including a
    /// round restart while other entities are mid-air.
    pub fn spawn(
        &mut self,
        index: EntityIndex,
        walking: Rc<Animat>,
        idle: Rc<Animat>,
        pos: Option<Vec2f>,
        dir: Option<EntityDir>,
    ) {
        let mut entity = Entity {
            state: EntityState::Alive,
            alive_state: AliveState::Idle,
            dir: dir.unwrap_or_default(),
            pos: pos.unwrap_or(DEFAULT_SPAWN_POS),
            walking,
            idle,
            ..Entity::default()
        };
        entity.animat.reset(&entity.idle);
        self.entities[index.0] = entity;
        log::debug!("spawned entity {} at {:?}", index.0, self.entities[index.0].pos);
    }

    pub fn move_entity(&mut self, index: EntityIndex, speed: f32) {
        let entity = &mut self.entities[index.0];
        if !entity.is_alive() {
            return;
        }
        entity.vel.x = speed;
        if speed > 0.0 {
            entity.dir = EntityDir::Right;
        } else if speed < 0.0 {
            entity.dir = EntityDir::Left;
        }
        entity.switch_animat(AliveState::Walking);
    }

    pub fn stop(&mut self, index: EntityIndex) {
        let entity = &mut self.entities[index.0];
        if !entity.is_alive() {
            return;
        }
        entity.vel.x = 0.0;
        entity.switch_animat(AliveState::Idle);
    }

    /// Launches a grounded entity so it peaks `jump_height` above its
    /// start, and plays `sample`.  Returns whether the jump happened.
    /// Callers feed key-down edges only; repeats must be filtered upstream.
    pub fn jump(
        &mut self,
        index: EntityIndex,
        gravity: Vec2f,
        mixer: &dyn SampleMixer,
        sample: Sample,
    ) -> bool {
        let entity = &mut self.entities[index.0];
        if !entity.is_alive() || !entity.grounded {
            return false;
        }

        let impulse = (2.0 * gravity.len() * self.jump_height).sqrt();
        entity.vel -= gravity.normalize() * impulse;
        entity.grounded = false;
        mixer.play_sample(sample);
        true
    }

    /// Key-up edge: a still-rising entity loses part of its upward speed,
    /// which makes short taps give short hops.
    pub fn release_jump(&mut self, index: EntityIndex) {
        let entity = &mut self.entities[index.0];
        if entity.is_alive() && entity.vel.y < 0.0 {
            entity.vel.y *= self.jump_cut;
        }
    }

    pub fn kill(&mut self, index: EntityIndex) {
        let entity = &mut self.entities[index.0];
        if entity.is_alive() {
            entity.state = EntityState::Ded;
            entity.vel = Vec2f::default();
            log::debug!("entity {} died", index.0);
        }
    }

    /// Fires from the hitbox edge the entity is facing.  Does nothing while
    /// the weapon cools down, for dead entities, or when the projectile
    /// pool is full.
    pub fn shoot(
        &mut self,
        index: EntityIndex,
        projectiles: &mut ProjectilePool,
    ) -> Option<ProjectileHandle> {
        let entity = &mut self.entities[index.0];
        if !entity.is_alive() || entity.cooldown_weapon > 0.0 {
            return None;
        }

        let sign = entity.dir.sign();
        let muzzle = entity.pos + vec2(sign * self.hitbox.x * 0.5, 0.0);
        let handle = projectiles.spawn(muzzle, vec2(sign * self.projectile_speed, 0.0), index)?;
        entity.cooldown_weapon = self.weapon_cooldown;
        Some(handle)
    }

    /// Integrates every alive entity: gravity into velocity, then velocity
    /// into position, vertical axis first, each axis stopped at the nearest
    /// blocking tile edge.
    pub fn update(&mut self, gravity: Vec2f, dt: f32, rooms: &RoomRow) {
        let hitbox = self.hitbox;
        for entity in self.entities.iter_mut().filter(|e| e.is_alive()) {
            entity.cooldown_weapon = (entity.cooldown_weapon - dt).max(0.0);
            let animat = match entity.alive_state {
                AliveState::Idle => &entity.idle,
                AliveState::Walking => &entity.walking,
            };
            entity.animat.update(animat, dt);

            entity.vel += gravity * dt;

            let (dy, hit_y) = rooms.sweep_y(Rectf::centered(entity.pos, hitbox), entity.vel.y * dt);
            entity.pos.y += dy;
            if hit_y {
                entity.grounded = entity.vel.y > 0.0;
                entity.vel.y = 0.0;
            } else {
                entity.grounded = false;
            }

            let (dx, _) = rooms.sweep_x(Rectf::centered(entity.pos, hitbox), entity.vel.x * dt);
            entity.pos.x += dx;
        }
    }
}
