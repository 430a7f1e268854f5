/// Tunables and animation templates.
///
/// Array-sizing dimensions stay `const`; everything a level designer might
/// want to tweak lives in `Config`, which can be loaded from a RON file.
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::animat::Animat;
use crate::error::{GameError, Result};
use crate::math::{vec2, Vec2f};

// ── Fixed dimensions ──────────────────────────────────────────────────────────

pub const TILE_SIZE: f32 = 128.0;
pub const ROOM_WIDTH: usize = 10;
pub const ROOM_HEIGHT: usize = 10;
pub const ROOM_ROW_COUNT: usize = 8;

pub const ENTITY_CAPACITY: usize = 8;
pub const PLAYER_ENTITY_INDEX: usize = 0;
pub const ENEMY_ENTITY_INDEX_OFFSET: usize = 1;
pub const ENEMY_COUNT: usize = 5;

pub const PROJECTILE_CAPACITY: usize = 64;

// Startup lays a floor at row ROOM_HEIGHT - 1 - room_index.
const _: () = assert!(ROOM_ROW_COUNT <= ROOM_HEIGHT);
const _: () = assert!(ENEMY_ENTITY_INDEX_OFFSET + ENEMY_COUNT <= ENTITY_CAPACITY);
const _: () = assert!(ROOM_WIDTH >= ENEMY_COUNT + 2);

// ── Tunables ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimatSet {
    pub walking: Animat,
    pub idle: Animat,
    pub plasma_bolt: Animat,
    pub plasma_pop: Animat,
}

impl Default for AnimatSet {
    fn default() -> Self {
        AnimatSet {
            walking: Animat::new("walking", 4, 0.1, true),
            idle: Animat::new("idle", 2, 0.5, true),
            plasma_bolt: Animat::new("plasma_bolt", 3, 0.05, true),
            // Poof completion threshold: the projectile is freed after
            // this many frames.
            plasma_pop: Animat::new("plasma_pop", 4, 0.05, false),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gravity: Vec2f,
    pub player_speed: f32,
    /// Apex height of a jump in world units.
    pub jump_height: f32,
    /// Upward velocity is multiplied by this when the jump key is released early.
    pub jump_cut: f32,
    pub projectile_speed: f32,
    /// Seconds between two shots of the same entity.
    pub weapon_cooldown: f32,
    /// Seconds an active projectile flies before it poofs on its own.
    pub projectile_lifetime: f32,
    /// How far outside the room row an active projectile may travel before
    /// its slot is freed.
    pub projectile_retire_margin: f32,
    pub step_fps: u32,
    pub entity_hitbox: Vec2f,
    pub entity_texbox: Vec2f,
    pub projectile_hitbox: Vec2f,
    pub animats: AnimatSet,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            gravity: vec2(0.0, 2500.0),
            player_speed: 600.0,
            jump_height: TILE_SIZE * 2.5,
            jump_cut: 0.5,
            projectile_speed: 1200.0,
            weapon_cooldown: 0.3,
            projectile_lifetime: 5.0,
            projectile_retire_margin: TILE_SIZE,
            step_fps: 60,
            entity_hitbox: vec2(TILE_SIZE * 0.5, TILE_SIZE * 0.75),
            entity_texbox: vec2(TILE_SIZE, TILE_SIZE),
            projectile_hitbox: vec2(TILE_SIZE * 0.25, TILE_SIZE * 0.25),
            animats: AnimatSet::default(),
        }
    }
}

impl Config {
    pub fn from_ron_str(text: &str) -> Result<Config> {
        Ok(ron::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Config> {
        let text = std::fs::read_to_string(path).map_err(|source| GameError::FatalIo {
            action: "read config",
            path: path.to_path_buf(),
            source,
        })?;
        let config = Config::from_ron_str(&text)?;
        config.validate()?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Every animation must have at least one frame of positive length.
    pub fn validate(&self) -> Result<()> {
        let a = &self.animats;
        for animat in [&a.walking, &a.idle, &a.plasma_bolt, &a.plasma_pop] {
            if animat.frame_count == 0 || animat.frame_duration <= 0.0 {
                return Err(GameError::FatalResource(format!(
                    "animation `{}` has no playable frames",
                    animat.name
                )));
            }
        }
        Ok(())
    }

    /// Seconds per fixed simulation tick.
    pub fn step_dt(&self) -> f32 {
        1.0 / self.step_fps.max(1) as f32
    }
}
