/// Game-state transitions.
///
/// `update_game_state` is the fixed-step tick.  `handle_intent` applies one
/// discrete input intent coming from the frame driver.  Both mutate the
/// state in place; nothing here touches the terminal or the clock.
use std::rc::Rc;

use crate::animat::Animat;
use crate::audio::{Sample, SampleMixer};
use crate::camera::Camera;
use crate::config::{
    Config, ENEMY_COUNT, ENEMY_ENTITY_INDEX_OFFSET, ENTITY_CAPACITY, PLAYER_ENTITY_INDEX,
    ROOM_HEIGHT, ROOM_WIDTH, TILE_SIZE,
};
use crate::entities::{EntityDir, EntityIndex, EntityPool};
use crate::math::{rects_overlap, vec2, Vec2f, Vec2i};
use crate::projectiles::{Projectile, ProjectileHandle, ProjectilePool, ProjectileState};
use crate::room::{RoomIndex, RoomRow, Tile};

pub const PLAYER: EntityIndex = EntityIndex(PLAYER_ENTITY_INDEX);

pub fn enemy_index(i: usize) -> EntityIndex {
    EntityIndex(ENEMY_ENTITY_INDEX_OFFSET + i)
}

// ── Input intents ─────────────────────────────────────────────────────────────

/// Discrete inputs the frame driver translates raw events into.
/// Mouse positions are in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Intent {
    MoveLeft,
    MoveRight,
    Stop,
    JumpDown,
    JumpUp,
    Shoot,
    Reset,
    ToggleDebug,
    ToggleStepDebug,
    StepOnce,
    MouseMove(Vec2f),
    MouseDown(Vec2f),
    MouseUp(Vec2f),
    /// Seed a debug BFS at the tile under the position.
    TraceBfs(Vec2f),
    Quit,
}

/// What a mouse drag does to the tiles it passes over.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DebugDrawState {
    #[default]
    Idle,
    Create,
    Delete,
}

/// Sample handles owned by the frontend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Samples {
    pub jump: Sample,
    pub shoot: Sample,
}

// ── Master game state ─────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct GameState {
    pub config: Config,
    pub gravity: Vec2f,
    pub quit: bool,
    pub debug: bool,
    pub step_debug: bool,
    pub collision_probe: Vec2f,
    pub mouse_position: Vec2f,
    pub debug_draw_state: DebugDrawState,
    /// Weak reference; resolve through `tracked_projectile`.
    pub tracking_projectile: Option<ProjectileHandle>,
    pub rooms: RoomRow,
    pub entities: EntityPool,
    pub projectiles: ProjectilePool,
    pub camera: Camera,
    pub walking: Rc<Animat>,
    pub idle: Rc<Animat>,
    pub samples: Samples,
    /// Room holding the last debug BFS trace.
    pub bfs_room: Option<RoomIndex>,
}

/// Fresh session: floored rooms, player and enemies spawned, no projectiles.
pub fn init_state(config: Config, samples: Samples) -> GameState {
    let animats = config.animats.clone();
    let mut state = GameState {
        gravity: config.gravity,
        quit: false,
        debug: false,
        step_debug: false,
        collision_probe: Vec2f::default(),
        mouse_position: Vec2f::default(),
        debug_draw_state: DebugDrawState::Idle,
        tracking_projectile: None,
        rooms: RoomRow::with_floors(),
        entities: EntityPool::new(&config),
        projectiles: ProjectilePool::init(animats.plasma_bolt, animats.plasma_pop, &config),
        camera: Camera::default(),
        walking: Rc::new(animats.walking),
        idle: Rc::new(animats.idle),
        samples,
        bfs_room: None,
        config,
    };
    reset_entities(&mut state);
    state
}

/// Respawns the player in room 0 and the enemies along the top row of it,
/// alternating their facing.
pub fn reset_entities(state: &mut GameState) {
    let walking = &state.walking;
    let idle = &state.idle;
    state
        .entities
        .spawn(PLAYER, Rc::clone(walking), Rc::clone(idle), None, None);

    for i in 0..ENEMY_COUNT {
        let pos = vec2((ROOM_WIDTH - 2 - i) as f32, 0.0) * TILE_SIZE;
        let dir = if i % 2 == 1 {
            EntityDir::Left
        } else {
            EntityDir::Right
        };
        state.entities.spawn(
            enemy_index(i),
            Rc::clone(walking),
            Rc::clone(idle),
            Some(pos),
            Some(dir),
        );
    }
    log::debug!("entities reset");
}

impl GameState {
    pub fn player_pos(&self) -> Vec2f {
        self.entities.entity(PLAYER).pos
    }

    /// Re-centre the camera on the player for a viewport given in world units.
    pub fn follow_player(&mut self, viewport: Vec2f) {
        let target = self.player_pos();
        self.camera.follow(target, viewport);
    }

    /// The tracked projectile, if its slot still holds the projectile that
    /// was picked.
    pub fn tracked_projectile(&self) -> Option<(ProjectileHandle, &Projectile)> {
        let handle = self.tracking_projectile?;
        self.projectiles.get(handle).map(|p| (handle, p))
    }

    /// Enemy awareness: whether `enemy` has an unobstructed line to the player.
    pub fn enemy_sees_player(&self, enemy: EntityIndex) -> bool {
        let e = self.entities.entity(enemy);
        let p = self.entities.entity(PLAYER);
        e.is_alive() && p.is_alive() && self.rooms.a_sees_b(e.pos, p.pos)
    }

    /// Seed the debug BFS at the tile under `world`.  Positions outside the
    /// room grid leave the previous trace alone.
    pub fn trace_bfs(&mut self, world: Vec2f) {
        let index = RoomRow::room_current(world);
        let room = self.rooms.room_mut(index);
        let src = room.local_tile(world);
        match room.bfs_to_tile(src) {
            Ok(()) => self.bfs_room = Some(index),
            Err(err) => log::warn!("bfs not traced: {}", err),
        }
    }

    /// Tiles from `world` back to the BFS source, both ends included, in
    /// room-local coordinates.  Empty if there is no trace or no path.
    pub fn bfs_path(&self, world: Vec2f) -> Vec<Vec2i> {
        let index = RoomRow::room_current(world);
        if self.bfs_room != Some(index) {
            return Vec::new();
        }

        let room = self.rooms.room(index);
        let mut current = room.local_tile(world);
        if room.bfs_trace_at(current) == 0 {
            return Vec::new();
        }

        let mut path = vec![current];
        while let Some(next) = room.next_in_bfs(current) {
            path.push(next);
            current = next;
            if path.len() > ROOM_WIDTH * ROOM_HEIGHT {
                break;
            }
        }
        path
    }

    /// Sets the tile under `world` if it lies inside the room under it.
    fn paint_tile(&mut self, world: Vec2f, tile: Tile) -> bool {
        let room = self.rooms.room_mut(RoomRow::room_current(world));
        let local = room.local_tile(world);
        room.set_tile(local, tile).is_ok()
    }
}

// ── Per-frame tick ────────────────────────────────────────────────────────────

/// Advance the simulation by one fixed step.  The order is fixed: enemies
/// try to shoot, entities move, projectiles move, then hits are resolved
/// against post-move positions.
pub fn update_game_state(state: &mut GameState, dt: f32) {
    for i in 0..ENEMY_COUNT {
        state.entities.shoot(enemy_index(i), &mut state.projectiles);
    }

    state.entities.update(state.gravity, dt, &state.rooms);
    state.projectiles.update(dt, &state.rooms);

    resolve_projectile_hits(&mut state.entities, &mut state.projectiles);

    if state.tracking_projectile.is_some() && state.tracked_projectile().is_none() {
        state.tracking_projectile = None;
    }
}

/// Every active projectile against every alive entity except its shooter.
/// A hit poofs the projectile and kills the entity.
pub fn resolve_projectile_hits(entities: &mut EntityPool, projectiles: &mut ProjectilePool) {
    for pi in 0..projectiles.watermark() {
        let projectile = projectiles.slot(pi);
        if projectile.state != ProjectileState::Active {
            continue;
        }
        let shooter = projectile.shooter;
        let hitbox = projectiles.hitbox(pi);

        for ei in 0..ENTITY_CAPACITY {
            let index = EntityIndex(ei);
            if index == shooter || !entities.entity(index).is_alive() {
                continue;
            }
            if rects_overlap(entities.hitbox_world(index), hitbox) {
                projectiles.poof(pi);
                entities.kill(index);
            }
        }
    }
}

/// Runs one tick unless single-step debugging holds the simulation.
pub fn run_fixed_step(state: &mut GameState) {
    if !state.step_debug {
        let dt = state.config.step_dt();
        update_game_state(state, dt);
    }
}

// ── Input-driven state transitions ────────────────────────────────────────────

pub fn handle_intent(state: &mut GameState, intent: Intent, mixer: &dyn SampleMixer) {
    match intent {
        Intent::MoveLeft => {
            let speed = state.config.player_speed;
            state.entities.move_entity(PLAYER, -speed);
        }
        Intent::MoveRight => {
            let speed = state.config.player_speed;
            state.entities.move_entity(PLAYER, speed);
        }
        Intent::Stop => state.entities.stop(PLAYER),
        Intent::JumpDown => {
            state
                .entities
                .jump(PLAYER, state.gravity, mixer, state.samples.jump);
        }
        Intent::JumpUp => state.entities.release_jump(PLAYER),
        Intent::Shoot => {
            if state.entities.shoot(PLAYER, &mut state.projectiles).is_some() {
                mixer.play_sample(state.samples.shoot);
            }
        }
        Intent::Reset => reset_entities(state),
        Intent::ToggleDebug => state.debug = !state.debug,
        Intent::ToggleStepDebug => state.step_debug = !state.step_debug,
        Intent::StepOnce => {
            if state.step_debug {
                let dt = state.config.step_dt();
                update_game_state(state, dt);
            }
        }
        Intent::MouseMove(pos) => {
            state.mouse_position = pos;
            state.collision_probe = pos;
            state.rooms.resolve_point_collision(&mut state.collision_probe);

            match state.debug_draw_state {
                DebugDrawState::Create => {
                    state.paint_tile(pos, Tile::Wall);
                }
                DebugDrawState::Delete => {
                    state.paint_tile(pos, Tile::Empty);
                }
                DebugDrawState::Idle => {}
            }
        }
        Intent::MouseDown(pos) => {
            state.mouse_position = pos;
            if !state.debug {
                return;
            }

            state.tracking_projectile = state.projectiles.projectile_at_position(pos);
            if state.tracking_projectile.is_some() {
                return;
            }

            let room = state.rooms.room(RoomRow::room_current(pos));
            match room.tile_at(room.local_tile(pos)) {
                Ok(Tile::Empty) => {
                    state.debug_draw_state = DebugDrawState::Create;
                    state.paint_tile(pos, Tile::Wall);
                }
                Ok(Tile::Wall) => {
                    state.debug_draw_state = DebugDrawState::Delete;
                    state.paint_tile(pos, Tile::Empty);
                }
                Err(err) => log::warn!("editor click ignored: {}", err),
            }
        }
        Intent::MouseUp(pos) => {
            state.mouse_position = pos;
            state.debug_draw_state = DebugDrawState::Idle;
        }
        Intent::TraceBfs(pos) => state.trace_bfs(pos),
        Intent::Quit => state.quit = true,
    }
}
