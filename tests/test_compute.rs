use std::cell::RefCell;

use something::audio::{Sample, SampleMixer, SilentMixer};
use something::compute::*;
use something::config::{Config, ENEMY_COUNT, ROOM_HEIGHT, TILE_SIZE};
use something::entities::{EntityIndex, DEFAULT_SPAWN_POS};
use something::math::{rects_overlap, vec2, Vec2f, Vec2i};
use something::projectiles::ProjectileState;
use something::render::{collect_drawables, debug_hud, Drawable, SpriteKind};
use something::room::{RoomIndex, Tile};

const DT: f32 = 1.0 / 60.0;
const JUMP: Sample = Sample(0);
const SHOOT: Sample = Sample(1);

#[derive(Default)]
struct RecordingMixer {
    played: RefCell<Vec<Sample>>,
}

impl SampleMixer for RecordingMixer {
    fn play_sample(&self, sample: Sample) {
        self.played.borrow_mut().push(sample);
    }
}

fn make_state() -> GameState {
    init_state(
        Config::default(),
        Samples {
            jump: JUMP,
            shoot: SHOOT,
        },
    )
}

/// A state where only the player is alive, standing on room 0's floor.
fn make_quiet_state(player_x: f32) -> GameState {
    let mut state = make_state();
    for i in 0..ENEMY_COUNT {
        state.entities.kill(enemy_index(i));
    }
    let player = state.entities.entity_mut(PLAYER);
    player.pos = on_floor(player_x);
    player.grounded = true;
    state
}

fn on_floor(x: f32) -> Vec2f {
    vec2(x, (ROOM_HEIGHT - 1) as f32 * TILE_SIZE - 48.0)
}

/// Centre of local tile `(x, y)` in room 0.
fn tile_center(x: i32, y: i32) -> Vec2f {
    vec2((x as f32 + 0.5) * TILE_SIZE, (y as f32 + 0.5) * TILE_SIZE)
}

fn tile(state: &GameState, x: i32, y: i32) -> Tile {
    state.rooms.tile_at(RoomIndex(0), x, y).unwrap()
}

// ── Init ──────────────────────────────────────────────────────────────────────

#[test]
fn init_spawns_player_and_enemies() {
    let state = make_state();
    assert_eq!(state.player_pos(), DEFAULT_SPAWN_POS);
    assert_eq!(state.entities.iter_alive().count(), 1 + ENEMY_COUNT);
    assert_eq!(state.projectiles.count_alive(), 0);
    assert!(!state.debug && !state.step_debug && !state.quit);

    for i in 0..ENEMY_COUNT {
        let e = state.entities.entity(enemy_index(i));
        assert_eq!(e.pos, vec2((8 - i) as f32 * TILE_SIZE, 0.0));
    }
    assert_eq!(tile(&state, 0, ROOM_HEIGHT as i32 - 1), Tile::Wall);
}

// ── Tick ──────────────────────────────────────────────────────────────────────

#[test]
fn enemies_shoot_at_start_of_tick() {
    let mut state = make_state();
    update_game_state(&mut state, DT);

    assert_eq!(state.projectiles.count_alive(), ENEMY_COUNT);
    assert_eq!(state.entities.iter_alive().count(), 1 + ENEMY_COUNT);
    let mut shooters: Vec<EntityIndex> = state
        .projectiles
        .iter_live()
        .map(|(_, p)| p.shooter)
        .collect();
    shooters.sort();
    let expected: Vec<EntityIndex> = (0..ENEMY_COUNT).map(enemy_index).collect();
    assert_eq!(shooters, expected);

    // Weapons are cooling down on the next tick.
    update_game_state(&mut state, DT);
    assert_eq!(state.projectiles.count_alive(), ENEMY_COUNT);
}

#[test]
fn hit_poofs_projectile_and_kills_target() {
    let mut state = make_quiet_state(640.0);

    // A bystander enemy and a bystander projectile, both well away from the hit.
    let bystander = enemy_index(0);
    state.entities.spawn(
        bystander,
        state.walking.clone(),
        state.idle.clone(),
        Some(on_floor(300.0)),
        None,
    );
    state.entities.entity_mut(bystander).cooldown_weapon = 10.0;
    let other = state
        .projectiles
        .spawn(tile_center(2, 2), Vec2f::default(), enemy_index(4))
        .unwrap();
    let bystander_before = state.entities.entity(bystander).clone();
    let other_before = *state.projectiles.get(other).unwrap();

    // One tick moves it 20 units, into the player's hitbox.
    let h = state
        .projectiles
        .spawn(vec2(580.0, on_floor(640.0).y), vec2(1200.0, 0.0), enemy_index(2))
        .unwrap();

    update_game_state(&mut state, DT);

    let p = state.projectiles.get(h).unwrap();
    assert_eq!(p.state, ProjectileState::Poof);
    assert_eq!(p.poof_animat.frame_current, 0);
    assert!(!state.entities.entity(PLAYER).is_alive());

    let e = state.entities.entity(bystander);
    assert_eq!(e.state, bystander_before.state);
    assert_eq!(e.pos, bystander_before.pos);
    assert_eq!(e.vel, bystander_before.vel);
    assert_eq!(e.dir, bystander_before.dir);

    let q = state.projectiles.get(other).unwrap();
    assert_eq!(q.state, ProjectileState::Active);
    assert_eq!(q.pos, other_before.pos);
    assert_eq!(q.vel, other_before.vel);
    assert_eq!(q.shooter, other_before.shooter);

    assert_eq!(state.projectiles.count_alive(), 2);
    assert_eq!(state.entities.iter_alive().count(), 1);
}

#[test]
fn shooter_is_never_hit_by_own_projectile() {
    let mut state = make_quiet_state(640.0);
    let target = enemy_index(0);
    state.entities.spawn(
        target,
        state.walking.clone(),
        state.idle.clone(),
        Some(on_floor(900.0)),
        None,
    );
    state.entities.entity_mut(target).cooldown_weapon = 10.0;

    // Flies right through the player on its way to the enemy.
    let h = state
        .projectiles
        .spawn(on_floor(400.0), vec2(600.0, 0.0), PLAYER)
        .unwrap();

    let mut passed_through_shooter = false;
    for _ in 0..60 {
        update_game_state(&mut state, DT);
        assert!(state.entities.entity(PLAYER).is_alive());

        let overlapping = rects_overlap(
            state.entities.hitbox_world(PLAYER),
            state.projectiles.hitbox(h.index),
        );
        if overlapping && state.projectiles.get(h).is_some() {
            passed_through_shooter = true;
            assert_eq!(state.projectiles.get(h).unwrap().state, ProjectileState::Active);
        }
    }

    assert!(passed_through_shooter);
    assert!(!state.entities.entity(target).is_alive());
    assert!(state.entities.entity(PLAYER).is_alive());
}

#[test]
fn dead_entities_are_not_hit() {
    let mut state = make_quiet_state(200.0);
    let target = enemy_index(0);
    state.entities.entity_mut(target).pos = on_floor(640.0);

    let h = state
        .projectiles
        .spawn(on_floor(640.0), Vec2f::default(), PLAYER)
        .unwrap();
    update_game_state(&mut state, DT);

    assert_eq!(state.projectiles.get(h).unwrap().state, ProjectileState::Active);
    assert_eq!(state.entities.entity(target).pos, on_floor(640.0));
}

#[test]
fn one_projectile_can_only_poof_once() {
    let mut state = make_quiet_state(640.0);
    let a = enemy_index(0);
    let b = enemy_index(1);
    state.entities.spawn(a, state.walking.clone(), state.idle.clone(), Some(on_floor(900.0)), None);
    state.entities.spawn(b, state.walking.clone(), state.idle.clone(), Some(on_floor(910.0)), None);
    state.entities.entity_mut(a).cooldown_weapon = 10.0;
    state.entities.entity_mut(b).cooldown_weapon = 10.0;

    let h = state
        .projectiles
        .spawn(on_floor(905.0), Vec2f::default(), PLAYER)
        .unwrap();
    update_game_state(&mut state, DT);

    let p = state.projectiles.get(h).unwrap();
    assert_eq!(p.state, ProjectileState::Poof);
    assert_eq!(p.poof_animat.frame_current, 0);
    // Both overlapping entities are hit in the same pass.
    assert!(!state.entities.entity(a).is_alive());
    assert!(!state.entities.entity(b).is_alive());
}

#[test]
fn tracked_handle_is_dropped_when_projectile_dies() {
    let mut state = make_quiet_state(200.0);
    handle_intent(&mut state, Intent::ToggleDebug, &SilentMixer);

    let h = state
        .projectiles
        .spawn(tile_center(3, 3), Vec2f::default(), enemy_index(0))
        .unwrap();
    handle_intent(&mut state, Intent::MouseDown(tile_center(3, 3)), &SilentMixer);
    assert_eq!(state.tracking_projectile, Some(h));
    assert!(state.tracked_projectile().is_some());

    state.projectiles.poof(h.index);
    for _ in 0..30 {
        update_game_state(&mut state, DT);
    }
    assert_eq!(state.tracking_projectile, None);
}

// ── Step debugging ────────────────────────────────────────────────────────────

#[test]
fn step_debug_holds_the_simulation() {
    let mut state = make_state();
    handle_intent(&mut state, Intent::ToggleStepDebug, &SilentMixer);

    run_fixed_step(&mut state);
    assert_eq!(state.projectiles.count_alive(), 0);
    assert_eq!(state.player_pos(), DEFAULT_SPAWN_POS);

    handle_intent(&mut state, Intent::StepOnce, &SilentMixer);
    assert_eq!(state.projectiles.count_alive(), ENEMY_COUNT);

    handle_intent(&mut state, Intent::ToggleStepDebug, &SilentMixer);
    run_fixed_step(&mut state);
    assert!(state.player_pos().y > DEFAULT_SPAWN_POS.y);
}

#[test]
fn step_once_needs_step_debug() {
    let mut state = make_state();
    handle_intent(&mut state, Intent::StepOnce, &SilentMixer);
    assert_eq!(state.projectiles.count_alive(), 0);
}

// ── Player intents ────────────────────────────────────────────────────────────

#[test]
fn movement_intents() {
    let mut state = make_quiet_state(640.0);
    let speed = state.config.player_speed;

    handle_intent(&mut state, Intent::MoveLeft, &SilentMixer);
    assert_eq!(state.entities.entity(PLAYER).vel.x, -speed);
    handle_intent(&mut state, Intent::MoveRight, &SilentMixer);
    assert_eq!(state.entities.entity(PLAYER).vel.x, speed);
    handle_intent(&mut state, Intent::Stop, &SilentMixer);
    assert_eq!(state.entities.entity(PLAYER).vel.x, 0.0);
}

#[test]
fn jump_intent_plays_sample_once() {
    let mut state = make_quiet_state(640.0);
    let mixer = RecordingMixer::default();

    handle_intent(&mut state, Intent::JumpDown, &mixer);
    let vy = state.entities.entity(PLAYER).vel.y;
    assert!(vy < 0.0);
    handle_intent(&mut state, Intent::JumpDown, &mixer);
    assert_eq!(*mixer.played.borrow(), vec![JUMP]);

    handle_intent(&mut state, Intent::JumpUp, &mixer);
    assert_eq!(state.entities.entity(PLAYER).vel.y, vy * state.config.jump_cut);
}

#[test]
fn shoot_intent_plays_sample_only_when_firing() {
    let mut state = make_quiet_state(640.0);
    let mixer = RecordingMixer::default();

    handle_intent(&mut state, Intent::Shoot, &mixer);
    handle_intent(&mut state, Intent::Shoot, &mixer);

    assert_eq!(state.projectiles.count_alive(), 1);
    assert_eq!(*mixer.played.borrow(), vec![SHOOT]);
    let (_, p) = state.projectiles.iter_live().next().unwrap();
    assert_eq!(p.shooter, PLAYER);
}

#[test]
fn reset_respawns_everyone() {
    let mut state = make_state();
    state.entities.kill(PLAYER);
    state.entities.kill(enemy_index(3));
    state.entities.entity_mut(enemy_index(0)).pos = vec2(5.0, 5.0);

    handle_intent(&mut state, Intent::Reset, &SilentMixer);

    assert_eq!(state.entities.iter_alive().count(), 1 + ENEMY_COUNT);
    assert_eq!(state.player_pos(), DEFAULT_SPAWN_POS);
    assert_eq!(
        state.entities.entity(enemy_index(0)).pos,
        vec2(8.0 * TILE_SIZE, 0.0)
    );
}

#[test]
fn quit_intent() {
    let mut state = make_state();
    handle_intent(&mut state, Intent::Quit, &SilentMixer);
    assert!(state.quit);
}

// ── Camera ────────────────────────────────────────────────────────────────────

#[test]
fn camera_centres_player() {
    let mut state = make_state();
    let viewport = vec2(800.0, 600.0);
    state.follow_player(viewport);

    assert_eq!(state.camera.pos, DEFAULT_SPAWN_POS - viewport * 0.5);
    assert_eq!(state.camera.to_screen(state.player_pos()), viewport * 0.5);
    assert_eq!(state.camera.to_world(viewport * 0.5), state.player_pos());
}

// ── Debug editor ──────────────────────────────────────────────────────────────

#[test]
fn mouse_move_updates_collision_probe() {
    let mut state = make_state();
    let inside_floor = vec2(704.0, (ROOM_HEIGHT - 1) as f32 * TILE_SIZE + 8.0);
    handle_intent(&mut state, Intent::MouseMove(inside_floor), &SilentMixer);

    assert_eq!(state.mouse_position, inside_floor);
    assert_eq!(state.collision_probe.x, 704.0);
    assert!(state.collision_probe.y < (ROOM_HEIGHT - 1) as f32 * TILE_SIZE);
}

#[test]
fn drag_paints_then_erases_walls() {
    let mut state = make_quiet_state(200.0);
    handle_intent(&mut state, Intent::ToggleDebug, &SilentMixer);

    handle_intent(&mut state, Intent::MouseDown(tile_center(3, 3)), &SilentMixer);
    assert_eq!(state.debug_draw_state, DebugDrawState::Create);
    handle_intent(&mut state, Intent::MouseMove(tile_center(4, 3)), &SilentMixer);
    handle_intent(&mut state, Intent::MouseUp(tile_center(4, 3)), &SilentMixer);
    handle_intent(&mut state, Intent::MouseMove(tile_center(5, 3)), &SilentMixer);

    assert_eq!(state.debug_draw_state, DebugDrawState::Idle);
    assert_eq!(tile(&state, 3, 3), Tile::Wall);
    assert_eq!(tile(&state, 4, 3), Tile::Wall);
    assert_eq!(tile(&state, 5, 3), Tile::Empty);

    handle_intent(&mut state, Intent::MouseDown(tile_center(3, 3)), &SilentMixer);
    assert_eq!(state.debug_draw_state, DebugDrawState::Delete);
    handle_intent(&mut state, Intent::MouseMove(tile_center(4, 3)), &SilentMixer);
    handle_intent(&mut state, Intent::MouseUp(tile_center(4, 3)), &SilentMixer);

    assert_eq!(tile(&state, 3, 3), Tile::Empty);
    assert_eq!(tile(&state, 4, 3), Tile::Empty);
}

#[test]
fn editor_is_off_outside_debug_mode() {
    let mut state = make_state();
    handle_intent(&mut state, Intent::MouseDown(tile_center(3, 3)), &SilentMixer);
    handle_intent(&mut state, Intent::MouseMove(tile_center(4, 3)), &SilentMixer);

    assert_eq!(state.debug_draw_state, DebugDrawState::Idle);
    assert_eq!(tile(&state, 3, 3), Tile::Empty);
    assert_eq!(tile(&state, 4, 3), Tile::Empty);
}

#[test]
fn click_on_projectile_tracks_instead_of_painting() {
    let mut state = make_quiet_state(200.0);
    handle_intent(&mut state, Intent::ToggleDebug, &SilentMixer);
    let h = state
        .projectiles
        .spawn(tile_center(3, 3), Vec2f::default(), enemy_index(1))
        .unwrap();

    handle_intent(
        &mut state,
        Intent::MouseDown(tile_center(3, 3) + vec2(2.0, 2.0)),
        &SilentMixer,
    );

    assert_eq!(state.tracking_projectile, Some(h));
    assert_eq!(state.debug_draw_state, DebugDrawState::Idle);
    assert_eq!(tile(&state, 3, 3), Tile::Empty);

    let (_, tracked) = debug_hud(&state);
    assert_eq!(tracked.len(), 4);
    assert_eq!(tracked[0], "State: Active");
    assert_eq!(tracked[3], format!("Shooter Index: {}", enemy_index(1).0));
}

// ── BFS hooks ─────────────────────────────────────────────────────────────────

#[test]
fn bfs_path_leads_back_to_source() {
    let mut state = make_state();
    handle_intent(&mut state, Intent::TraceBfs(tile_center(1, 1)), &SilentMixer);
    assert_eq!(state.bfs_room, Some(RoomIndex(0)));

    let expected: Vec<Vec2i> = vec![vec2(3, 1), vec2(2, 1), vec2(1, 1)];
    assert_eq!(state.bfs_path(tile_center(3, 1)), expected);

    // Other rooms have no trace.
    let room_w = 10.0 * TILE_SIZE;
    assert!(state.bfs_path(tile_center(3, 1) + vec2(room_w, 0.0)).is_empty());
}

#[test]
fn bfs_outside_the_grid_is_ignored() {
    let mut state = make_state();
    handle_intent(&mut state, Intent::TraceBfs(vec2(100.0, -50.0)), &SilentMixer);
    assert_eq!(state.bfs_room, None);
}

// ── Awareness ─────────────────────────────────────────────────────────────────

#[test]
fn enemy_sight_is_blocked_by_walls() {
    let mut state = make_quiet_state(200.0);
    let enemy = enemy_index(0);
    state
        .entities
        .spawn(enemy, state.walking.clone(), state.idle.clone(), Some(on_floor(900.0)), None);

    assert!(state.enemy_sees_player(enemy));

    state
        .rooms
        .set_tile(tile_center(4, ROOM_HEIGHT as i32 - 2), Tile::Wall)
        .unwrap();
    assert!(!state.enemy_sees_player(enemy));
    assert!(!state.enemy_sees_player(enemy_index(1)));
}

// ── Drawables ─────────────────────────────────────────────────────────────────

fn sprites(state: &GameState, kind: SpriteKind) -> usize {
    collect_drawables(state)
        .iter()
        .filter(|d| matches!(d, Drawable::Sprite { kind: k, .. } if *k == kind))
        .count()
}

#[test]
fn only_alive_entities_are_drawn() {
    let mut state = make_state();
    assert_eq!(sprites(&state, SpriteKind::Player), 1);
    assert_eq!(sprites(&state, SpriteKind::Enemy), ENEMY_COUNT);

    state.entities.kill(PLAYER);
    state.entities.kill(enemy_index(0));
    assert_eq!(sprites(&state, SpriteKind::Player), 0);
    assert_eq!(sprites(&state, SpriteKind::Enemy), ENEMY_COUNT - 1);
}

#[test]
fn overlay_only_in_debug_mode() {
    let mut state = make_state();
    let has_debug = |state: &GameState| {
        collect_drawables(state)
            .iter()
            .any(|d| matches!(d, Drawable::DebugRect { .. }))
    };
    assert!(!has_debug(&state));
    handle_intent(&mut state, Intent::ToggleDebug, &SilentMixer);
    assert!(has_debug(&state));
}

#[test]
fn projectiles_and_poofs_are_drawn() {
    let mut state = make_quiet_state(200.0);
    let a = state
        .projectiles
        .spawn(tile_center(3, 3), Vec2f::default(), PLAYER)
        .unwrap();
    state
        .projectiles
        .spawn(tile_center(5, 3), Vec2f::default(), PLAYER)
        .unwrap();
    state.projectiles.poof(a.index);

    assert_eq!(sprites(&state, SpriteKind::Projectile), 1);
    assert_eq!(sprites(&state, SpriteKind::Poof), 1);
}
