/// Rendering boundary.
///
/// The core never draws.  It describes what is visible as a list of
/// `Drawable`s in world space; the frontend subtracts the camera offset and
/// turns them into whatever draw calls it has.
use crate::compute::{GameState, PLAYER};
use crate::config::{ROOM_HEIGHT, ROOM_ROW_COUNT, ROOM_WIDTH, TILE_SIZE};
use crate::entities::EntityDir;
use crate::math::{rect, vec2, Rectf, Vec2f, Vec2i};
use crate::projectiles::ProjectileState;
use crate::room::{Room, RoomIndex, RoomRow};

const COLLISION_PROBE_SIZE: f32 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DebugColor {
    Red,
    Yellow,
    Cyan,
    Green,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpriteKind {
    Player,
    Enemy,
    Projectile,
    Poof,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Drawable<'a> {
    /// A solid tile.  Neighbouring rooms are drawn dimmed.
    Tile { rect: Rectf, dimmed: bool },
    Sprite {
        rect: Rectf,
        kind: SpriteKind,
        animat: &'a str,
        frame: usize,
        flipped: bool,
    },
    DebugRect {
        rect: Rectf,
        color: DebugColor,
        filled: bool,
    },
    DebugLine {
        from: Vec2f,
        to: Vec2f,
        color: DebugColor,
    },
    DebugLabel {
        at: Vec2f,
        text: String,
        color: DebugColor,
    },
}

/// Everything visible this frame, back to front.  The debug overlay is
/// appended when debug mode is on.
pub fn collect_drawables(state: &GameState) -> Vec<Drawable<'_>> {
    let mut out = Vec::new();

    let current = RoomRow::room_current(state.player_pos());
    let first = current.0.saturating_sub(1);
    let last = (current.0 + 1).min(ROOM_ROW_COUNT - 1);
    for index in first..=last {
        push_room(&mut out, state.rooms.room(RoomIndex(index)), index != current.0);
    }

    for (index, entity) in state.entities.iter_alive() {
        out.push(Drawable::Sprite {
            rect: state.entities.texbox_world(index),
            kind: if index == PLAYER {
                SpriteKind::Player
            } else {
                SpriteKind::Enemy
            },
            animat: &entity.current_animat().name,
            frame: entity.animat.frame(entity.current_animat()),
            flipped: entity.dir == EntityDir::Left,
        });
    }

    let projectiles = &state.projectiles;
    for (index, projectile) in projectiles.iter_live() {
        let (kind, animat, cursor) = match projectile.state {
            ProjectileState::Poof => (SpriteKind::Poof, &projectiles.poof, projectile.poof_animat),
            _ => (SpriteKind::Projectile, &projectiles.bolt, projectile.bolt_animat),
        };
        out.push(Drawable::Sprite {
            rect: projectiles.hitbox(index),
            kind,
            animat: &animat.name,
            frame: cursor.frame(animat),
            flipped: projectile.vel.x < 0.0,
        });
    }

    if state.debug {
        out.extend(debug_overlay(state));
    }
    out
}

fn push_room(out: &mut Vec<Drawable<'_>>, room: &Room, dimmed: bool) {
    for (y, row) in room.tiles.iter().enumerate() {
        for (x, tile) in row.iter().enumerate() {
            if !tile.is_empty() {
                out.push(Drawable::Tile {
                    rect: tile_rect(room, vec2(x as i32, y as i32)),
                    dimmed,
                });
            }
        }
    }
}

fn tile_rect(room: &Room, local: Vec2i) -> Rectf {
    rect(room.position + local.as_f32() * TILE_SIZE, TILE_SIZE, TILE_SIZE)
}

pub fn debug_overlay(state: &GameState) -> Vec<Drawable<'_>> {
    let mut out = Vec::new();

    out.push(Drawable::DebugRect {
        rect: Rectf::centered(
            state.collision_probe,
            vec2(COLLISION_PROBE_SIZE * 2.0, COLLISION_PROBE_SIZE * 2.0),
        ),
        color: DebugColor::Red,
        filled: true,
    });

    let mouse_room = state.rooms.room(RoomRow::room_current(state.mouse_position));
    out.push(Drawable::DebugRect {
        rect: mouse_room.boundary(),
        color: DebugColor::Red,
        filled: false,
    });

    for (index, _) in state.entities.iter_alive() {
        out.push(Drawable::DebugRect {
            rect: state.entities.texbox_world(index),
            color: DebugColor::Red,
            filled: false,
        });
        out.push(Drawable::DebugRect {
            rect: state.entities.hitbox_world(index),
            color: DebugColor::Yellow,
            filled: false,
        });
        if index != PLAYER && state.enemy_sees_player(index) {
            out.push(Drawable::DebugLine {
                from: state.entities.entity(index).pos,
                to: state.player_pos(),
                color: DebugColor::Green,
            });
        }
    }

    if let Some((handle, _)) = state.tracked_projectile() {
        out.push(Drawable::DebugRect {
            rect: state.projectiles.hitbox(handle.index),
            color: DebugColor::Yellow,
            filled: false,
        });
    }

    if let Some(index) = state.bfs_room {
        let room = state.rooms.room(index);
        for y in 0..ROOM_HEIGHT {
            for x in 0..ROOM_WIDTH {
                let trace = room.bfs_trace[y][x];
                if trace > 0 {
                    let r = tile_rect(room, vec2(x as i32, y as i32));
                    out.push(Drawable::DebugLabel {
                        at: r.center(),
                        text: (trace - 1).to_string(),
                        color: DebugColor::Cyan,
                    });
                }
            }
        }
        for tile in state.bfs_path(state.mouse_position) {
            out.push(Drawable::DebugRect {
                rect: tile_rect(room, tile),
                color: DebugColor::Green,
                filled: false,
            });
        }
    }

    match state.projectiles.projectile_at_position(state.mouse_position) {
        Some(handle) => out.push(Drawable::DebugRect {
            rect: state.projectiles.hitbox(handle.index),
            color: DebugColor::Yellow,
            filled: false,
        }),
        None => {
            let tile = RoomRow::abs_tile(state.mouse_position);
            out.push(Drawable::DebugRect {
                rect: rect(tile.as_f32() * TILE_SIZE, TILE_SIZE, TILE_SIZE),
                color: DebugColor::Red,
                filled: false,
            });
        }
    }

    out
}

/// Text lines of the debug HUD: the general column, then the tracked
/// projectile column (empty when nothing is tracked).
pub fn debug_hud(state: &GameState) -> (Vec<String>, Vec<String>) {
    let general = vec![
        format!(
            "Mouse Position: ({:.4}, {:.4})",
            state.mouse_position.x, state.mouse_position.y
        ),
        format!(
            "Collision Probe: ({:.4}, {:.4})",
            state.collision_probe.x, state.collision_probe.y
        ),
        format!("Projectiles: {}", state.projectiles.count_alive()),
        format!(
            "Step debug: {}",
            if state.step_debug { "on" } else { "off" }
        ),
    ];

    let tracked = match state.tracked_projectile() {
        Some((_, p)) => vec![
            format!("State: {}", p.state.as_str()),
            format!("Position: ({:.4}, {:.4})", p.pos.x, p.pos.y),
            format!("Velocity: ({:.4}, {:.4})", p.vel.x, p.vel.y),
            format!("Shooter Index: {}", p.shooter.0),
        ],
        None => Vec::new(),
    };

    (general, tracked)
}
