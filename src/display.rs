/// Rendering layer.  All terminal output lives here.
///
/// The library hands us world-space `Drawable`s; this module rasterises
/// them into a cell buffer through the camera and flushes the buffer with
/// crossterm.  No game logic is performed here.

use std::io::Write;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal,
    QueueableCommand,
};
use something::camera::Camera;
use something::compute::GameState;
use something::config::TILE_SIZE;
use something::math::{vec2, Rectf, Vec2f};
use something::render::{collect_drawables, debug_hud, DebugColor, Drawable, SpriteKind};

/// World units covered by one terminal cell.  A tile is 4 × 2 cells.
pub const CELL_W: f32 = TILE_SIZE / 4.0;
pub const CELL_H: f32 = TILE_SIZE / 2.0;

// ── Colour palette ────────────────────────────────────────────────────────────

const C_TILE: Color = Color::Grey;
const C_TILE_DIM: Color = Color::DarkGrey;
const C_PLAYER: Color = Color::White;
const C_ENEMY: Color = Color::Red;
const C_BOLT: Color = Color::Cyan;
const C_POOF: Color = Color::Magenta;
const C_HINT: Color = Color::DarkGrey;

fn debug_color(c: DebugColor) -> Color {
    match c {
        DebugColor::Red => Color::Red,
        DebugColor::Yellow => Color::Yellow,
        DebugColor::Cyan => Color::Cyan,
        DebugColor::Green => Color::Green,
    }
}

// ── Coordinate helpers ────────────────────────────────────────────────────────

/// Viewport size in world units for a terminal of `cols × rows` cells.
pub fn viewport(cols: u16, rows: u16) -> Vec2f {
    vec2(cols as f32 * CELL_W, rows as f32 * CELL_H)
}

/// World position under the centre of a terminal cell.
pub fn cell_to_world(camera: &Camera, col: u16, row: u16) -> Vec2f {
    camera.to_world(vec2(
        (col as f32 + 0.5) * CELL_W,
        (row as f32 + 0.5) * CELL_H,
    ))
}

// ── Cell buffer ───────────────────────────────────────────────────────────────

struct Canvas {
    cols: usize,
    rows: usize,
    cells: Vec<(char, Color)>,
}

impl Canvas {
    fn new(cols: u16, rows: u16) -> Canvas {
        Canvas {
            cols: cols as usize,
            rows: rows as usize,
            cells: vec![(' ', Color::Reset); cols as usize * rows as usize],
        }
    }

    fn put(&mut self, col: i32, row: i32, ch: char, color: Color) {
        if col >= 0 && row >= 0 && (col as usize) < self.cols && (row as usize) < self.rows {
            self.cells[row as usize * self.cols + col as usize] = (ch, color);
        }
    }

    fn text(&mut self, col: i32, row: i32, text: &str, color: Color) {
        for (i, ch) in text.chars().enumerate() {
            self.put(col + i as i32, row, ch, color);
        }
    }

    /// Screen-space rect → inclusive cell range.
    fn cell_span(r: Rectf) -> (i32, i32, i32, i32) {
        let c0 = (r.x / CELL_W).floor() as i32;
        let r0 = (r.y / CELL_H).floor() as i32;
        let c1 = ((r.right() - 0.01) / CELL_W).floor() as i32;
        let r1 = ((r.bottom() - 0.01) / CELL_H).floor() as i32;
        (c0, r0, c1.max(c0), r1.max(r0))
    }

    fn fill(&mut self, r: Rectf, ch: char, color: Color) {
        let (c0, r0, c1, r1) = Canvas::cell_span(r);
        for row in r0..=r1 {
            for col in c0..=c1 {
                self.put(col, row, ch, color);
            }
        }
    }

    fn outline(&mut self, r: Rectf, color: Color) {
        let (c0, r0, c1, r1) = Canvas::cell_span(r);
        for col in c0..=c1 {
            self.put(col, r0, '─', color);
            self.put(col, r1, '─', color);
        }
        for row in r0..=r1 {
            self.put(c0, row, '│', color);
            self.put(c1, row, '│', color);
        }
    }

    fn line(&mut self, from: Vec2f, to: Vec2f, color: Color) {
        let steps = ((to - from).len() / (CELL_W * 0.5)).ceil().max(1.0) as i32;
        for i in 0..=steps {
            let p = from + (to - from) * (i as f32 / steps as f32);
            self.put(
                (p.x / CELL_W).floor() as i32,
                (p.y / CELL_H).floor() as i32,
                '·',
                color,
            );
        }
    }

    fn flush<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        for row in 0..self.rows {
            out.queue(cursor::MoveTo(0, row as u16))?;
            let mut current = None;
            for col in 0..self.cols {
                let (ch, color) = self.cells[row * self.cols + col];
                if current != Some(color) {
                    out.queue(style::SetForegroundColor(color))?;
                    current = Some(color);
                }
                out.queue(Print(ch))?;
            }
        }
        Ok(())
    }
}

// ── Public entry point ────────────────────────────────────────────────────────

/// Render one complete frame.  The camera must already follow the player.
pub fn render<W: Write>(out: &mut W, state: &GameState, cols: u16, rows: u16) -> std::io::Result<()> {
    let mut canvas = Canvas::new(cols, rows);
    let camera = &state.camera;

    for drawable in collect_drawables(state) {
        draw(&mut canvas, camera, drawable);
    }

    if state.debug {
        draw_hud(&mut canvas, state);
    }
    draw_controls_hint(&mut canvas, rows);

    out.queue(terminal::Clear(terminal::ClearType::All))?;
    canvas.flush(out)?;
    out.queue(style::ResetColor)?;
    out.queue(cursor::MoveTo(0, rows.saturating_sub(1)))?;
    out.flush()?;
    Ok(())
}

fn draw(canvas: &mut Canvas, camera: &Camera, drawable: Drawable<'_>) {
    match drawable {
        Drawable::Tile { rect, dimmed } => {
            let color = if dimmed { C_TILE_DIM } else { C_TILE };
            canvas.fill(camera.rect_to_screen(rect), '█', color);
        }
        Drawable::Sprite { rect, kind, frame, flipped, .. } => {
            let screen = camera.rect_to_screen(rect);
            match kind {
                SpriteKind::Player => canvas.fill(screen, if flipped { '◄' } else { '►' }, C_PLAYER),
                SpriteKind::Enemy => canvas.fill(screen, if flipped { 'ᗕ' } else { 'ᗒ' }, C_ENEMY),
                SpriteKind::Projectile => {
                    let c = screen.center();
                    canvas.put((c.x / CELL_W).floor() as i32, (c.y / CELL_H).floor() as i32, '-', C_BOLT);
                }
                SpriteKind::Poof => {
                    let c = screen.center();
                    let glyph = ['*', '+', '.', ' '][frame.min(3)];
                    canvas.put((c.x / CELL_W).floor() as i32, (c.y / CELL_H).floor() as i32, glyph, C_POOF);
                }
            }
        }
        Drawable::DebugRect { rect, color, filled } => {
            let screen = camera.rect_to_screen(rect);
            if filled {
                canvas.fill(screen, '▓', debug_color(color));
            } else {
                canvas.outline(screen, debug_color(color));
            }
        }
        Drawable::DebugLine { from, to, color } => {
            canvas.line(camera.to_screen(from), camera.to_screen(to), debug_color(color));
        }
        Drawable::DebugLabel { at, text, color } => {
            let p = camera.to_screen(at);
            canvas.text(
                (p.x / CELL_W).floor() as i32,
                (p.y / CELL_H).floor() as i32,
                &text,
                debug_color(color),
            );
        }
    }
}

// ── HUD ───────────────────────────────────────────────────────────────────────

const SECOND_COLUMN: i32 = 44;

fn draw_hud(canvas: &mut Canvas, state: &GameState) {
    let (general, tracked) = debug_hud(state);
    for (i, line) in general.iter().enumerate() {
        canvas.text(1, i as i32, line, Color::Red);
    }
    for (i, line) in tracked.iter().enumerate() {
        canvas.text(SECOND_COLUMN, i as i32, line, Color::Yellow);
    }
}

fn draw_controls_hint(canvas: &mut Canvas, rows: u16) {
    let hint = "A D : Move  SPACE : Jump  E : Shoot  R : Reset  Q : Debug  Z/X : Step  B : BFS  S/L : Save/Load  ESC : Quit";
    canvas.text(1, rows as i32 - 1, hint, C_HINT);
}
