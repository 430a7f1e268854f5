/// Tile rooms laid out in a single horizontal row.
///
/// World space has its origin at the top-left corner of room 0.  Room `i`
/// covers tile columns `i * ROOM_WIDTH .. (i + 1) * ROOM_WIDTH` and tile
/// rows `0 .. ROOM_HEIGHT`; a world position maps to a tile by dividing by
/// `TILE_SIZE` and to a room by dividing the tile column by `ROOM_WIDTH`.
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::config::{ROOM_HEIGHT, ROOM_ROW_COUNT, ROOM_WIDTH, TILE_SIZE};
use crate::error::{GameError, Result};
use crate::math::{rect, sqr_dist, vec2, Rect, Rectf, Vec2f, Vec2i};

pub const ROOM_BOUNDARY: Rectf = Rect {
    x: 0.0,
    y: 0.0,
    w: ROOM_WIDTH as f32 * TILE_SIZE,
    h: ROOM_HEIGHT as f32 * TILE_SIZE,
};

/// Number of tile bytes in a room file.
pub const ROOM_FILE_LEN: usize = ROOM_WIDTH * ROOM_HEIGHT;

/// Nudge applied when a point is pushed out across a left/top tile edge,
/// so it ends up inside the neighbouring tile instead of on its boundary.
const EDGE_NUDGE: f32 = 1e-3;

/// Cardinal neighbours in the order they are probed.
const CARDINALS: [Vec2i; 4] = [vec2(0, -1), vec2(-1, 0), vec2(1, 0), vec2(0, 1)];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tile {
    #[default]
    Empty = 0,
    Wall = 1,
}

impl Tile {
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    pub fn from_byte(byte: u8) -> Result<Tile> {
        match byte {
            0 => Ok(Tile::Empty),
            1 => Ok(Tile::Wall),
            other => Err(GameError::InvalidTile(other)),
        }
    }

    pub fn is_empty(self) -> bool {
        self == Tile::Empty
    }
}

pub type TileArray = [[Tile; ROOM_WIDTH]; ROOM_HEIGHT];
pub type BfsTrace = [[u32; ROOM_WIDTH]; ROOM_HEIGHT];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomIndex(pub usize);

// ── Room ──────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct Room {
    /// Indexed `[row][col]`, origin top-left.
    pub tiles: TileArray,
    /// Tile coordinate of the top-left tile in world tile space.
    pub coord: Vec2i,
    /// World position of the top-left corner.
    pub position: Vec2f,
    /// `1 + distance` from the last BFS source; 0 means unvisited.
    pub bfs_trace: BfsTrace,
}

impl Room {
    pub fn new(index: RoomIndex) -> Room {
        Room {
            tiles: [[Tile::Empty; ROOM_WIDTH]; ROOM_HEIGHT],
            coord: vec2((index.0 * ROOM_WIDTH) as i32, 0),
            position: vec2(index.0 as f32 * ROOM_BOUNDARY.w, 0.0),
            bfs_trace: [[0; ROOM_WIDTH]; ROOM_HEIGHT],
        }
    }

    pub fn center(&self) -> Vec2f {
        let top_left = self.coord.as_f32() * TILE_SIZE;
        let bottom_right =
            (self.coord.as_f32() + vec2(ROOM_WIDTH as f32, ROOM_HEIGHT as f32)) * TILE_SIZE;
        vec2(
            (top_left.x + bottom_right.x) * 0.5,
            (top_left.y + bottom_right.y) * 0.5,
        )
    }

    pub fn boundary(&self) -> Rectf {
        ROOM_BOUNDARY + self.position
    }

    pub fn is_tile_inbounds(p: Vec2i) -> bool {
        0 <= p.x && p.x < ROOM_WIDTH as i32 && 0 <= p.y && p.y < ROOM_HEIGHT as i32
    }

    /// Local tile under a world position.  May be out of bounds.
    pub fn local_tile(&self, world: Vec2f) -> Vec2i {
        ((world - self.position) / TILE_SIZE).floor_to_i32()
    }

    pub fn tile_at(&self, p: Vec2i) -> Result<Tile> {
        if !Room::is_tile_inbounds(p) {
            return Err(GameError::OutOfBounds { x: p.x, y: p.y });
        }
        Ok(self.tiles[p.y as usize][p.x as usize])
    }

    pub fn set_tile(&mut self, p: Vec2i, tile: Tile) -> Result<()> {
        if !Room::is_tile_inbounds(p) {
            return Err(GameError::OutOfBounds { x: p.x, y: p.y });
        }
        self.tiles[p.y as usize][p.x as usize] = tile;
        Ok(())
    }

    /// Out-of-bounds tiles are not empty: nothing can walk there.
    pub fn is_tile_empty(&self, p: Vec2i) -> bool {
        matches!(self.tile_at(p), Ok(Tile::Empty))
    }

    pub fn fill_with(&mut self, tile: Tile) {
        for row in self.tiles.iter_mut() {
            row.fill(tile);
        }
    }

    pub fn floor_at(&mut self, tile: Tile, row: usize) -> Result<()> {
        if row >= ROOM_HEIGHT {
            return Err(GameError::OutOfBounds { x: 0, y: row as i32 });
        }
        self.tiles[row].fill(tile);
        Ok(())
    }

    /// Copies the tiles of `other`; position and BFS trace stay.
    pub fn copy_from(&mut self, other: &Room) {
        self.tiles = other.tiles;
    }

    // ── Persistence ───────────────────────────────────────────────────────────

    /// One byte per tile, row-major, no header.
    pub fn dump_stream<W: Write>(&self, out: &mut W) -> Result<()> {
        let mut bytes = [0u8; ROOM_FILE_LEN];
        for (y, row) in self.tiles.iter().enumerate() {
            for (x, tile) in row.iter().enumerate() {
                bytes[y * ROOM_WIDTH + x] = tile.to_byte();
            }
        }
        out.write_all(&bytes)?;
        out.flush()?;
        Ok(())
    }

    /// Reads exactly `ROOM_FILE_LEN` tile bytes.  Any other length or an
    /// unknown tile value is rejected and the room is left untouched.
    /// At most one byte past the expected length is read, so an oversized
    /// stream reports `actual = ROOM_FILE_LEN + 1`.
    pub fn load_stream<R: Read>(&mut self, input: &mut R) -> Result<()> {
        let mut bytes = Vec::with_capacity(ROOM_FILE_LEN + 1);
        input
            .take(ROOM_FILE_LEN as u64 + 1)
            .read_to_end(&mut bytes)?;
        if bytes.len() != ROOM_FILE_LEN {
            return Err(GameError::CorruptRoomFile {
                expected: ROOM_FILE_LEN,
                actual: bytes.len(),
            });
        }

        let mut tiles = [[Tile::Empty; ROOM_WIDTH]; ROOM_HEIGHT];
        for (i, byte) in bytes.iter().enumerate() {
            tiles[i / ROOM_WIDTH][i % ROOM_WIDTH] = Tile::from_byte(*byte)?;
        }
        self.tiles = tiles;
        Ok(())
    }

    pub fn dump_file(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|source| GameError::FatalIo {
            action: "save room to",
            path: path.to_path_buf(),
            source,
        })?;
        self.dump_stream(&mut BufWriter::new(file))?;
        log::debug!("saved room {:?} to {}", self.coord, path.display());
        Ok(())
    }

    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let file = File::open(path).map_err(|source| GameError::FatalIo {
            action: "load room from",
            path: path.to_path_buf(),
            source,
        })?;
        self.load_stream(&mut BufReader::new(file))?;
        log::debug!("loaded room {:?} from {}", self.coord, path.display());
        Ok(())
    }

    // ── Pathfinding ───────────────────────────────────────────────────────────

    /// Cardinal BFS over empty tiles seeded at `src`.  Overwrites the whole
    /// trace; the result stays valid only until the tiles change.
    pub fn bfs_to_tile(&mut self, src: Vec2i) -> Result<()> {
        if !Room::is_tile_inbounds(src) {
            return Err(GameError::OutOfBounds { x: src.x, y: src.y });
        }

        self.bfs_trace = [[0; ROOM_WIDTH]; ROOM_HEIGHT];
        let mut queue: VecDeque<Vec2i> = VecDeque::with_capacity(ROOM_WIDTH * ROOM_HEIGHT);

        self.bfs_trace[src.y as usize][src.x as usize] = 1;
        queue.push_back(src);

        while let Some(p0) = queue.pop_front() {
            let next = self.bfs_trace[p0.y as usize][p0.x as usize] + 1;
            for d in CARDINALS {
                let p1 = p0 + d;
                if self.is_tile_empty(p1) && self.bfs_trace[p1.y as usize][p1.x as usize] == 0 {
                    self.bfs_trace[p1.y as usize][p1.x as usize] = next;
                    queue.push_back(p1);
                }
            }
        }
        Ok(())
    }

    /// 0 for unvisited or out-of-bounds tiles.
    pub fn bfs_trace_at(&self, p: Vec2i) -> u32 {
        if Room::is_tile_inbounds(p) {
            self.bfs_trace[p.y as usize][p.x as usize]
        } else {
            0
        }
    }

    /// Neighbour of `dst` one step closer to the last BFS source, if any.
    pub fn next_in_bfs(&self, dst: Vec2i) -> Option<Vec2i> {
        let here = self.bfs_trace_at(dst);
        if here == 0 {
            return None;
        }

        CARDINALS.iter().map(|&d| dst + d).find(|&p| {
            let there = self.bfs_trace_at(p);
            self.is_tile_empty(p) && there > 0 && there < here
        })
    }
}

// ── Room row ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct RoomRow {
    pub rooms: [Room; ROOM_ROW_COUNT],
}

impl Default for RoomRow {
    fn default() -> Self {
        RoomRow::new()
    }
}

impl RoomRow {
    /// All rooms empty, positioned side by side.
    pub fn new() -> RoomRow {
        RoomRow {
            rooms: std::array::from_fn(|i| Room::new(RoomIndex(i))),
        }
    }

    /// Startup layout: room `i` gets a wall floor at row `ROOM_HEIGHT - 1 - i`,
    /// so the ground steps up one tile per room.
    pub fn with_floors() -> RoomRow {
        let mut row = RoomRow::new();
        for (i, room) in row.rooms.iter_mut().enumerate() {
            room.tiles[ROOM_HEIGHT - 1 - i].fill(Tile::Wall);
        }
        row
    }

    pub fn room(&self, index: RoomIndex) -> &Room {
        &self.rooms[index.0]
    }

    pub fn room_mut(&mut self, index: RoomIndex) -> &mut Room {
        &mut self.rooms[index.0]
    }

    /// World rect covering every room.
    pub fn boundary(&self) -> Rectf {
        rect(
            vec2(0.0, 0.0),
            ROOM_BOUNDARY.w * ROOM_ROW_COUNT as f32,
            ROOM_BOUNDARY.h,
        )
    }

    /// Room the position belongs to, clamped to the row.
    pub fn room_current(pos: Vec2f) -> RoomIndex {
        let index = (pos.x / ROOM_BOUNDARY.w).floor();
        RoomIndex(index.clamp(0.0, (ROOM_ROW_COUNT - 1) as f32) as usize)
    }

    /// World tile coordinate → room and local tile, or `None` outside the row.
    pub fn locate_tile(abs: Vec2i) -> Option<(RoomIndex, Vec2i)> {
        let room = abs.x.div_euclid(ROOM_WIDTH as i32);
        if room < 0 || room >= ROOM_ROW_COUNT as i32 {
            return None;
        }
        let local = vec2(abs.x.rem_euclid(ROOM_WIDTH as i32), abs.y);
        if !Room::is_tile_inbounds(local) {
            return None;
        }
        Some((RoomIndex(room as usize), local))
    }

    pub fn abs_tile(world: Vec2f) -> Vec2i {
        (world / TILE_SIZE).floor_to_i32()
    }

    pub fn tile_at(&self, room: RoomIndex, x: i32, y: i32) -> Result<Tile> {
        match self.rooms.get(room.0) {
            Some(r) => r.tile_at(vec2(x, y)),
            None => Err(GameError::OutOfBounds {
                x: room.0 as i32 * ROOM_WIDTH as i32 + x,
                y,
            }),
        }
    }

    pub fn set_tile(&mut self, world: Vec2f, tile: Tile) -> Result<()> {
        let abs = RoomRow::abs_tile(world);
        let (index, local) =
            RoomRow::locate_tile(abs).ok_or(GameError::OutOfBounds { x: abs.x, y: abs.y })?;
        self.rooms[index.0].set_tile(local, tile)
    }

    pub fn tile_at_abs(&self, world: Vec2f) -> Option<Tile> {
        self.tile_at_tile(RoomRow::abs_tile(world))
    }

    pub fn tile_at_tile(&self, abs: Vec2i) -> Option<Tile> {
        RoomRow::locate_tile(abs).map(|(index, local)| {
            self.rooms[index.0].tiles[local.y as usize][local.x as usize]
        })
    }

    /// Positions outside the row count as empty.
    pub fn is_tile_empty_abs(&self, world: Vec2f) -> bool {
        self.tile_at_abs(world).map_or(true, Tile::is_empty)
    }

    /// Whether an entity may not occupy the tile.  Columns left and right of
    /// the row are solid so nothing walks off the ends; rows above and below
    /// are open.
    pub fn blocks(&self, abs: Vec2i) -> bool {
        let row_width = (ROOM_ROW_COUNT * ROOM_WIDTH) as i32;
        if abs.x < 0 || abs.x >= row_width {
            return true;
        }
        self.tile_at_tile(abs).map_or(false, |t| !t.is_empty())
    }

    /// Ray march from `a` to `b` in half-tile steps.  Samples can skip the
    /// corner of a tile the segment only clips.
    ///
    /// Only samples that can land inside the row are visited; everything
    /// outside it is empty.
    pub fn a_sees_b(&self, a: Vec2f, b: Vec2f) -> bool {
        let d = (b - a).normalize();
        let s = TILE_SIZE * 0.5;
        let len = sqr_dist(a, b).sqrt();
        let steps = (len / s).ceil() as u32;

        let Some((t0, t1)) = clip_ray(self.boundary(), a, d, len) else {
            return true;
        };
        let first = (t0 / s).floor().max(0.0) as u32;
        let last = ((t1 / s).ceil() as u32).saturating_add(1).min(steps);

        for i in first..last {
            let p = a + d * (s * i as f32);
            if !self.is_tile_empty_abs(p) {
                return false;
            }
        }
        true
    }

    /// Pushes a point that sits inside a solid tile out to the closest side
    /// or corner whose neighbouring tile is empty.
    pub fn resolve_point_collision(&self, p: &mut Vec2f) {
        let tile = RoomRow::abs_tile(*p);
        if self.tile_at_tile(tile).map_or(true, Tile::is_empty) {
            return;
        }

        let p0 = tile.as_f32() * TILE_SIZE;
        let p1 = (tile + vec2(1, 1)).as_f32() * TILE_SIZE;
        let left = p0.x - EDGE_NUDGE;
        let top = p0.y - EDGE_NUDGE;

        let candidates = [
            (vec2(-1, 0), vec2(left, p.y)),
            (vec2(1, 0), vec2(p1.x, p.y)),
            (vec2(0, -1), vec2(p.x, top)),
            (vec2(0, 1), vec2(p.x, p1.y)),
            (vec2(-1, -1), vec2(left, top)),
            (vec2(1, -1), vec2(p1.x, top)),
            (vec2(-1, 1), vec2(left, p1.y)),
            (vec2(1, 1), vec2(p1.x, p1.y)),
        ];

        let closest = candidates
            .iter()
            .filter(|(dir, _)| self.tile_at_tile(tile + *dir).map_or(true, Tile::is_empty))
            .min_by(|(_, a), (_, b)| sqr_dist(*p, *a).total_cmp(&sqr_dist(*p, *b)));

        if let Some((_, np)) = closest {
            *p = *np;
        }
    }

    // ── Swept collision ───────────────────────────────────────────────────────

    /// How far `hitbox` may move horizontally by `dx` before its leading edge
    /// meets a blocking tile.  The column the leading edge already touches
    /// is included, so a box embedded in a wall is pushed back out.
    pub fn sweep_x(&self, hitbox: Rectf, dx: f32) -> (f32, bool) {
        if dx == 0.0 {
            return (0.0, false);
        }
        let rows = tile_span(hitbox.y, hitbox.bottom());
        let column_blocked =
            |c: i32| (rows.0..=rows.1).any(|r| self.blocks(vec2(c, r)));

        if dx > 0.0 {
            let c0 = tile_of(hitbox.right() - EDGE_NUDGE);
            let c1 = tile_of(hitbox.right() + dx - EDGE_NUDGE);
            for c in c0..=c1 {
                if column_blocked(c) {
                    return (c as f32 * TILE_SIZE - hitbox.right(), true);
                }
            }
        } else {
            let c0 = tile_of(hitbox.x);
            let c1 = tile_of(hitbox.x + dx);
            for c in (c1..=c0).rev() {
                if column_blocked(c) {
                    return ((c + 1) as f32 * TILE_SIZE - hitbox.x, true);
                }
            }
        }
        (dx, false)
    }

    /// Vertical counterpart of [`RoomRow::sweep_x`].
    pub fn sweep_y(&self, hitbox: Rectf, dy: f32) -> (f32, bool) {
        if dy == 0.0 {
            return (0.0, false);
        }
        let cols = tile_span(hitbox.x, hitbox.right());
        let row_blocked = |r: i32| (cols.0..=cols.1).any(|c| self.blocks(vec2(c, r)));

        if dy > 0.0 {
            let r0 = tile_of(hitbox.bottom() - EDGE_NUDGE);
            let r1 = tile_of(hitbox.bottom() + dy - EDGE_NUDGE);
            for r in r0..=r1 {
                if row_blocked(r) {
                    return (r as f32 * TILE_SIZE - hitbox.bottom(), true);
                }
            }
        } else {
            let r0 = tile_of(hitbox.y);
            let r1 = tile_of(hitbox.y + dy);
            for r in (r1..=r0).rev() {
                if row_blocked(r) {
                    return ((r + 1) as f32 * TILE_SIZE - hitbox.y, true);
                }
            }
        }
        (dy, false)
    }
}

/// Parameter range `[t0, t1]` within `[0, len]` where `a + d * t` lies
/// inside `r`, or `None` if the ray misses it.
fn clip_ray(r: Rectf, a: Vec2f, d: Vec2f, len: f32) -> Option<(f32, f32)> {
    let mut t0 = 0.0f32;
    let mut t1 = len;
    for (origin, dir, lo, hi) in [(a.x, d.x, r.x, r.right()), (a.y, d.y, r.y, r.bottom())] {
        if dir == 0.0 {
            if origin < lo || origin > hi {
                return None;
            }
            continue;
        }
        let (ta, tb) = ((lo - origin) / dir, (hi - origin) / dir);
        t0 = t0.max(ta.min(tb));
        t1 = t1.min(ta.max(tb));
    }
    (t0 <= t1).then_some((t0, t1))
}

fn tile_of(coord: f32) -> i32 {
    (coord / TILE_SIZE).floor() as i32
}

/// Inclusive range of tiles a `[from, to)` interval covers.
fn tile_span(from: f32, to: f32) -> (i32, i32) {
    (tile_of(from), tile_of(to - EDGE_NUDGE).max(tile_of(from)))
}
