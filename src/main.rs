mod display;

use std::collections::HashMap;
use std::fs::File;
use std::io::{stdout, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context};
use clap::Parser;
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, KeyboardEnhancementFlags, MouseButton, MouseEvent, MouseEventKind,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    terminal, ExecutableCommand,
};
use something::audio::{ChannelMixer, Sample};
use something::compute::{handle_intent, init_state, run_fixed_step, GameState, Intent, Samples};
use something::config::{Config, ROOM_ROW_COUNT};
use something::room::{RoomIndex, RoomRow};

const JUMP_SAMPLE: Sample = Sample(0);
const SHOOT_SAMPLE: Sample = Sample(1);

/// A movement key counts as held if its last press/repeat event arrived
/// within this many frames.  Covers terminals that never report releases.
const HOLD_WINDOW: u64 = 8;

#[derive(Parser, Debug)]
#[command(name = "something", about = "Room-by-room platform shooter in the terminal")]
struct Args {
    /// RON file overriding the built-in tunables.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Load a room file at startup, as INDEX=PATH.  May be repeated.
    #[arg(long = "room", value_parser = parse_room_arg)]
    rooms: Vec<(usize, PathBuf)>,

    /// Directory the editor save/load keys use.
    #[arg(long, default_value = ".")]
    room_dir: PathBuf,

    #[arg(long, default_value = "something.log")]
    log_file: PathBuf,
}

fn parse_room_arg(s: &str) -> Result<(usize, PathBuf), String> {
    let (index, path) = s
        .split_once('=')
        .ok_or_else(|| format!("expected INDEX=PATH, got `{}`", s))?;
    let index: usize = index
        .parse()
        .map_err(|_| format!("`{}` is not a room index", index))?;
    if index >= ROOM_ROW_COUNT {
        return Err(format!("room index {} out of range 0..{}", index, ROOM_ROW_COUNT));
    }
    Ok((index, PathBuf::from(path)))
}

/// Returns true if `key` was seen within the last `HOLD_WINDOW` frames.
fn is_held(key_frame: &HashMap<KeyCode, u64>, key: &KeyCode, frame: u64) -> bool {
    key_frame
        .get(key)
        .map(|&last| frame.saturating_sub(last) <= HOLD_WINDOW)
        .unwrap_or(false)
}

fn room_file(room_dir: &Path, index: usize) -> PathBuf {
    room_dir.join(format!("room_{}.bin", index))
}

// ── Game loop ─────────────────────────────────────────────────────────────────

/// Runs until a quit intent arrives.
///
/// Edge-triggered keys become intents as their events arrive.  Movement is
/// level-triggered: every frame we look at which direction keys are still
/// "fresh" and emit MoveLeft / MoveRight / Stop.
fn game_loop<W: Write>(
    out: &mut W,
    state: &mut GameState,
    rx: &mpsc::Receiver<Event>,
    mixer: &ChannelMixer,
    room_dir: &Path,
) -> anyhow::Result<()> {
    let frame_time = Duration::from_secs_f32(state.config.step_dt());
    let mut key_frame: HashMap<KeyCode, u64> = HashMap::new();
    let mut frame: u64 = 0;

    while !state.quit {
        let frame_start = Instant::now();
        frame += 1;

        let (cols, rows) = terminal::size()?;
        state.follow_player(display::viewport(cols, rows));

        // ── Drain all pending input events (non-blocking) ─────────────────────
        while let Ok(ev) = rx.try_recv() {
            match ev {
                Event::Key(KeyEvent { code, kind, modifiers, .. }) => match kind {
                    KeyEventKind::Press => {
                        let repeat = key_frame.contains_key(&code);
                        key_frame.insert(code.clone(), frame);
                        match code {
                            KeyCode::Esc => handle_intent(state, Intent::Quit, mixer),
                            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                                handle_intent(state, Intent::Quit, mixer)
                            }
                            KeyCode::Char(' ') if !repeat => {
                                handle_intent(state, Intent::JumpDown, mixer)
                            }
                            KeyCode::Char('q') => handle_intent(state, Intent::ToggleDebug, mixer),
                            KeyCode::Char('z') => {
                                handle_intent(state, Intent::ToggleStepDebug, mixer)
                            }
                            KeyCode::Char('x') => handle_intent(state, Intent::StepOnce, mixer),
                            KeyCode::Char('e') => handle_intent(state, Intent::Shoot, mixer),
                            KeyCode::Char('r') => handle_intent(state, Intent::Reset, mixer),
                            KeyCode::Char('b') => {
                                let at = state.mouse_position;
                                handle_intent(state, Intent::TraceBfs(at), mixer)
                            }
                            KeyCode::Char('s') => save_room(state, room_dir),
                            KeyCode::Char('l') => load_room(state, room_dir),
                            _ => {}
                        }
                    }
                    KeyEventKind::Repeat => {
                        key_frame.insert(code.clone(), frame);
                    }
                    KeyEventKind::Release => {
                        key_frame.remove(&code);
                        if code == KeyCode::Char(' ') {
                            handle_intent(state, Intent::JumpUp, mixer);
                        }
                    }
                },
                Event::Mouse(MouseEvent { kind, column, row, .. }) => {
                    let at = display::cell_to_world(&state.camera, column, row);
                    let intent = match kind {
                        MouseEventKind::Moved | MouseEventKind::Drag(MouseButton::Left) => {
                            Some(Intent::MouseMove(at))
                        }
                        MouseEventKind::Down(MouseButton::Left) => Some(Intent::MouseDown(at)),
                        MouseEventKind::Up(MouseButton::Left) => Some(Intent::MouseUp(at)),
                        _ => None,
                    };
                    if let Some(intent) = intent {
                        handle_intent(state, intent, mixer);
                    }
                }
                _ => {}
            }
        }

        // Classic terminals only send presses; expire stale space presses so
        // the next one counts as a fresh key-down edge.
        key_frame.retain(|_, last| frame.saturating_sub(*last) <= HOLD_WINDOW);

        // ── Apply held-key movement every frame ───────────────────────────────
        let right = is_held(&key_frame, &KeyCode::Char('d'), frame)
            || is_held(&key_frame, &KeyCode::Right, frame);
        let left = is_held(&key_frame, &KeyCode::Char('a'), frame)
            || is_held(&key_frame, &KeyCode::Left, frame);
        let movement = if right {
            Intent::MoveRight
        } else if left {
            Intent::MoveLeft
        } else {
            Intent::Stop
        };
        handle_intent(state, movement, mixer);

        display::render(out, state, cols, rows)?;

        run_fixed_step(state);

        let elapsed = frame_start.elapsed();
        if elapsed < frame_time {
            thread::sleep(frame_time - elapsed);
        }
    }
    Ok(())
}

fn save_room(state: &GameState, room_dir: &Path) {
    let index = RoomRow::room_current(state.mouse_position);
    let path = room_file(room_dir, index.0);
    match state.rooms.room(index).dump_file(&path) {
        Ok(()) => log::info!("room {} saved to {}", index.0, path.display()),
        Err(err) => log::error!("{}", err),
    }
}

fn load_room(state: &mut GameState, room_dir: &Path) {
    let index = RoomRow::room_current(state.mouse_position);
    let path = room_file(room_dir, index.0);
    match state.rooms.room_mut(index).load_file(&path) {
        Ok(()) => log::info!("room {} loaded from {}", index.0, path.display()),
        Err(err) => log::error!("{}", err),
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn init_logging(path: &Path) -> anyhow::Result<()> {
    use env_logger::{Builder, Env, Target};

    let file = File::create(path)
        .with_context(|| format!("could not create log file `{}`", path.display()))?;
    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

/// Everything that can fail before the terminal is touched.
fn setup(args: &Args) -> anyhow::Result<GameState> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let mut state = init_state(
        config,
        Samples {
            jump: JUMP_SAMPLE,
            shoot: SHOOT_SAMPLE,
        },
    );

    for (index, path) in &args.rooms {
        state
            .rooms
            .room_mut(RoomIndex(*index))
            .load_file(path)?;
        log::info!("room {} loaded from {}", index, path.display());
    }
    Ok(state)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.log_file)?;

    let mut state = setup(&args).map_err(|err| {
        log::error!("{:#}", err);
        err
    })?;

    // The audio device is outside the core; a consumer thread stands in for
    // it and only logs what would be played.
    let (mixer, samples_rx) = ChannelMixer::new();
    thread::spawn(move || {
        for sample in samples_rx {
            log::debug!("play {:?}", sample);
        }
    });

    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;
    out.execute(EnableMouseCapture)?;

    // Request key-release events; terminals without the kitty protocol
    // fall back to presses only.
    let keyboard_enhanced = out
        .execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))
        .is_ok();

    // Dedicate a thread exclusively to blocking event reads, sending them
    // through a channel so the game loop never has to block on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || loop {
        match event::read() {
            Ok(ev) => {
                if tx.send(ev).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });

    let result = game_loop(&mut out, &mut state, &rx, &mixer, &args.room_dir);

    // Always restore the terminal
    if keyboard_enhanced {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    let _ = out.execute(DisableMouseCapture);
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result.map_err(|err| anyhow!("game loop failed: {:#}", err))
}
