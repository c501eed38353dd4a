use std::fs::{self, File};
use std::io::{self, Stdout};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{Local, SecondsFormat, Utc};
use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use env_logger::{Env, Target};
use log::{error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use keymaze::leaderboard::Leaderboard;
use keymaze::render::{tile_text, Renderer};
use keymaze::{Dir, Game, Phase, Pos, Settings, Tile};

/// Frontend-only state: things the game rules never look at.
struct Ui {
    message: Option<String>,
    name_input: String,
    cursor: Pos,
    palette: usize,
}

enum Flow {
    Continue,
    Quit,
}

struct Args {
    level_file: Option<String>,
    import: Option<String>,
}

fn main() -> io::Result<()> {
    let settings = Settings::from_env();
    init_logging(&settings);
    let args = parse_args(std::env::args().skip(1));

    let mut stdout = io::stdout();
    terminal::enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(Hide)?;

    let result = run(&mut stdout, &settings, &args);

    stdout.execute(Show)?;
    stdout.execute(LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;
    if let Err(err) = &result {
        error!("terminal error: {}", err);
    }
    result
}

fn init_logging(settings: &Settings) {
    // stderr belongs to the terminal UI, so logs only go to a file.
    let Some(path) = &settings.log_path else {
        return;
    };
    match File::create(path) {
        Ok(file) => {
            env_logger::Builder::from_env(Env::default().default_filter_or("info"))
                .target(Target::Pipe(Box::new(file)))
                .init();
        }
        Err(err) => eprintln!("cannot open log file {}: {}", path.display(), err),
    }
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Args {
    let mut parsed = Args {
        level_file: None,
        import: None,
    };
    while let Some(arg) = args.next() {
        if arg == "--import" {
            parsed.import = args.next();
        } else {
            parsed.level_file = Some(arg);
        }
    }
    parsed
}

fn run(stdout: &mut Stdout, settings: &Settings, args: &Args) -> io::Result<()> {
    let mut rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let clock = Instant::now();
    let now = || clock.elapsed().as_millis() as u64;

    let mut game = Game::new(&mut rng, settings.profile.tuning());
    let mut renderer = Renderer::new(game.size());
    let mut ui = Ui {
        message: None,
        name_input: String::new(),
        cursor: Pos::new(1, 1),
        palette: 0,
    };
    info!("starting with {:?}", settings);

    let mut leaderboard = match Leaderboard::load(&settings.leaderboard_path) {
        Ok(board) => board,
        Err(err) => {
            ui.message = Some(format!("Leaderboard not loaded: {}", err));
            Leaderboard::default()
        }
    };

    if let Some(path) = &args.import {
        ui.message = Some(match fs::read_to_string(path) {
            Ok(json) => match leaderboard.import(&json) {
                Ok(count) => {
                    save_leaderboard(&leaderboard, settings, &mut ui);
                    format!("Imported {} entries, duplicates removed.", count)
                }
                Err(err) => format!("Import failed: {}", err),
            },
            Err(err) => format!("Cannot read {}: {}", path, err),
        });
    }

    if let Some(path) = &args.level_file {
        let loaded = fs::read_to_string(path)
            .map_err(|err| err.to_string())
            .and_then(|json| game.load_level_file(&json).map_err(|err| err.to_string()));
        ui.message = Some(match loaded {
            Ok(file) => match game.test_level(now()) {
                Ok(()) => format!("Level \"{}\" loaded.", file.name),
                Err(err) => format!("Level \"{}\" loaded but not playable: {}", file.name, err),
            },
            Err(err) => format!("Cannot load {}: {}", path, err),
        });
    }

    let mut last_tick = Instant::now();
    let frame_time = Duration::from_micros(1_000_000 / settings.render_fps.max(1));

    loop {
        let frame_start = Instant::now();
        while event::poll(Duration::from_millis(0))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Release {
                    continue;
                }
                if let Flow::Quit =
                    handle_key(key, &mut game, &mut ui, &mut leaderboard, settings, &mut rng, now())
                {
                    return Ok(());
                }
            }
        }

        if last_tick.elapsed() >= Duration::from_millis(settings.tick_ms) {
            last_tick = Instant::now();
            game.update(now(), &mut rng);
        }

        if game.phase == Phase::Menu {
            renderer.render_page(stdout, &menu_lines(&leaderboard, &ui))?;
        } else {
            let footer = footer_text(&game, &ui, now());
            let cursor = (game.phase == Phase::Editor).then_some(ui.cursor);
            renderer.render(stdout, &game, now(), &footer, cursor)?;
        }

        let elapsed = frame_start.elapsed();
        if elapsed < frame_time {
            thread::sleep(frame_time - elapsed);
        }
    }
}

fn handle_key(
    key: KeyEvent,
    game: &mut Game,
    ui: &mut Ui,
    leaderboard: &mut Leaderboard,
    settings: &Settings,
    rng: &mut StdRng,
    now: u64,
) -> Flow {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && key.code == KeyCode::Char('c') {
        return Flow::Quit;
    }
    if let (KeyCode::Char(ch), false) = (key.code, ctrl) {
        if game.phase != Phase::GameOver {
            game.type_char(ch, now);
        }
    }

    match game.phase {
        Phase::Menu => match key.code {
            KeyCode::Char('q') => return Flow::Quit,
            KeyCode::Enter => {
                ui.message = None;
                game.start(now, rng);
            }
            KeyCode::F(9) => game.toggle_editor(),
            KeyCode::Char('x') => export_leaderboard(leaderboard, ui),
            KeyCode::Char('C') => {
                leaderboard.clear();
                save_leaderboard(leaderboard, settings, ui);
                ui.message = Some("Leaderboard cleared.".to_string());
            }
            _ => {}
        },
        Phase::Playing => {
            if ctrl && matches!(key.code, KeyCode::Char('s') | KeyCode::Char('S')) {
                let file = game.quick_save(&timestamp());
                write_level(&file, ui);
                return Flow::Continue;
            }
            // Taps and key repeat step once each; Shift+direction keeps running.
            if let Some(dir) = dir_for_key(key.code) {
                let run = key.modifiers.contains(KeyModifiers::SHIFT);
                game.set_held(run.then_some(dir));
                game.handle_move(dir, now, rng);
                return Flow::Continue;
            }
            match key.code {
                KeyCode::Char(' ') => game.set_held(None),
                KeyCode::Char('q') => return Flow::Quit,
                KeyCode::F(5) => game.regenerate_level(rng),
                KeyCode::F(6) => game.restart(now, rng),
                KeyCode::F(9) => game.toggle_editor(),
                KeyCode::Esc => game.phase = Phase::Menu,
                _ => {}
            }
        }
        Phase::Editor => handle_editor_key(key, game, ui, now),
        Phase::GameOver => match key.code {
            KeyCode::Enter => {
                let name = ui.name_input.trim().to_string();
                if name.is_empty() {
                    ui.message = Some("Please enter a name.".to_string());
                    return Flow::Continue;
                }
                let date = Local::now().format("%Y-%m-%d").to_string();
                leaderboard.add(game.leaderboard_entry(&name, &date));
                save_leaderboard(leaderboard, settings, ui);
                ui.name_input.clear();
                game.phase = Phase::Menu;
            }
            KeyCode::Esc => {
                ui.name_input.clear();
                game.phase = Phase::Menu;
            }
            KeyCode::Backspace => {
                ui.name_input.pop();
            }
            KeyCode::Char(ch) if !ctrl && ui.name_input.chars().count() < 20 => {
                ui.name_input.push(ch);
            }
            _ => {}
        },
    }
    Flow::Continue
}

fn handle_editor_key(key: KeyEvent, game: &mut Game, ui: &mut Ui, now: u64) {
    let size = game.size();
    match key.code {
        KeyCode::Up => ui.cursor.y = ui.cursor.y.saturating_sub(1),
        KeyCode::Down => ui.cursor.y = (ui.cursor.y + 1).min(size - 1),
        KeyCode::Left => ui.cursor.x = ui.cursor.x.saturating_sub(1),
        KeyCode::Right => ui.cursor.x = (ui.cursor.x + 1).min(size - 1),
        KeyCode::Tab => ui.palette = (ui.palette + 1) % Tile::ALL.len(),
        KeyCode::BackTab => ui.palette = (ui.palette + Tile::ALL.len() - 1) % Tile::ALL.len(),
        KeyCode::Char(' ') | KeyCode::Enter => {
            game.paint(ui.cursor, Tile::ALL[ui.palette]);
        }
        KeyCode::Delete => game.clear_level(),
        KeyCode::F(2) => {
            let file = game.to_level_file("custom", &timestamp());
            write_level(&file, ui);
        }
        KeyCode::F(3) => {
            ui.message = Some(match game.test_level(now) {
                Ok(()) => "Testing level.".to_string(),
                Err(err) => format!("Level is not valid: {}", err),
            });
        }
        KeyCode::F(9) | KeyCode::Esc => game.toggle_editor(),
        _ => {}
    }
}

fn dir_for_key(code: KeyCode) -> Option<Dir> {
    match code {
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Some(Dir::Up),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Some(Dir::Down),
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Some(Dir::Left),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Some(Dir::Right),
        _ => None,
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn write_level(file: &keymaze::level_file::LevelFile, ui: &mut Ui) {
    let written = file
        .to_json()
        .map_err(|err| err.to_string())
        .and_then(|json| fs::write(file.file_name(), json).map_err(|err| err.to_string()));
    ui.message = Some(match written {
        Ok(()) => format!("Level \"{}\" saved to {}.", file.name, file.file_name()),
        Err(err) => format!("Save failed: {}", err),
    });
}

fn save_leaderboard(leaderboard: &Leaderboard, settings: &Settings, ui: &mut Ui) {
    if let Err(err) = leaderboard.save(&settings.leaderboard_path) {
        ui.message = Some(format!("Leaderboard not saved: {}", err));
    }
}

fn export_leaderboard(leaderboard: &Leaderboard, ui: &mut Ui) {
    let path = format!("keymaze-leaderboard-{}.json", Local::now().format("%Y-%m-%d"));
    let exported = leaderboard
        .export(&timestamp())
        .map_err(|err| err.to_string())
        .and_then(|json| fs::write(&path, json).map_err(|err| err.to_string()));
    ui.message = Some(match exported {
        Ok(()) => format!("Leaderboard exported to {}.", path),
        Err(err) => format!("Export failed: {}", err),
    });
}

fn menu_lines(leaderboard: &Leaderboard, ui: &Ui) -> Vec<String> {
    let mut lines = vec![
        "KEYMAZE".to_string(),
        String::new(),
        "Collect every key, then reach the exit before time runs out.".to_string(),
        "Enter: play   F9: editor   x: export scores   C: clear scores   q: quit".to_string(),
        "In game: arrows/WASD move, Shift+direction run, Space stop".to_string(),
        "         F5 new map, F6 restart, Ctrl+S save level, Esc menu".to_string(),
        String::new(),
        "Leaderboard".to_string(),
    ];
    if leaderboard.entries().is_empty() {
        lines.push("  (no scores yet)".to_string());
    }
    for (idx, entry) in leaderboard.entries().iter().enumerate() {
        let grid = entry
            .grid_size
            .map(|size| format!(", grid {}", size))
            .unwrap_or_default();
        lines.push(format!(
            "  {:>2}. {:<20} {:>8} pts (level {}{}) {}",
            idx + 1,
            entry.name,
            entry.score,
            entry.level,
            grid,
            entry.date
        ));
    }
    if let Some(msg) = &ui.message {
        lines.push(String::new());
        lines.push(msg.clone());
    }
    lines
}

fn footer_text(game: &Game, ui: &Ui, now: u64) -> String {
    match game.phase {
        Phase::GameOver => format!(
            "Time's up! Final score {}. Name: {}_  (Enter save, Esc skip)",
            game.score, ui.name_input
        ),
        Phase::Editor => format!(
            "Editor: [{}] {}  Tab palette, Space paint, Del clear, F2 save, F3 test, Esc exit{}",
            tile_text(Tile::ALL[ui.palette]),
            Tile::ALL[ui.palette].name(),
            ui.message.as_deref().map(|m| format!("  | {}", m)).unwrap_or_default()
        ),
        _ => {
            if let Some(flash) = &game.flash {
                flash.text.clone()
            } else if game.portal_open(now) {
                "Key portal open!".to_string()
            } else {
                ui.message.clone().unwrap_or_default()
            }
        }
    }
}
