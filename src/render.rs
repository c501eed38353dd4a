//! Terminal drawing. Only cells that changed since the last frame are
//! redrawn; a resize or a menu screen forces a full redraw.

use std::io::{self, Stdout, Write};

use crossterm::cursor::MoveTo;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::QueueableCommand;
use unicode_width::UnicodeWidthStr;

use crate::effects::TrailPoint;
use crate::game::{Game, Phase};
use crate::grid::Pos;
use crate::tile::Tile;

const CELL_W: usize = 2;
const HUD_ROWS: usize = 2;

#[derive(Clone, Copy, PartialEq)]
enum Glyph {
    Player,
    Hidden,
    Cursor,
    Trail,
    Tile(Tile),
}

#[derive(Clone, Copy, PartialEq)]
struct Cell {
    glyph: Glyph,
    color: Color,
}

pub struct Renderer {
    last: Vec<Cell>,
    last_hud: Vec<String>,
    last_footer: String,
    needs_full: bool,
    origin_x: u16,
    origin_y: u16,
}

impl Renderer {
    pub fn new(size: usize) -> Self {
        Self {
            last: vec![
                Cell {
                    glyph: Glyph::Tile(Tile::Grass),
                    color: Color::Reset,
                };
                size * size
            ],
            last_hud: Vec::new(),
            last_footer: String::new(),
            needs_full: true,
            origin_x: 0,
            origin_y: HUD_ROWS as u16,
        }
    }

    pub fn render(
        &mut self,
        stdout: &mut Stdout,
        game: &Game,
        now: u64,
        footer: &str,
        cursor: Option<Pos>,
    ) -> io::Result<()> {
        let size = game.grid.len();
        if self.last.len() != size * size {
            *self = Renderer::new(size);
        }
        let needed_h = (size + HUD_ROWS + 1) as u16;
        let needed_w = (size * CELL_W) as u16;

        stdout.queue(MoveTo(0, 0))?;

        let (term_w, term_h) = terminal::size()?;
        if term_w < needed_w || term_h < needed_h {
            stdout.queue(Clear(ClearType::All))?;
            let msg = format!(
                "Terminal too small. Need at least {}x{} (cols x rows). Current: {}x{}.",
                needed_w, needed_h, term_w, term_h
            );
            stdout.queue(Print(msg))?;
            stdout.flush()?;
            self.needs_full = true;
            return Ok(());
        }

        let origin_x = (term_w - needed_w) / 2;
        let origin_y = (term_h - needed_h) / 2 + HUD_ROWS as u16;
        if origin_x != self.origin_x || origin_y != self.origin_y {
            self.origin_x = origin_x;
            self.origin_y = origin_y;
            self.needs_full = true;
        }
        if self.needs_full {
            stdout.queue(Clear(ClearType::All))?;
        }

        let hud = hud_lines(game, now);
        for (row, line) in hud.iter().enumerate() {
            if self.needs_full || self.last_hud.get(row) != Some(line) {
                let y = self.origin_y - (HUD_ROWS - row) as u16;
                print_line(stdout, self.origin_x, y, line, Color::White)?;
            }
        }
        self.last_hud = hud;

        for y in 0..size {
            for x in 0..size {
                let cell = cell_for(game, Pos { x, y }, now, cursor);
                let idx = y * size + x;
                if self.needs_full || cell != self.last[idx] {
                    self.last[idx] = cell;
                    draw_cell(stdout, self, x, y, cell)?;
                }
            }
        }

        if self.needs_full || footer != self.last_footer {
            let y = self.origin_y + size as u16;
            print_line(stdout, self.origin_x, y, footer, Color::Yellow)?;
            self.last_footer = footer.to_string();
        }
        self.needs_full = false;

        stdout.flush()?;
        Ok(())
    }

    /// Full-screen text page (title, leaderboard, help).
    pub fn render_page(&mut self, stdout: &mut Stdout, lines: &[String]) -> io::Result<()> {
        stdout.queue(Clear(ClearType::All))?;
        for (row, line) in lines.iter().enumerate() {
            stdout.queue(MoveTo(2, row as u16 + 1))?;
            stdout.queue(Print(line))?;
        }
        stdout.flush()?;
        self.needs_full = true;
        Ok(())
    }
}

fn print_line(stdout: &mut Stdout, x: u16, y: u16, text: &str, color: Color) -> io::Result<()> {
    stdout.queue(MoveTo(x, y))?;
    stdout.queue(Clear(ClearType::UntilNewLine))?;
    stdout.queue(SetForegroundColor(color))?;
    stdout.queue(Print(text))?;
    stdout.queue(ResetColor)?;
    Ok(())
}

fn hud_lines(game: &Game, now: u64) -> Vec<String> {
    let counters = format!(
        "Level: {}  Score: {}  Time: {}  Keys: {}/{}  Delay: {}ms  (q to quit)",
        game.level,
        game.score,
        game.time_remaining,
        game.keys,
        game.keys_total(),
        game.player.move_delay
    );
    let mut parts: Vec<String> = game
        .statuses(now)
        .into_iter()
        .map(|(kind, secs)| format!("{} {}s", kind.label(), secs))
        .collect();
    for effect in &game.effects {
        match effect.remaining_secs(now) {
            Some(secs) => parts.push(format!("{} ({}s)", effect.name, secs)),
            None => parts.push(effect.name.clone()),
        }
    }
    let effects = if parts.is_empty() {
        "Effects: none".to_string()
    } else {
        format!("Effects: {}", parts.join(", "))
    };
    vec![counters, effects]
}

fn cell_for(game: &Game, pos: Pos, now: u64, cursor: Option<Pos>) -> Cell {
    if cursor == Some(pos) {
        return Cell {
            glyph: Glyph::Cursor,
            color: Color::White,
        };
    }
    if game.phase != Phase::Editor && pos == game.player.pos {
        if game.is_invisible(now) {
            return Cell {
                glyph: Glyph::Hidden,
                color: Color::DarkGrey,
            };
        }
        return Cell {
            glyph: Glyph::Player,
            color: Color::Yellow,
        };
    }
    if game.phase == Phase::Playing && game.grid[pos.y][pos.x] == Tile::Grass {
        if let Some(point) = game.trail.iter().rev().find(|p| p.pos == pos) {
            return Cell {
                glyph: Glyph::Trail,
                color: trail_color(point),
            };
        }
    }
    let tile = game.grid[pos.y][pos.x];
    let color = match tile {
        Tile::Wall => Color::DarkGrey,
        Tile::Grass => Color::Reset,
        Tile::Snow => Color::White,
        Tile::Water => Color::Blue,
        Tile::Stone => Color::Grey,
        Tile::Sand => Color::DarkYellow,
        Tile::Tree => Color::Green,
        Tile::Key => Color::Yellow,
        Tile::Exit => Color::DarkRed,
        Tile::Trap => Color::Magenta,
        Tile::Trigger => Color::Cyan,
        Tile::Powerup => Color::Yellow,
    };
    Cell {
        glyph: Glyph::Tile(tile),
        color,
    }
}

fn trail_color(point: &TrailPoint) -> Color {
    if point.speed_active {
        Color::Cyan
    } else if point.slowdown_active {
        Color::Red
    } else {
        Color::Blue
    }
}

pub fn tile_text(tile: Tile) -> &'static str {
    match tile {
        Tile::Wall => "██",
        Tile::Grass => "  ",
        Tile::Snow => "**",
        Tile::Water => "≈≈",
        Tile::Stone => "▒▒",
        Tile::Sand => "░░",
        Tile::Tree => "🌲",
        Tile::Key => "🔑",
        Tile::Exit => "🚪",
        Tile::Trap => "✖ ",
        Tile::Trigger => "? ",
        Tile::Powerup => "⚡",
    }
}

fn draw_cell(stdout: &mut Stdout, renderer: &Renderer, x: usize, y: usize, cell: Cell) -> io::Result<()> {
    let text = match cell.glyph {
        Glyph::Player => "😃",
        Glyph::Hidden => "··",
        Glyph::Cursor => "[]",
        Glyph::Trail => "• ",
        Glyph::Tile(tile) => tile_text(tile),
    };
    let x_pos = renderer.origin_x + (x * CELL_W) as u16;
    let y_pos = renderer.origin_y + y as u16;
    stdout.queue(MoveTo(x_pos, y_pos))?;
    stdout.queue(SetForegroundColor(cell.color))?;
    stdout.queue(Print(text))?;
    let w = UnicodeWidthStr::width(text);
    if w < CELL_W {
        for _ in 0..(CELL_W - w) {
            stdout.queue(Print(' '))?;
        }
    }
    stdout.queue(ResetColor)?;
    Ok(())
}
