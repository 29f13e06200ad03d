/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Layout: row 0 is the status bar, map cell (x, y) is drawn at column
/// x-1 of row y, and a pending prompt takes the bottom row. A level
/// needs `width` columns and `height + 1` rows; a smaller terminal only
/// gets a notice.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::kind::{Behavior, Caps, Kind};
use crate::sim::game::{Game, Phase};
use crate::sim::world::World;

const STATUS_ROW: usize = 0;
const STATUS_FG: Color = Color::Black;
const STATUS_BG: Color = Color::Grey;
const PROMPT_FG: Color = Color::Black;
const PROMPT_BG: Color = Color::Yellow;
const TOO_SMALL: &str = "Terminal too small.";

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BLANK: Cell = Cell { ch: ' ', fg: Color::Reset, bg: Color::Reset };

    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell { ch: '\0', fg: Color::Magenta, bg: Color::Magenta };

    const fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    /// Paint a whole row, then write `s` at its start.
    fn bar(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', fg, bg));
        }
        self.put_str(0, y, s, fg, bg);
    }
}

// ── Composition (pure: game state → frame) ──

/// Does a terminal of `cols` x `rows` hold the level plus its status bar?
pub fn fits(cols: usize, rows: usize, world: &World) -> bool {
    cols >= world.width.max(0) as usize && rows > world.height.max(0) as usize
}

/// `[level|WxH] name ::` followed by ` sym(*energy)(XxY)` per player.
pub fn status_line(game: &Game) -> String {
    let w = &game.world;
    let mut line = format!("[{}|{}x{}] {} ::", game.level, w.width, w.height, game.level_name());
    for p in w.players(&game.catalog) {
        line.push_str(&format!(" {}(*{})({}x{})", p.symbol, p.energy, p.x, p.y));
    }
    line
}

fn kind_color(kind: &Kind) -> Color {
    let caps = kind.caps;
    match kind.behavior {
        Some(Behavior::Zombie) => return Color::Red,
        Some(Behavior::EarnEnergy) => return Color::Green,
        Some(Behavior::Finish) => return Color::Cyan,
        Some(Behavior::Cannon) => return Color::Magenta,
        Some(Behavior::Cannonball) => return Color::DarkRed,
        _ => {}
    }
    if caps.contains(Caps::PLAYER) {
        Color::Yellow
    } else if caps.contains(Caps::PUSHABLE) {
        Color::Blue
    } else if caps.contains(Caps::STICK) {
        Color::DarkYellow
    } else {
        Color::Reset
    }
}

fn compose(buf: &mut FrameBuffer, game: &Game) {
    buf.clear();
    let world = &game.world;

    if !fits(buf.width, buf.height, world) {
        buf.put_str(0, 0, TOO_SMALL, Color::Reset, Color::Reset);
        return;
    }

    buf.bar(STATUS_ROW, &status_line(game), STATUS_FG, STATUS_BG);

    for (_, b) in world.visible(&game.catalog) {
        if b.x < 1 || b.y < 1 {
            continue;
        }
        let kind = game.catalog.kind(b.kind);
        buf.set((b.x - 1) as usize, b.y as usize, Cell::new(kind.symbol, kind_color(kind), Color::Reset));
    }

    if let Phase::Prompt(prompt) = game.phase {
        let row = buf.height - 1;
        buf.bar(row, prompt.message(), PROMPT_FG, PROMPT_BG);
    }
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(self.writer, terminal::EnterAlternateScreen, cursor::Hide, Clear(ClearType::All))?;
        self.refresh_size(true);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    /// Whether the last rendered terminal size holds the level.
    pub fn fits(&self, world: &World) -> bool {
        fits(self.term_w, self.term_h, world)
    }

    pub fn render(&mut self, game: &Game) -> io::Result<()> {
        if self.refresh_size(false) {
            queue!(self.writer, ResetColor, Clear(ClearType::All))?;
        }

        compose(&mut self.front, game);
        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    /// Pick up terminal resizes. Returns true when a full repaint is due.
    fn refresh_size(&mut self, force: bool) -> bool {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        let (tw, th) = (tw as usize, th as usize);
        if !force && tw == self.term_w && th == self.term_h {
            return false;
        }
        self.term_w = tw;
        self.term_h = th;
        self.front.resize(tw, th);
        self.back.resize(tw, th);
        self.back.cells.fill(Cell::INVALID);
        true
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::Reset;
        let mut last_bg = Color::Reset;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, ResetColor)?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }

                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }
}
