/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Every compose pass also records where the clickable parts landed, so a
/// mouse click can be resolved against exactly what is on screen.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::config::GalleryKind;
use crate::domain::carousel::Direction;
use crate::domain::content::{Persona, Rgb, CLICK_TO_ENTER, SELECT_HEADING};
use crate::sim::event::{ClickTarget, HitMap};
use crate::sim::world::{AppState, Screen};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: [u8; 4],
    ch_len: u8,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells.
    ///
    /// Using the same RGB for `Clear(ClearType::All)` and every blank cell
    /// keeps VTE terminals from showing lines between rows.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0, 0, 0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
    };

    /// Sentinel cell used to invalidate the back buffer.
    const INVALID: Cell = Cell {
        ch: [b'?', 0, 0, 0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
    };

    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        let len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.ch_len = len;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.ch[..self.ch_len as usize]).unwrap_or(" ")
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
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
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

    fn set(&mut self, x: i32, y: i32, cell: Cell) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.cells[y as usize * self.width + x as usize] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y); anything off-buffer is clipped.
    fn put_str(&mut self, x: i32, y: i32, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            self.set(x + i as i32, y, Cell::from_char(ch, fg, bg));
        }
    }

    fn fill(&mut self, x: i32, y: i32, w: usize, h: usize, bg: Color) {
        for dy in 0..h as i32 {
            for dx in 0..w as i32 {
                self.set(x + dx, y + dy, Cell::from_char(' ', Color::White, bg));
            }
        }
    }
}

fn rgb(c: Rgb) -> Color {
    Color::Rgb { r: c.r, g: c.g, b: c.b }
}

/// Readable text colour over a persona fill.
fn ink(c: Rgb) -> Color {
    if c.is_light() { Color::Black } else { Color::White }
}

/// Greedy word wrap; words longer than `width` are hard-split.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    for para in text.lines() {
        let mut line = String::new();
        for word in para.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > width {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                let rest = word.split_off(width);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            let len = line.chars().count();
            if len > 0 && len + 1 + word.len() > width {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.extend(word);
        }
        lines.push(line);
    }
    lines
}

/// Showcase grid columns for a terminal width.
pub fn showcase_columns(width: usize) -> usize {
    match width {
        0..=59 => 1,
        60..=99 => 2,
        _ => 3,
    }
}

/// Horizontal displacement of a sliding carousel figure.
///
/// Eased progress `p` (0..1) of a slide in `dir`; the incoming figure starts
/// one screen-width away and the outgoing one leaves on the opposite side.
pub fn slide_x(width: i32, p: f32, dir: Direction, incoming: bool) -> i32 {
    let w = width as f32;
    let sign = match dir {
        Direction::Right => 1.0,
        Direction::Left => -1.0,
    };
    let x = if incoming { sign * (1.0 - p) * w } else { -sign * p * w };
    x.round() as i32
}

fn spaced_upper(s: &str) -> String {
    s.to_uppercase().chars().map(|c| c.to_string()).collect::<Vec<_>>().join(" ")
}

fn centered(width: usize, s: &str) -> i32 {
    (width as i32 - s.chars().count() as i32) / 2
}

// ── Renderer ──

const FIGURE_W: usize = 30;
const FIGURE_H: usize = 9;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_screen: Option<Screen>,
    hits: HitMap,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_screen: None,
            hits: HitMap::default(),
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Click target under a terminal cell, as of the last rendered frame.
    pub fn hit_test(&self, col: u16, row: u16) -> Option<ClickTarget> {
        self.hits.hit(col, row)
    }

    pub fn render(&mut self, app: &AppState, now_ms: u64) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Screen change → clear for a clean transition
        if self.last_screen != Some(app.screen) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_screen = Some(app.screen);
        }

        self.front.clear();
        self.hits.clear();

        match app.screen {
            Screen::Selection => self.compose_selection(app, now_ms),
            Screen::Title => {
                // The selection screen shows through while the title slides.
                let shift = (app.title.offset(now_ms) * self.term_h as f32).round() as i32;
                if shift > 0 {
                    self.compose_selection(app, now_ms);
                    self.hits.clear();
                }
                self.compose_title(app, shift);
            }
            Screen::Projects => match app.gallery {
                GalleryKind::Slideshow => self.compose_slideshow(app, now_ms),
                GalleryKind::Showcase => self.compose_showcase(app),
            },
            Screen::Detail => self.compose_detail(app),
        }
        self.compose_sound_indicator(app.sound_on());

        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Never ResetColor here: the terminal default may differ from BASE_BG.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.as_str()))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_selection(&mut self, app: &AppState, now_ms: u64) {
        let (w, h) = (self.term_w, self.term_h);
        let Some(current) = app.highlighted() else { return };
        let bg = rgb(current.color);
        let fg = ink(current.color);
        self.front.fill(0, 0, w, h, bg);

        self.front.put_str(centered(w, SELECT_HEADING), 1, SELECT_HEADING, fg, bg);

        let fig_x = centered(w, &" ".repeat(FIGURE_W));
        let fig_y = (h as i32 - FIGURE_H as i32) / 2;

        let state = app.carousel.state();
        let p = app.carousel.progress(now_ms);
        if let Some(out) = state.outgoing.and_then(|i| app.content.get(i)) {
            let dx = slide_x(w as i32, p, state.direction, false);
            self.draw_figure(out, fig_x + dx, fig_y, bg);
        }
        let dx = if state.outgoing.is_some() { slide_x(w as i32, p, state.direction, true) } else { 0 };
        self.draw_figure(current, fig_x + dx, fig_y, bg);
        self.hits.add(fig_x.max(0) as u16, fig_y.max(0) as u16, FIGURE_W as u16, FIGURE_H as u16, ClickTarget::Persona);

        let hint_y = fig_y + FIGURE_H as i32 + 1;
        self.front.put_str(centered(w, CLICK_TO_ENTER), hint_y, CLICK_TO_ENTER, fg, bg);

        // Arrows
        let mid = h as i32 / 2;
        let arrow_fg = rgb(current.third_color);
        self.front.put_str(2, mid, " ◀ ", arrow_fg, bg);
        self.front.put_str(w as i32 - 5, mid, " ▶ ", arrow_fg, bg);
        self.hits.add(1, (mid - 1).max(0) as u16, 5, 3, ClickTarget::ArrowLeft);
        self.hits.add((w as i32 - 6).max(0) as u16, (mid - 1).max(0) as u16, 5, 3, ClickTarget::ArrowRight);

        // Dots
        let n = app.content.len();
        let dots_w = n * 2;
        let dots_x = centered(w, &" ".repeat(dots_w));
        let dots_y = hint_y + 2;
        for i in 0..n {
            let glyph = if i == state.incoming { "●" } else { "○" };
            let x = dots_x + i as i32 * 2;
            self.front.put_str(x, dots_y, glyph, fg, bg);
            self.hits.add(x.max(0) as u16, dots_y.max(0) as u16, 1, 1, ClickTarget::Dot(i));
        }

        let help = "←/→ browse   Enter select   M sound   Q quit";
        self.front.put_str(centered(w, help), h as i32 - 1, help, fg, bg);
    }

    fn draw_figure(&mut self, persona: &Persona, x: i32, y: i32, screen_bg: Color) {
        let body = rgb(persona.secondary_color);
        let text = ink(persona.secondary_color);
        self.front.fill(x, y, FIGURE_W, FIGURE_H, body);
        let name = spaced_upper(&persona.display_name());
        let name_x = x + (FIGURE_W as i32 - name.chars().count() as i32) / 2;
        self.front.put_str(name_x, y + FIGURE_H as i32 / 2, &name, text, body);
        let count = format!("{} projects", persona.projects.len());
        let count_x = x + (FIGURE_W as i32 - count.len() as i32) / 2;
        self.front.put_str(count_x, y + FIGURE_H as i32 - 2, &count, text, body);
        // Shadow
        self.front.fill(x + 1, y + FIGURE_H as i32, FIGURE_W, 1, screen_bg);
    }

    fn compose_title(&mut self, app: &AppState, shift: i32) {
        let (w, h) = (self.term_w, self.term_h);
        let Some(persona) = app.persona() else { return };
        let bg = rgb(persona.color);
        let accent = rgb(persona.secondary_color);
        let arrow = rgb(persona.third_color);
        self.front.fill(0, shift, w, h, bg);

        let up = "▲";
        let up_x = centered(w, up);
        self.front.put_str(up_x, shift + 1, up, arrow, bg);
        self.hits.add((up_x - 2).max(0) as u16, (shift.max(0)) as u16, 5, 3, ClickTarget::TitleBack);

        let the = "T H E";
        let name = spaced_upper(&persona.name);
        let top = shift + h as i32 / 3;
        self.front.put_str(4, top, the, accent, bg);
        self.front.put_str(4, top + 2, &name, accent, bg);

        let enter_y = top + 5;
        self.front.put_str(4, enter_y, CLICK_TO_ENTER, ink(persona.color), bg);
        self.hits.add(4, enter_y.max(0) as u16, CLICK_TO_ENTER.len() as u16, 1, ClickTarget::TitleEnter);

        let help = "↑/Esc back   ↓/Enter projects";
        self.front.put_str(4, shift + h as i32 - 1, help, ink(persona.color), bg);
    }

    fn compose_slideshow(&mut self, app: &AppState, now_ms: u64) {
        let (w, h) = (self.term_w, self.term_h);
        let Some(persona) = app.persona() else { return };
        let bg = rgb(persona.color);
        let fg = ink(persona.color);
        let accent = rgb(persona.third_color);
        self.front.fill(0, 0, w, h, bg);

        let offset = app.slideshow.offset(now_ms);
        let text_w = w.saturating_sub(8).min(72);
        for (i, project) in persona.projects.iter().enumerate() {
            let top = ((i as f32 - offset) * h as f32).round() as i32;
            if top >= h as i32 || top + (h as i32) <= 0 {
                continue;
            }
            let mut y = top + h as i32 / 4;
            self.front.put_str(4, y, &project.title.to_uppercase(), accent, bg);
            y += 1;
            self.front.put_str(4, y, &project.subtitle, fg, bg);
            y += 2;
            for line in wrap(&project.description, text_w).iter().take(h / 3) {
                self.front.put_str(4, y, line, fg, bg);
                y += 1;
            }
            let page = format!("{}/{}", i + 1, persona.projects.len());
            self.front.put_str(w as i32 - 4 - page.len() as i32, top + 1, &page, fg, bg);
            if top.max(0) < h as i32 {
                let ch = (top + h as i32).min(h as i32) - top.max(0);
                self.hits.add(0, top.max(0) as u16, w as u16, ch.max(0) as u16, ClickTarget::Card(i));
            }
        }

        let help = "↑/↓ scroll   Enter open   Esc back";
        self.front.put_str(4, h as i32 - 1, help, fg, bg);
    }

    fn compose_showcase(&mut self, app: &AppState) {
        let (w, h) = (self.term_w, self.term_h);
        let Some(persona) = app.persona() else { return };
        let bg = rgb(persona.color);
        let fg = ink(persona.color);
        let card_bg = rgb(persona.secondary_color);
        let card_fg = ink(persona.secondary_color);
        self.front.fill(0, 0, w, h, bg);

        let heading = spaced_upper(&persona.display_name());
        self.front.put_str(2, 1, &heading, fg, bg);

        let cols = showcase_columns(w);
        let gap = 2;
        let card_w = (w.saturating_sub(4 + gap * (cols - 1))) / cols;
        let card_h = 7;
        for (i, project) in persona.projects.iter().enumerate() {
            let x = 2 + ((i % cols) * (card_w + gap)) as i32;
            let y = 3 + ((i / cols) * (card_h + 1)) as i32;
            self.front.fill(x, y, card_w, card_h, card_bg);
            let label = format!("[{}] {}", i + 1, project.title);
            self.front.put_str(x + 1, y + 1, &label, card_fg, card_bg);
            self.front.put_str(x + 1, y + 2, &project.subtitle, card_fg, card_bg);
            for (j, line) in wrap(&project.description, card_w.saturating_sub(2)).iter().take(3).enumerate() {
                self.front.put_str(x + 1, y + 4 + j as i32, line, card_fg, card_bg);
            }
            if y >= 0 && (y as usize) < h {
                self.hits.add(x as u16, y as u16, card_w as u16, card_h as u16, ClickTarget::Card(i));
            }
        }

        let help = "1-9 / click open   Esc back";
        self.front.put_str(2, h as i32 - 1, help, fg, bg);
    }

    fn compose_detail(&mut self, app: &AppState) {
        let (w, h) = (self.term_w, self.term_h);
        let (Some(page), Some(project)) = (app.page.as_ref(), app.open_project()) else { return };
        let Some(persona) = app.content.get(page.persona) else { return };
        let bg = rgb(persona.color);
        let fg = ink(persona.color);
        let accent = rgb(persona.third_color);
        self.front.fill(0, 0, w, h, bg);

        let back = "◀ back";
        self.front.put_str(2, 1, back, accent, bg);
        self.hits.add(2, 1, back.chars().count() as u16, 1, ClickTarget::DetailBack);

        let text_w = w.saturating_sub(6).min(80);
        let mut y = 3;
        self.front.put_str(3, y, &project.title.to_uppercase(), accent, bg);
        y += 1;
        self.front.put_str(3, y, &project.subtitle, fg, bg);
        y += 2;

        let mut body: Vec<String> = wrap(&project.description, text_w);
        if !project.content.is_empty() {
            body.push(String::new());
            body.extend(wrap(&project.content, text_w));
        }
        if let Some(url) = &project.demo_url {
            body.push(String::new());
            body.push(format!("Demo: {url}"));
        }
        body.push(String::new());
        if page.images.is_empty() {
            body.push("(no images)".to_string());
        } else {
            body.push(format!("Images ({}):", page.images.len()));
            body.extend(page.images.iter().map(|p| format!("  {p}")));
        }

        let room = h.saturating_sub(y as usize + 1);
        for line in body.iter().take(room) {
            self.front.put_str(3, y, line, fg, bg);
            y += 1;
        }

        let route = format!("/project/{}/{}", persona.slug, project.slug);
        self.front.put_str(3, h as i32 - 1, &route, fg, bg);
    }

    fn compose_sound_indicator(&mut self, on: bool) {
        let label = if on { " ♪ on  " } else { " ♪ off " };
        let x = self.term_w as i32 - label.chars().count() as i32 - 1;
        self.front.put_str(x, 0, label, Color::Black, Color::Rgb { r: 255, g: 232, b: 190 });
        self.hits.add(x.max(0) as u16, 0, label.chars().count() as u16, 1, ClickTarget::SoundToggle);
    }
}
