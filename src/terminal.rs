//! Terminal frontend
//!
//! Draws the session into a pixel buffer where every terminal cell holds two
//! vertically stacked pixels (upper half block, fg = top, bg = bottom). The
//! world is letterboxed into the buffer at a uniform scale.

use std::io::{self, Write, stdout};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEventKind},
    execute, queue,
    style::{self, Color},
    terminal,
};

use crate::config::GameConfig;
use crate::error::ConfigResult;
use crate::settings::Settings;
use crate::sim::{GamePhase, GameState, ObstacleSide, TickInput, tick};

// ── Colors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Blend toward `other`; `t` in 0..=256
    pub const fn lerp(self, other: Rgb, t: u16) -> Rgb {
        let t = t as i32;
        Rgb(
            (self.0 as i32 + (other.0 as i32 - self.0 as i32) * t / 256) as u8,
            (self.1 as i32 + (other.1 as i32 - self.1 as i32) * t / 256) as u8,
            (self.2 as i32 + (other.2 as i32 - self.2 as i32) * t / 256) as u8,
        )
    }

    const fn dim(self) -> Rgb {
        Rgb(self.0 / 2, self.1 / 2, self.2 / 2)
    }

    fn to_color(self) -> Color {
        Color::Rgb {
            r: self.0,
            g: self.1,
            b: self.2,
        }
    }
}

const LETTERBOX: Rgb = Rgb(12, 14, 20);
const SKY_TOP: Rgb = Rgb(72, 176, 214);
const SKY_BOTTOM: Rgb = Rgb(196, 236, 250);
const HILLS: Rgb = Rgb(104, 186, 72);
const GRASS: Rgb = Rgb(88, 170, 58);
const GRASS_LIGHT: Rgb = Rgb(116, 204, 74);
const SAND: Rgb = Rgb(214, 190, 116);
const SAND_DARK: Rgb = Rgb(188, 164, 94);
const PIPE_EDGE: Rgb = Rgb(58, 104, 22);
const PIPE_BODY: Rgb = Rgb(102, 172, 42);
const PIPE_SHINE: Rgb = Rgb(148, 218, 66);
const BIRD_BODY: Rgb = Rgb(246, 202, 64);
const BIRD_SHINE: Rgb = Rgb(255, 228, 104);
const BIRD_WING: Rgb = Rgb(214, 162, 34);

/// Body, shine and wing colors for one skin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BirdPalette {
    body: Rgb,
    shine: Rgb,
    wing: Rgb,
}

const BIRD_PALETTES: [BirdPalette; crate::consts::BIRD_SKINS as usize] = [
    BirdPalette {
        body: BIRD_BODY,
        shine: BIRD_SHINE,
        wing: BIRD_WING,
    },
    BirdPalette {
        body: Rgb(76, 158, 242),
        shine: Rgb(150, 206, 255),
        wing: Rgb(40, 104, 190),
    },
    BirdPalette {
        body: Rgb(232, 78, 66),
        shine: Rgb(255, 150, 130),
        wing: Rgb(170, 40, 36),
    },
];

const BIRD_BEAK: Rgb = Rgb(228, 84, 38);
const WHITE: Rgb = Rgb(255, 255, 255);
const BLACK: Rgb = Rgb(20, 20, 20);
const PANEL: Rgb = Rgb(222, 198, 124);
const CRASH: Rgb = Rgb(230, 70, 50);

// ── Pixel buffer ────────────────────────────────────────────────────────────

/// Framebuffer with an even pixel height (two pixels per terminal row)
pub struct PixelBuf {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
}

impl PixelBuf {
    pub fn new(cols: u16, rows: u16) -> Self {
        let (width, height) = (cols as usize, rows as usize * 2);
        Self {
            width,
            height,
            pixels: vec![LETTERBOX; width * height],
        }
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.width = cols as usize;
        self.height = rows as usize * 2;
        self.pixels.clear();
        self.pixels.resize(self.width * self.height, LETTERBOX);
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn clear(&mut self, c: Rgb) {
        self.pixels.fill(c);
    }

    /// Write a pixel; anything off the buffer is dropped
    pub fn set(&mut self, x: i32, y: i32, c: Rgb) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.pixels[y as usize * self.width + x as usize] = c;
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Rgb> {
        (x < self.width && y < self.height).then(|| self.pixels[y * self.width + x])
    }

    /// Fill `[x0, x1) x [y0, y1)`, clipped
    pub fn fill(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, c: Rgb) {
        let (w, h) = (self.width as i32, self.height as i32);
        let x0 = x0.clamp(0, w);
        let x1 = x1.clamp(x0, w);
        let y0 = y0.clamp(0, h);
        let y1 = y1.clamp(y0, h);
        for y in y0..y1 {
            let row = y as usize * self.width;
            self.pixels[row + x0 as usize..row + x1 as usize].fill(c);
        }
    }

    /// Halve the brightness of everything
    pub fn darken(&mut self) {
        for px in &mut self.pixels {
            *px = px.dim();
        }
    }

    /// Emit the buffer as half-block cells, only changing colors when needed
    pub fn present(&self, out: &mut impl Write) -> io::Result<()> {
        queue!(out, cursor::MoveTo(0, 0))?;
        let rows = self.height / 2;
        for row in 0..rows {
            let mut fg: Option<Rgb> = None;
            let mut bg: Option<Rgb> = None;
            for col in 0..self.width {
                let top = self.pixels[row * 2 * self.width + col];
                let bottom = self.pixels[(row * 2 + 1) * self.width + col];

                if bg != Some(bottom) {
                    queue!(out, style::SetBackgroundColor(bottom.to_color()))?;
                    bg = Some(bottom);
                }
                if top == bottom {
                    queue!(out, style::Print(' '))?;
                } else {
                    if fg != Some(top) {
                        queue!(out, style::SetForegroundColor(top.to_color()))?;
                        fg = Some(top);
                    }
                    queue!(out, style::Print('\u{2580}'))?;
                }
            }
            queue!(out, style::ResetColor)?;
            if row + 1 < rows {
                queue!(out, style::Print("\r\n"))?;
            }
        }
        out.flush()
    }
}

// ── World to pixel mapping ──────────────────────────────────────────────────

/// Uniform scale plus centring offset from world units to buffer pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Viewport {
    /// Fit the world plus its ground strip into the buffer
    pub fn fit(config: &GameConfig, width: usize, height: usize) -> Self {
        let view_w = config.world_width;
        let view_h = config.world_height + config.ground_height;
        let scale = (width as f32 / view_w).min(height as f32 / view_h);
        Self {
            scale,
            offset_x: (width as f32 - view_w * scale) / 2.0,
            offset_y: (height as f32 - view_h * scale) / 2.0,
        }
    }

    pub fn x(&self, world_x: f32) -> i32 {
        (self.offset_x + world_x * self.scale).round() as i32
    }

    pub fn y(&self, world_y: f32) -> i32 {
        (self.offset_y + world_y * self.scale).round() as i32
    }

    /// Length in pixels, at least one
    pub fn len(&self, world_len: f32) -> i32 {
        ((world_len * self.scale).round() as i32).max(1)
    }
}

// ── 3x5 digits ──────────────────────────────────────────────────────────────

#[rustfmt::skip]
const DIGITS: [u16; 10] = [
    0b111_101_101_101_111,
    0b010_110_010_010_111,
    0b111_001_111_100_111,
    0b111_001_011_001_111,
    0b101_101_111_001_001,
    0b111_100_111_001_111,
    0b111_100_111_101_111,
    0b111_001_010_010_010,
    0b111_101_111_101_111,
    0b111_101_111_001_111,
];

fn draw_digit(buf: &mut PixelBuf, x: i32, y: i32, digit: usize, size: i32, c: Rgb) {
    let glyph = DIGITS[digit % 10];
    for row in 0..5 {
        for col in 0..3 {
            let bit = 14 - (row * 3 + col);
            if glyph >> bit & 1 == 1 {
                let px = x + col * size;
                let py = y + row * size;
                buf.fill(px + 1, py + 1, px + 1 + size, py + 1 + size, BLACK);
                buf.fill(px, py, px + size, py + size, c);
            }
        }
    }
}

/// Centered number; `size` is the pixel size of one glyph dot
pub fn draw_number(buf: &mut PixelBuf, center_x: i32, y: i32, n: u32, size: i32, c: Rgb) {
    let text = n.to_string();
    let advance = 4 * size;
    let total = text.len() as i32 * advance - size;
    let start = center_x - total / 2;
    for (i, ch) in text.bytes().enumerate() {
        draw_digit(buf, start + i as i32 * advance, y, (ch - b'0') as usize, size, c);
    }
}

// ── Scene ───────────────────────────────────────────────────────────────────

/// Draw the whole frame for `state`. `time` (seconds) only drives cosmetics.
pub fn draw(buf: &mut PixelBuf, state: &GameState, settings: &Settings, time: f32) {
    let config = &state.config;
    let view = Viewport::fit(config, buf.width(), buf.height());
    let scroll = state.frame as f32 * config.pipe_speed;
    let floor = view.y(config.world_floor());

    buf.clear(LETTERBOX);
    draw_sky(buf, &view, config, scroll);
    draw_pipes(buf, &view, state);
    draw_ground(buf, &view, config, scroll);
    draw_bird(buf, &view, state, settings, time);

    // Keep the letterbox bars clean of anything that spilled over
    let left = view.x(0.0);
    let right = view.x(config.world_width);
    buf.fill(0, 0, left, buf.height() as i32, LETTERBOX);
    buf.fill(right, 0, buf.width() as i32, buf.height() as i32, LETTERBOX);

    let center_x = view.x(config.world_width / 2.0);
    let dot = view.len(6.0);
    match state.phase {
        GamePhase::Ready => draw_title(buf, &view, config),
        GamePhase::Playing => {
            draw_number(buf, center_x, view.y(24.0), state.score, dot, WHITE);
        }
        GamePhase::Paused => {
            draw_number(buf, center_x, view.y(24.0), state.score, dot, WHITE);
            buf.darken();
            // Pause glyph
            let h = view.len(60.0);
            let w = view.len(14.0);
            let cy = (view.y(0.0) + floor) / 2;
            buf.fill(center_x - w * 2, cy - h / 2, center_x - w, cy + h / 2, WHITE);
            buf.fill(center_x + w, cy - h / 2, center_x + w * 2, cy + h / 2, WHITE);
        }
        GamePhase::GameOver => draw_game_over(buf, &view, state),
    }
}

fn draw_sky(buf: &mut PixelBuf, view: &Viewport, config: &GameConfig, scroll: f32) {
    let top = view.y(0.0);
    let floor = view.y(config.world_floor());
    let left = view.x(0.0);
    let right = view.x(config.world_width);
    let span = (floor - top).max(1);
    for y in top..floor {
        let t = ((y - top) * 256 / span) as u16;
        buf.fill(left, y, right, y + 1, SKY_TOP.lerp(SKY_BOTTOM, t));
    }

    // Rolling hills with slow parallax
    for x in left..right {
        let wx = (x - left) as f32 / view.scale + scroll * 0.3;
        let bump = (wx * 0.018).sin() * 14.0 + (wx * 0.041).sin() * 7.0;
        let hill_top = view.y(config.world_floor() - 40.0 - bump);
        buf.fill(x, hill_top, x + 1, floor, HILLS);
    }
}

fn pipe_shade(col: i32, width: i32) -> Rgb {
    if width <= 2 {
        return PIPE_BODY;
    }
    let t = (col * 256 / (width - 1)) as u16;
    match t {
        0..=40 => PIPE_EDGE.lerp(PIPE_BODY, t * 6),
        41..=110 => PIPE_BODY.lerp(PIPE_SHINE, (t - 40) * 3),
        111..=200 => PIPE_SHINE.lerp(PIPE_BODY, (t - 110) * 2),
        _ => PIPE_BODY.lerp(PIPE_EDGE, ((t - 200) * 4).min(256)),
    }
}

fn draw_pipes(buf: &mut PixelBuf, view: &Viewport, state: &GameState) {
    let cap_h = view.len(12.0);
    let lip = view.len(3.0);
    for obstacle in state.obstacle_rects() {
        let rect = obstacle.rect;
        if rect.is_empty() {
            continue;
        }
        let x0 = view.x(rect.left());
        let x1 = view.x(rect.right());
        let y0 = view.y(rect.top());
        let y1 = view.y(rect.bottom());
        let width = x1 - x0;

        for col in 0..width {
            buf.fill(x0 + col, y0, x0 + col + 1, y1, pipe_shade(col, width));
        }

        // Cap on the end facing the gap
        let (cap_top, cap_bottom) = match obstacle.kind {
            ObstacleSide::Upper => (y1 - cap_h, y1),
            ObstacleSide::Lower => (y0, y0 + cap_h),
        };
        let cap_w = width + lip * 2;
        for col in 0..cap_w {
            let x = x0 - lip + col;
            buf.fill(x, cap_top, x + 1, cap_bottom, pipe_shade(col, cap_w));
        }
        buf.fill(x0 - lip, cap_top, x1 + lip, cap_top + 1, PIPE_EDGE);
        buf.fill(x0 - lip, cap_bottom - 1, x1 + lip, cap_bottom, PIPE_EDGE);
    }
}

fn draw_ground(buf: &mut PixelBuf, view: &Viewport, config: &GameConfig, scroll: f32) {
    let floor = view.y(config.world_floor());
    let bottom = view.y(config.world_floor() + config.ground_height);
    let left = view.x(0.0);
    let right = view.x(config.world_width);
    let shift = (scroll * view.scale) as i32;

    for x in left..right {
        let grass = if ((x + shift) / 3) % 2 == 0 {
            GRASS
        } else {
            GRASS_LIGHT
        };
        buf.set(x, floor, grass);
        for y in (floor + 1)..bottom {
            let stripe = ((x + shift) + (y - floor) * 2).rem_euclid(12) < 6;
            buf.set(x, y, if stripe { SAND } else { SAND_DARK });
        }
    }
}

fn draw_bird(
    buf: &mut PixelBuf,
    view: &Viewport,
    state: &GameState,
    settings: &Settings,
    time: f32,
) {
    let body = state.bird_aabb();
    let palette = BIRD_PALETTES[settings.skin() as usize];
    // Render-only hover on the start screen
    let bob = if state.phase == GamePhase::Ready && !settings.reduced_motion {
        (time * 3.0).sin() * 6.0
    } else {
        0.0
    };

    let size = body.size();
    let x0 = view.x(body.left());
    let y0 = view.y(body.top() + bob);
    let w = view.len(size.x).max(3);
    let h = view.len(size.y).max(2);
    let tilt = if state.phase == GamePhase::Ready {
        0
    } else {
        (state.bird.velocity / 3.0).clamp(-1.0, 1.0).round() as i32
    };

    buf.fill(x0, y0, x0 + w, y0 + h, palette.body);
    buf.fill(x0 + 1, y0, x0 + w - 1, y0 + (h / 4).max(1), palette.shine);

    let wing_up = state.phase != GamePhase::GameOver && (time * 8.0) as i32 % 2 == 0;
    let wing_y = y0 + h / 2 + if wing_up { -1 } else { 0 } + tilt;
    buf.fill(x0 + 1, wing_y, x0 + 1 + (w / 3).max(1), wing_y + (h / 3).max(1), palette.wing);

    let eye = (h / 3).max(1);
    let eye_x = x0 + w - eye - 1;
    let eye_y = y0 + (h / 5).max(1) - 1;
    buf.fill(eye_x, eye_y, eye_x + eye, eye_y + eye, WHITE);
    buf.set(eye_x + eye - 1, eye_y + eye - 1, BLACK);

    let beak_w = (w / 4).max(1);
    let beak_y = y0 + h / 2 + tilt;
    buf.fill(x0 + w, beak_y, x0 + w + beak_w, beak_y + (h / 4).max(1), BIRD_BEAK);
}

fn panel(buf: &mut PixelBuf, x0: i32, y0: i32, x1: i32, y1: i32) {
    buf.fill(x0 - 1, y0 - 1, x1 + 1, y1 + 1, BLACK);
    buf.fill(x0, y0, x1, y1, SAND_DARK);
    buf.fill(x0 + 1, y0 + 1, x1 - 1, y1 - 1, PANEL);
}

fn draw_title(buf: &mut PixelBuf, view: &Viewport, config: &GameConfig) {
    let cx = view.x(config.world_width / 2.0);
    let top = view.y(config.world_height * 0.18);
    let block_w = view.len(40.0);
    let block_h = view.len(56.0);
    let letters = 6;
    let start = cx - letters * block_w / 2;
    for i in 0..letters {
        let bx = start + i * block_w;
        buf.fill(bx, top, bx + block_w - 1, top + block_h, BIRD_BODY);
        buf.fill(bx, top, bx + block_w - 1, top + 1, BIRD_SHINE);
    }
    // Flap hint: a blinking key cap under the title
    let key_y = top + block_h + view.len(20.0);
    let key_w = view.len(120.0);
    buf.fill(cx - key_w / 2, key_y, cx + key_w / 2, key_y + view.len(14.0), WHITE);
}

fn draw_game_over(buf: &mut PixelBuf, view: &Viewport, state: &GameState) {
    let config = &state.config;
    buf.darken();

    let cx = view.x(config.world_width / 2.0);
    let cy = view.y(config.world_height / 2.0);
    let half_w = view.len(130.0);
    let half_h = view.len(70.0);
    panel(buf, cx - half_w, cy - half_h, cx + half_w, cy + half_h);

    let dot = view.len(8.0);
    // Red bar flashes while the restart cooldown runs
    let bar = if state.cooldown > 0 { CRASH } else { BIRD_BODY };
    buf.fill(cx - half_w + 2, cy - half_h + 2, cx + half_w - 2, cy - half_h + 2 + dot, bar);
    draw_number(buf, cx, cy - dot * 2, state.score, dot, WHITE);
}

// ── Input and main loop ─────────────────────────────────────────────────────

/// Pick the config from command-line arguments: an optional JSON path and
/// `--classic` for the original tuning. A path wins over the flag.
pub fn config_from_args<I>(args: I) -> ConfigResult<GameConfig>
where
    I: IntoIterator<Item = String>,
{
    let mut classic = false;
    let mut path = None;
    for arg in args {
        if arg == "--classic" {
            classic = true;
        } else if path.is_none() {
            path = Some(arg);
        } else {
            log::warn!("Ignoring extra argument {}", arg);
        }
    }

    match path {
        Some(path) => GameConfig::load(path),
        None if classic => Ok(GameConfig::classic()),
        None => Ok(GameConfig::default()),
    }
}

/// Fold one terminal event into the pending tick input and the player's
/// preferences. Only fresh presses count; auto-repeat of a held key is
/// ignored. Returns the new size on resize.
pub fn apply_event(
    input: &mut TickInput,
    settings: &mut Settings,
    event: &Event,
) -> Option<(u16, u16)> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
            match key.code {
                KeyCode::Char(' ') | KeyCode::Enter => input.flap = true,
                KeyCode::Char('p') | KeyCode::Char('P') => input.pause = true,
                KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => input.quit = true,
                KeyCode::Up | KeyCode::Char('b') | KeyCode::Char('B') => settings.cycle_skin(1),
                KeyCode::Down => settings.cycle_skin(-1),
                _ => {}
            }
            None
        }
        Event::Resize(cols, rows) => Some((*cols, *rows)),
        _ => None,
    }
}

/// Raw mode + alternate screen for as long as this lives
struct TerminalGuard;

impl TerminalGuard {
    fn enter(out: &mut impl Write) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        execute!(
            out,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            terminal::DisableLineWrap,
        )?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            terminal::LeaveAlternateScreen,
            cursor::Show,
            terminal::EnableLineWrap,
        );
        let _ = terminal::disable_raw_mode();
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Play in the terminal until the player quits
pub fn run(config: GameConfig) -> io::Result<()> {
    let seed = clock_seed();
    let mut state =
        GameState::new(config, seed).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    log::info!("Terminal session with seed {}", seed);

    let mut out = stdout();
    let _guard = TerminalGuard::enter(&mut out)?;

    let mut settings = Settings::load();
    let (cols, rows) = terminal::size()?;
    let mut buf = PixelBuf::new(cols, rows);
    let frame_dur = Duration::from_secs_f32(crate::frame_dt(state.config.fps));
    let start = Instant::now();

    while !state.quit_requested {
        let frame_start = Instant::now();

        let mut input = TickInput::default();
        while event::poll(Duration::ZERO)? {
            let ev = event::read()?;
            if let Some((cols, rows)) = apply_event(&mut input, &mut settings, &ev) {
                buf.resize(cols, rows);
            }
        }
        input.now_ms = start.elapsed().as_millis() as u64;

        tick(&mut state, &input);

        draw(&mut buf, &state, &settings, start.elapsed().as_secs_f32());
        buf.present(&mut out)?;

        let elapsed = frame_start.elapsed();
        if elapsed < frame_dur {
            std::thread::sleep(frame_dur - elapsed);
        }
    }

    log::info!("Quit with score {}", state.score);
    Ok(())
}
