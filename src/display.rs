use std::io;

use log::error;
use tui::backend::CrosstermBackend;
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders};
use tui::Terminal;

use crate::config::{RenderConfig, Rgba};

pub const CHIP8_DISPLAY_WIDTH: usize = 64;
pub const CHIP8_DISPLAY_HEIGHT: usize = 32;

/// The monochrome frame buffer, row-major. Only cleared or drawn into by the
/// interpreter; renderers just read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayBuffer {
    width: usize,
    height: usize,
    pixels: Vec<bool>,
}

impl DisplayBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        DisplayBuffer {
            width,
            height,
            pixels: vec![false; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn clear(&mut self) {
        self.pixels.iter_mut().for_each(|p| *p = false);
    }

    /// pixel at (x, y); anything off the grid reads as unlit
    pub fn get(&self, x: usize, y: usize) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.pixels[y * self.width + x]
    }

    pub fn is_blank(&self) -> bool {
        !self.pixels.iter().any(|p| *p)
    }

    /// coordinates of every lit pixel, top-left first
    pub fn lit(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let w = self.width;
        self.pixels
            .iter()
            .enumerate()
            .filter(|(_, p)| **p)
            .map(move |(n, _)| (n % w, n / w))
    }

    /// XOR a sprite onto the grid with its top-left corner at (x, y).
    ///
    /// The origin is taken modulo the grid size, and so is every pixel of the
    /// sprite: drawing off an edge wraps round to the other side. Each byte is
    /// one row, most significant bit leftmost. Returns true if any lit pixel
    /// was turned off.
    pub fn draw_sprite(&mut self, x: usize, y: usize, rows: &[u8]) -> bool {
        let (x, y) = (x % self.width, y % self.height);
        let mut collision = false;
        for (r, row) in rows.iter().enumerate() {
            let py = (y + r) % self.height;
            for b in 0..8 {
                if row & (0x80 >> b) == 0 {
                    continue;
                }
                let px = (x + b) % self.width;
                let pixel = &mut self.pixels[py * self.width + px];
                collision |= *pixel;
                *pixel = !*pixel;
            }
        }
        collision
    }
}

impl Default for DisplayBuffer {
    fn default() -> Self {
        Self::new(CHIP8_DISPLAY_WIDTH, CHIP8_DISPLAY_HEIGHT)
    }
}

/// Display is used by the scheduler to draw things on the screen. It should
/// abstract the implementation details, so a variety of kinds of screen would
/// work.
pub trait Display {
    /// draw the whole frame buffer
    fn draw(&mut self, buffer: &DisplayBuffer) -> Result<(), io::Error>;

    /// let the user know whether the machine is paused
    fn set_paused(&mut self, _paused: bool) {}
}

// store useful metadata about the terminal
struct Resolution {
    width: usize,
    height: usize,
    scale: usize,
}

impl Resolution {
    fn canvas_width(&self) -> usize {
        self.width * self.scale
    }

    fn canvas_height(&self) -> usize {
        self.height * self.scale
    }

    fn x_bounds(&self) -> [f64; 2] {
        [0.0, (self.canvas_width() - 1) as f64]
    }

    fn y_bounds(&self) -> [f64; 2] {
        [-1.0 * (self.canvas_height() - 1) as f64, 0.0]
    }

    /// terminal area needed for the canvas and its border
    fn area(&self) -> Rect {
        Rect::new(
            0,
            0,
            2 + self.canvas_width() as u16,
            2 + self.canvas_height() as u16,
        )
    }

    /// expand the buffer into canvas points, split into (foreground,
    /// background). every pixel becomes a scale x scale square; with outline on
    /// the edge of each lit square goes to the background
    fn bitplanes(
        &self,
        buffer: &DisplayBuffer,
        outline: bool,
    ) -> (Vec<(f64, f64)>, Vec<(f64, f64)>) {
        let s = self.scale;
        let outline = outline && s > 1;
        let mut fg = Vec::new();
        let mut bg = Vec::new();
        for py in 0..buffer.height() {
            for px in 0..buffer.width() {
                let lit = buffer.get(px, py);
                for dy in 0..s {
                    for dx in 0..s {
                        let edge = dx == 0 || dy == 0 || dx == s - 1 || dy == s - 1;
                        let point = (
                            (px * s + dx) as f64,        // x
                            -1.0 * (py * s + dy) as f64, // y
                        );
                        if lit && !(outline && edge) {
                            fg.push(point);
                        } else {
                            bg.push(point);
                        }
                    }
                }
            }
        }
        (fg, bg)
    }
}

fn tui_color(c: Rgba) -> Color {
    let (r, g, b, _) = c.channels();
    Color::Rgb(r, g, b)
}

/// monochrome display in a terminal, rendered using TUI and crossterm
pub struct MonoTermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    resolution: Resolution,
    config: RenderConfig,
    paused: bool,
}

impl MonoTermDisplay {
    pub fn new(
        width: usize,
        height: usize,
        config: RenderConfig,
    ) -> Result<MonoTermDisplay, io::Error> {
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        terminal.hide_cursor()?;
        Ok(MonoTermDisplay {
            terminal,
            resolution: Resolution {
                width,
                height,
                scale: config.scale as usize,
            },
            config,
            paused: false,
        })
    }
}

impl Display for MonoTermDisplay {
    fn draw(&mut self, buffer: &DisplayBuffer) -> Result<(), io::Error> {
        let (fg, bg) = self.resolution.bitplanes(buffer, self.config.outline);
        let fg_color = tui_color(self.config.fg);
        let bg_color = tui_color(self.config.bg);
        let title = if self.paused { "CHIP-8 (paused)" } else { "CHIP-8" };
        let x_bounds = self.resolution.x_bounds();
        let y_bounds = self.resolution.y_bounds();
        let wanted = self.resolution.area();

        self.terminal.draw(|f| {
            // a small terminal just shows the top-left of the screen
            let area = wanted.intersection(f.size());
            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title(title)
                        .borders(Borders::ALL)
                        .style(Style::default().bg(bg_color)),
                )
                .x_bounds(x_bounds)
                .y_bounds(y_bounds)
                .marker(Marker::Block)
                .paint(|ctx| {
                    ctx.draw(&Points {
                        coords: &bg,
                        color: bg_color,
                    });
                    ctx.draw(&Points {
                        coords: &fg,
                        color: fg_color,
                    });
                });
            f.render_widget(canvas, area);
        })?;
        Ok(())
    }

    fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }
}

impl Drop for MonoTermDisplay {
    fn drop(&mut self) {
        if let Err(e) = self.terminal.show_cursor() {
            error!("could not restore the cursor: {}", e);
        }
    }
}

/// useful for testing non-display routines; keeps the last frame it was given
pub struct DummyDisplay {
    pub frames: usize,
    pub last: Option<DisplayBuffer>,
    pub paused: bool,
}

impl DummyDisplay {
    pub fn new() -> DummyDisplay {
        DummyDisplay {
            frames: 0,
            last: None,
            paused: false,
        }
    }
}

impl Default for DummyDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for DummyDisplay {
    fn draw(&mut self, buffer: &DisplayBuffer) -> Result<(), io::Error> {
        self.frames += 1;
        self.last = Some(buffer.clone());
        Ok(())
    }

    fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }
}
