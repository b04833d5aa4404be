//! On Deck: a paginated baseball scoreboard for RGB LED matrix panels.
//!
//! A data feeder pushes partial game updates over HTTP; a dedicated render
//! thread owns the drawing surface and rotates pages of games across the
//! canvas. This module holds the pieces shared by everything else:
//! - Panel dimensions
//! - Colors and the scoreboard palette
//! - Signal handling for clean shutdown

pub mod fonts;
pub mod game;
pub mod game_box;
pub mod gamecast;
#[cfg(feature = "hardware")]
pub mod matrix;
pub mod mode;
pub mod paginator;
pub mod render;
pub mod server;
pub mod store;
pub mod surface;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

// ── Panel configuration ────────────────────────────────────────────

/// Logical canvas size in pixels, after any pixel mapping of chained panels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PanelConfig {
    pub rows: u32,
    pub cols: u32,
}

impl PanelConfig {
    pub fn new(rows: u32, cols: u32) -> Self {
        Self { rows, cols }
    }

    /// Horizontal middle, where the second column of game boxes starts.
    pub fn half_width(&self) -> i32 {
        (self.cols / 2) as i32
    }
}

impl Default for PanelConfig {
    /// Twelve 128x64 panels arranged as a 384x256 canvas.
    fn default() -> Self {
        Self {
            rows: 256,
            cols: 384,
        }
    }
}

// ── Color ──────────────────────────────────────────────────────────

/// Our own color type, decoupled from the hardware crate.
///
/// Renderers and tests work with this type; the matrix surface converts it
/// to `LedColor` at the hardware boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);
    pub const RED: Color = Color::new(255, 0, 0);
    pub const GREEN: Color = Color::new(0, 255, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Apply brightness scaling (0-100) to this color.
    pub fn apply_brightness(self, brightness: u8) -> Self {
        if brightness >= 100 {
            return self;
        }
        Self {
            r: ((self.r as u16 * brightness as u16) / 100) as u8,
            g: ((self.g as u16 * brightness as u16) / 100) as u8,
            b: ((self.b as u16 * brightness as u16) / 100) as u8,
        }
    }
}

/// Convert our Color to the hardware crate's LedColor at the boundary.
#[cfg(feature = "hardware")]
impl From<Color> for rpi_led_matrix::LedColor {
    fn from(c: Color) -> Self {
        rpi_led_matrix::LedColor {
            red: c.r,
            green: c.g,
            blue: c.b,
        }
    }
}

// ── Shutdown ───────────────────────────────────────────────────────

/// Set up a Ctrl+C handler that sets the returned flag to false.
///
/// The render thread polls the flag between pages; the HTTP server polls it
/// for graceful shutdown.
pub fn setup_signal_handler() -> Result<Arc<AtomicBool>, ctrlc::Error> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    Ok(running)
}

/// Check if the main loop should keep running.
pub fn is_running(running: &AtomicBool) -> bool {
    running.load(Ordering::SeqCst)
}

// ── Tests ──────────────────────────────────────────────────────────
