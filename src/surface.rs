//! The drawing surface the scoreboard renders onto.
//!
//! Renderers only ever call the primitives on [`Surface`]. The hardware
//! matrix implements it in `matrix.rs`; this module provides a recording
//! surface for tests and a headless one for running without a panel.

use crate::{Color, PanelConfig};

/// Fonts used by the scoreboard. The hardware surface maps each to a BDF file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Font {
    /// Terminus 32 bold: team abbreviations, scores, innings
    Large,
    /// Terminus 18 bold: pitcher lines and the gamecast panel
    Small,
    /// Custom glyph font: bases, outs and inning arrows
    Symbols,
}

/// One drawing primitive, as issued by a renderer.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    Text {
        font: Font,
        x: i32,
        y: i32,
        color: Color,
        text: String,
    },
    Line {
        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,
        color: Color,
    },
    /// Blank the inclusive rectangle `(x0, y0)..=(x1, y1)`
    Clear { x0: i32, y0: i32, x1: i32, y1: i32 },
}

/// Double-buffered pixel canvas. Drawing goes to the back buffer until
/// `swap_frame` presents it.
pub trait Surface {
    fn panel(&self) -> PanelConfig;

    fn draw_text(&mut self, font: Font, x: i32, y: i32, color: Color, text: &str);

    fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Color);

    fn clear_section(&mut self, x0: i32, y0: i32, x1: i32, y1: i32);

    fn swap_frame(&mut self);

    /// Scale all subsequent colors (0-100).
    fn set_brightness(&mut self, _brightness: u8) {}

    fn clear_all(&mut self) {
        let panel = self.panel();
        self.clear_section(0, 0, panel.cols as i32 - 1, panel.rows as i32 - 1);
    }
}

// ── Recording surface ────────────────────────────────────────────────

/// Keeps every primitive it receives. Used by the renderer tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingSurface {
    panel: PanelConfig,
    ops: Vec<DrawOp>,
    frames: usize,
    brightness: Option<u8>,
}

#[cfg(test)]
impl RecordingSurface {
    pub fn new(panel: PanelConfig) -> Self {
        Self {
            panel,
            ..Self::default()
        }
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Drain the recorded operations.
    pub fn take_ops(&mut self) -> Vec<DrawOp> {
        std::mem::take(&mut self.ops)
    }

    /// Number of `swap_frame` calls so far.
    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn brightness(&self) -> Option<u8> {
        self.brightness
    }

    /// Text strings drawn, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Number of clears covering the whole panel.
    pub fn full_clears(&self) -> usize {
        let (x1, y1) = (self.panel.cols as i32 - 1, self.panel.rows as i32 - 1);
        self.ops
            .iter()
            .filter(|op| **op == DrawOp::Clear { x0: 0, y0: 0, x1, y1 })
            .count()
    }
}

#[cfg(test)]
impl Surface for RecordingSurface {
    fn panel(&self) -> PanelConfig {
        self.panel
    }

    fn draw_text(&mut self, font: Font, x: i32, y: i32, color: Color, text: &str) {
        self.ops.push(DrawOp::Text {
            font,
            x,
            y,
            color,
            text: text.to_string(),
        });
    }

    fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Color) {
        self.ops.push(DrawOp::Line {
            x0,
            y0,
            x1,
            y1,
            color,
        });
    }

    fn clear_section(&mut self, x0: i32, y0: i32, x1: i32, y1: i32) {
        self.ops.push(DrawOp::Clear { x0, y0, x1, y1 });
    }

    fn swap_frame(&mut self) {
        self.frames += 1;
    }

    fn set_brightness(&mut self, brightness: u8) {
        self.brightness = Some(brightness);
    }
}

// ── Headless surface ─────────────────────────────────────────────────

/// Discards drawing and only counts frames. Lets the server run on a
/// development machine without a panel attached.
#[derive(Debug)]
pub struct HeadlessSurface {
    panel: PanelConfig,
    pending_ops: usize,
    frames: u64,
}

impl HeadlessSurface {
    pub fn new(panel: PanelConfig) -> Self {
        Self {
            panel,
            pending_ops: 0,
            frames: 0,
        }
    }
}

impl Surface for HeadlessSurface {
    fn panel(&self) -> PanelConfig {
        self.panel
    }

    fn draw_text(&mut self, _font: Font, _x: i32, _y: i32, _color: Color, _text: &str) {
        self.pending_ops += 1;
    }

    fn draw_line(&mut self, _x0: i32, _y0: i32, _x1: i32, _y1: i32, _color: Color) {
        self.pending_ops += 1;
    }

    fn clear_section(&mut self, _x0: i32, _y0: i32, _x1: i32, _y1: i32) {
        self.pending_ops += 1;
    }

    fn swap_frame(&mut self) {
        self.frames += 1;
        tracing::trace!("Frame {}: {} draw ops", self.frames, self.pending_ops);
        self.pending_ops = 0;
    }
}
