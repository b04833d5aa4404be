//! The real panel: a [`Surface`] backed by the `rpi-led-matrix` C library.
//!
//! The C library is not thread-safe, so a `MatrixSurface` is created and
//! used on the render thread only.
//!
//! `LedMatrix::swap` hands back the buffer that was on screen *before* the
//! frame just presented. Game updates redraw a single box on top of what is
//! already there, so the returned buffer has to catch up: every primitive
//! drawn since the last swap is kept and replayed onto it.

use crate::fonts::FontPaths;
use crate::surface::{DrawOp, Font, Surface};
use crate::{Color, PanelConfig};
use rpi_led_matrix::{LedCanvas, LedColor, LedFont, LedMatrix, LedMatrixOptions, LedRuntimeOptions};

/// Hardware options for the chained panels.
#[derive(Clone, Debug)]
pub struct MatrixOptions {
    /// Rows of one physical panel
    pub rows: u32,
    /// Columns of one physical panel
    pub cols: u32,
    pub chain_length: u32,
    pub parallel: u32,
    pub hardware_mapping: String,
    /// e.g. "V-mapper" to stack parallel chains into a taller canvas
    pub pixel_mapper: String,
    pub pwm_bits: u8,
    pub gpio_slowdown: u32,
}

impl Default for MatrixOptions {
    /// Twelve 128x64 panels on three parallel chains, V-mapped to 384x256.
    fn default() -> Self {
        Self {
            rows: 64,
            cols: 128,
            chain_length: 4,
            parallel: 3,
            hardware_mapping: "regular".to_string(),
            pixel_mapper: "V-mapper".to_string(),
            pwm_bits: 1,
            gpio_slowdown: 5,
        }
    }
}

/// Create and configure the LED matrix.
///
/// Returns `Box<dyn Error>` because the library reports failures as plain
/// `&'static str`.
pub fn create_matrix(options: &MatrixOptions) -> Result<LedMatrix, Box<dyn std::error::Error>> {
    let mut led_options = LedMatrixOptions::new();
    led_options.set_rows(options.rows);
    led_options.set_cols(options.cols);
    led_options.set_chain_length(options.chain_length);
    led_options.set_parallel(options.parallel);
    led_options.set_hardware_mapping(&options.hardware_mapping);
    led_options.set_pixel_mapper_config(&options.pixel_mapper);
    led_options.set_hardware_pulsing(false);
    led_options.set_pwm_bits(options.pwm_bits)?;

    let mut rt_options = LedRuntimeOptions::new();
    rt_options.set_gpio_slowdown(options.gpio_slowdown);

    let matrix = LedMatrix::new(Some(led_options), Some(rt_options))?;

    Ok(matrix)
}

struct LoadedFonts {
    large: LedFont,
    small: LedFont,
    symbols: LedFont,
}

impl LoadedFonts {
    fn load(paths: &FontPaths) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            large: LedFont::new(paths.path(Font::Large))?,
            small: LedFont::new(paths.path(Font::Small))?,
            symbols: LedFont::new(paths.path(Font::Symbols))?,
        })
    }

    fn get(&self, font: Font) -> &LedFont {
        match font {
            Font::Large => &self.large,
            Font::Small => &self.small,
            Font::Symbols => &self.symbols,
        }
    }
}

pub struct MatrixSurface {
    matrix: LedMatrix,
    /// Back buffer. Only `None` for the duration of a swap.
    canvas: Option<LedCanvas>,
    fonts: LoadedFonts,
    panel: PanelConfig,
    brightness: u8,
    frame_ops: Vec<DrawOp>,
}

impl MatrixSurface {
    pub fn new(
        options: &MatrixOptions,
        fonts: &FontPaths,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let matrix = create_matrix(options)?;
        let fonts = LoadedFonts::load(fonts)?;

        let canvas = matrix.offscreen_canvas();
        let (cols, rows) = canvas.canvas_size();
        let panel = PanelConfig::new(rows as u32, cols as u32);

        tracing::info!("Matrix ready: {}x{} canvas", panel.cols, panel.rows);

        Ok(Self {
            matrix,
            canvas: Some(canvas),
            fonts,
            panel,
            brightness: 100,
            frame_ops: Vec::new(),
        })
    }

    fn draw(&mut self, op: &DrawOp) {
        let Some(canvas) = self.canvas.as_mut() else {
            return;
        };
        let brightness = self.brightness;
        let led = |color: Color| -> LedColor { color.apply_brightness(brightness).into() };

        match op {
            DrawOp::Text {
                font,
                x,
                y,
                color,
                text,
            } => {
                canvas.draw_text(self.fonts.get(*font), text, *x, *y, &led(*color), 0, false);
            }
            DrawOp::Line {
                x0,
                y0,
                x1,
                y1,
                color,
            } => canvas.draw_line(*x0, *y0, *x1, *y1, &led(*color)),
            DrawOp::Clear { x0, y0, x1, y1 } => {
                let black = led(Color::BLACK);
                let bottom = (*y1).min(self.panel.rows as i32 - 1);
                let right = (*x1).min(self.panel.cols as i32 - 1);
                for y in (*y0).max(0)..=bottom {
                    canvas.draw_line((*x0).max(0), y, right, y, &black);
                }
            }
        }
    }

    fn record(&mut self, op: DrawOp) {
        self.draw(&op);
        self.frame_ops.push(op);
    }
}

impl Surface for MatrixSurface {
    fn panel(&self) -> PanelConfig {
        self.panel
    }

    fn draw_text(&mut self, font: Font, x: i32, y: i32, color: Color, text: &str) {
        self.record(DrawOp::Text {
            font,
            x,
            y,
            color,
            text: text.to_string(),
        });
    }

    fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Color) {
        self.record(DrawOp::Line {
            x0,
            y0,
            x1,
            y1,
            color,
        });
    }

    fn clear_section(&mut self, x0: i32, y0: i32, x1: i32, y1: i32) {
        self.record(DrawOp::Clear { x0, y0, x1, y1 });
    }

    fn swap_frame(&mut self) {
        let Some(canvas) = self.canvas.take() else {
            return;
        };
        self.canvas = Some(self.matrix.swap(canvas));

        // Bring the old front buffer up to the frame now on screen
        let ops = std::mem::take(&mut self.frame_ops);
        for op in &ops {
            self.draw(op);
        }
        tracing::trace!("Swapped frame, replayed {} ops", ops.len());
    }

    fn set_brightness(&mut self, brightness: u8) {
        self.brightness = brightness.min(100);
    }

    fn clear_all(&mut self) {
        // A full clear makes everything recorded before it irrelevant
        self.frame_ops.clear();
        if let Some(canvas) = self.canvas.as_mut() {
            canvas.clear();
        }
        let (x1, y1) = (self.panel.cols as i32 - 1, self.panel.rows as i32 - 1);
        self.frame_ops.push(DrawOp::Clear { x0: 0, y0: 0, x1, y1 });
    }
}
