//! Render thread: owns the drawing surface, cycles pages and applies
//! redraw requests sent by the HTTP server.
//!
//! The `rpi-led-matrix` C library is not thread-safe, so all drawing happens
//! on a single dedicated thread. HTTP handlers merge updates into the
//! [`GameStore`] themselves and then send a `RenderCommand` through an `mpsc`
//! channel. The dwell between pages is a `recv_timeout` on that channel, so
//! a redraw request is handled as soon as it arrives.
//!
//! ## Rust concepts
//! - `std::sync::mpsc` channels for thread communication
//! - `recv_timeout()` as an interruptible sleep
//! - Generic struct over a trait (`Scoreboard<S: Surface>`)
//! - `Arc<Mutex<T>>` for shared mutable state

use crate::game::GameRecord;
use crate::game_box::{clear_box, render_game, render_page_indicator};
use crate::gamecast::render_gamecast;
use crate::mode::{Mode, ModeController};
use crate::paginator::{Page, Paginator};
use crate::store::GameStore;
use crate::surface::{Font, Surface};
use crate::{Color, is_running};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

// ── Commands ─────────────────────────────────────────────────────────

/// Commands sent from the HTTP server to the render thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderCommand {
    /// Slot `index` was merged; redraw it if it is on screen
    GameUpdated(usize),
    /// The gamecast record was merged
    GamecastUpdated,
    /// Every game was hidden; blank the canvas and restart the cycle
    Reset,
    /// Set display brightness (0-100)
    SetBrightness(u8),
}

// ── Status ───────────────────────────────────────────────────────────

/// Shared status that the HTTP server can read to report current state.
#[derive(Clone, Debug, PartialEq, Serialize, utoipa::ToSchema)]
pub struct DisplayStatus {
    /// Mode being drawn
    pub mode: Mode,
    /// Mode that takes over after the current page cycle
    pub pending_mode: Mode,
    /// Page on screen (0-based)
    pub page: usize,
    pub page_count: usize,
    /// Number of visible game slots
    pub visible_games: usize,
    /// Current brightness (0-100)
    pub brightness: u8,
    /// Server version
    pub version: String,
}

impl DisplayStatus {
    pub fn new(mode: Mode, brightness: u8) -> Self {
        Self {
            mode,
            pending_mode: mode,
            page: 0,
            page_count: 1,
            visible_games: 0,
            brightness,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Default for DisplayStatus {
    fn default() -> Self {
        Self::new(Mode::Dual, 100)
    }
}

// ── Scoreboard ───────────────────────────────────────────────────────

/// State owned by the render thread.
pub struct Scoreboard<S: Surface> {
    surface: S,
    store: Arc<GameStore>,
    modes: Arc<Mutex<ModeController>>,
    status: Arc<Mutex<DisplayStatus>>,
    paginator: Paginator,
    page: usize,
    brightness: u8,
    /// The welcome line is on screen instead of any game
    idle: bool,
}

/// Indices of visible slots, in index order.
fn visible_slots(games: &[GameRecord]) -> Vec<usize> {
    games
        .iter()
        .enumerate()
        .filter(|(_, game)| game.visible)
        .map(|(index, _)| index)
        .collect()
}

impl<S: Surface> Scoreboard<S> {
    pub fn new(
        mut surface: S,
        store: Arc<GameStore>,
        modes: Arc<Mutex<ModeController>>,
        status: Arc<Mutex<DisplayStatus>>,
        paginator: Paginator,
        brightness: u8,
    ) -> Self {
        let brightness = brightness.min(100);
        surface.set_brightness(brightness);
        Self {
            surface,
            store,
            modes,
            status,
            paginator,
            page: 0,
            brightness,
            idle: false,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Page index currently on screen.
    pub fn page(&self) -> usize {
        self.page
    }

    fn current_mode(&self) -> Mode {
        self.modes.lock().current()
    }

    /// The page for `self.page`, or page 0 when every game fits on screen.
    fn current_page(&self, visible: &[usize], mode: Mode) -> Page {
        let page = if self.paginator.cycles(visible.len(), mode) {
            self.page
        } else {
            0
        };
        self.paginator.compute_page(visible, page, mode)
    }

    /// Draw the whole current page and present it. With nothing to show,
    /// the welcome line takes the place of the empty boxes.
    pub fn render_page(&mut self) {
        let mode = self.current_mode();

        let mut gamecast_shown = false;
        if mode == Mode::Gamecast {
            let gamecast = self.store.gamecast();
            gamecast_shown = gamecast.game.visible;
            render_gamecast(&mut self.surface, &gamecast);
        }

        // One snapshot, so the page and the records drawn on it agree
        let games = self.store.snapshot();
        let visible = visible_slots(&games);
        let page = self.current_page(&visible, mode);

        for (position, slot) in page.slots.iter().enumerate() {
            match slot {
                Some(slot) => render_game(&mut self.surface, position, &games[*slot], mode),
                None => clear_box(&mut self.surface, position, mode),
            }
        }

        self.idle = visible.is_empty() && !gamecast_shown;
        if self.idle {
            self.draw_welcome();
        }

        render_page_indicator(&mut self.surface, page.index, page.count);
        self.surface.swap_frame();

        tracing::debug!(
            "Page {}/{} ({} mode, {} visible)",
            page.index + 1,
            page.count,
            mode,
            visible.len()
        );
        self.publish_status(mode, &page, visible.len());
    }

    /// Move to the next page. Returns true when a full page cycle just
    /// completed, which is the only point where a pending mode is applied.
    pub fn advance_page(&mut self) -> bool {
        let mode = self.current_mode();
        let visible = self.store.count_visible();

        let next = self.page + 1;
        let completed = !self.paginator.cycles(visible, mode)
            || next >= self.paginator.page_count(visible, mode);
        self.page = if completed { 0 } else { next };

        if completed && self.modes.lock().commit_if_changed() {
            self.surface.clear_all();
        }

        completed
    }

    /// Apply one command from the HTTP server.
    pub fn handle(&mut self, command: RenderCommand) {
        match command {
            RenderCommand::GameUpdated(index) => self.redraw_game(index),
            RenderCommand::GamecastUpdated => {
                if self.current_mode() != Mode::Gamecast {
                    return;
                }
                if self.idle {
                    self.render_page();
                } else {
                    render_gamecast(&mut self.surface, &self.store.gamecast());
                    self.surface.swap_frame();
                }
            }
            RenderCommand::Reset => self.reset(),
            RenderCommand::SetBrightness(value) => {
                self.brightness = value.min(100);
                self.surface.set_brightness(self.brightness);
                self.status.lock().brightness = self.brightness;
                tracing::info!("Brightness set to {}", self.brightness);

                // Brightness only applies to new drawing
                self.surface.clear_all();
                self.render_page();
            }
        }
    }

    /// Redraw slot `index` right away if it is on the page being shown.
    /// Anything else waits for its page to come around.
    fn redraw_game(&mut self, index: usize) {
        if self.idle {
            // First game after the welcome: replace the whole page
            self.render_page();
            return;
        }

        let mode = self.current_mode();
        let games = self.store.snapshot();
        let visible = visible_slots(&games);
        let page = self.current_page(&visible, mode);

        let (Some(position), Some(game)) = (page.position_of(index), games.get(index)) else {
            tracing::trace!("Game {} not on page {}, deferred", index, page.index);
            return;
        };

        render_game(&mut self.surface, position, game, mode);
        self.surface.swap_frame();
        tracing::debug!("Redrew game {} at position {}", index, position);
    }

    fn reset(&mut self) {
        self.page = 0;
        self.surface.clear_all();
        self.render_page();
        tracing::info!("Games reset");
    }

    fn draw_welcome(&mut self) {
        let panel = self.surface.panel();
        let x = panel.half_width() - 56;
        let y = panel.rows as i32 / 2;
        self.surface
            .draw_text(Font::Large, x, y, Color::WHITE, "On Deck");
    }

    fn publish_status(&self, mode: Mode, page: &Page, visible_games: usize) {
        let pending_mode = self.modes.lock().pending();
        let mut status = self.status.lock();
        status.mode = mode;
        status.pending_mode = pending_mode;
        status.page = page.index;
        status.page_count = page.count;
        status.visible_games = visible_games;
        status.brightness = self.brightness;
    }
}

// ── Render loop ──────────────────────────────────────────────────────

/// Main render loop. Runs on a dedicated thread and owns the surface.
///
/// Each iteration draws the current page, then dwells. Commands that
/// arrive during the dwell are applied immediately without cutting the
/// dwell short. Returns the scoreboard when the channel closes or
/// `running` is cleared.
pub fn render_loop<S: Surface>(
    rx: Receiver<RenderCommand>,
    mut scoreboard: Scoreboard<S>,
    dwell: Duration,
    running: Arc<AtomicBool>,
) -> Scoreboard<S> {
    tracing::info!("Render thread started, dwell {:?}", dwell);

    // Shutdown is checked at least this often
    let poll = Duration::from_millis(250);

    'pages: while is_running(&running) {
        scoreboard.render_page();

        let deadline = Instant::now() + dwell;
        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            if !is_running(&running) {
                break 'pages;
            }

            match rx.recv_timeout((deadline - now).min(poll)) {
                Ok(command) => {
                    let restart = command == RenderCommand::Reset;
                    scoreboard.handle(command);
                    if restart {
                        // Start the next cycle from page 0 right away
                        continue 'pages;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    tracing::info!("Render thread: channel closed, shutting down.");
                    break 'pages;
                }
            }
        }

        scoreboard.advance_page();
    }

    tracing::info!("Render thread stopped");
    scoreboard
}

// ── Tests ────────────────────────────────────────────────────────────
