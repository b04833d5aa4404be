//! On Deck scoreboard server
//!
//! Runs a web server that accepts game updates from a data feeder and draws
//! them on an RGB LED matrix, a page of games at a time.
//!
//! ## Architecture
//! - **Render thread** (std::thread): owns the drawing surface, cycles pages
//! - **HTTP server** (tokio/axum): merges updates, sends redraw requests via channel
//!
//! Built without the `hardware` feature, the render thread draws to a
//! headless surface so the API can be exercised on any machine.
//!
//! ## Usage
//! ```sh
//! sudo ./target/release/on-deck --fonts-dir /path/to/fonts --mode dual
//! ```

use clap::Parser;
use on_deck::mode::{Mode, ModeController};
use on_deck::paginator::{PageSizes, Paginator};
use on_deck::render::{DisplayStatus, Scoreboard, render_loop};
use on_deck::server::{self, AppState};
use on_deck::store::GameStore;
use on_deck::{fonts::FontPaths, is_running, setup_signal_handler};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// On Deck scoreboard server
#[derive(Parser)]
#[command(name = "on-deck")]
#[command(about = "HTTP-fed baseball scoreboard for RGB LED matrix panels")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(long, default_value = "5000")]
    port: u16,

    /// Directory holding Terminus/ter-u32b.bdf, Terminus/ter-u18b.bdf and symbols.bdf
    #[arg(long, default_value = "fonts")]
    fonts_dir: PathBuf,

    /// Number of game slots
    #[arg(long, default_value = "20")]
    slots: usize,

    /// Initial display mode (basic, dual, detailed, gamecast)
    #[arg(long, default_value = "dual")]
    mode: Mode,

    /// Seconds each page stays up
    #[arg(long, default_value = "10")]
    dwell_secs: u64,

    /// Games per page in basic mode (at most 10)
    #[arg(long, default_value = "5")]
    basic_page_size: usize,

    /// Games per page in dual mode (at most 10)
    #[arg(long, default_value = "10")]
    dual_page_size: usize,

    /// Games per page in detailed mode (at most 5)
    #[arg(long, default_value = "5")]
    detailed_page_size: usize,

    /// Games per page in gamecast mode (at most 5)
    #[arg(long, default_value = "5")]
    gamecast_page_size: usize,

    /// Display brightness (0-100)
    #[arg(long, default_value = "100", value_parser = clap::value_parser!(u8).range(0..=100))]
    brightness: u8,

    #[cfg(feature = "hardware")]
    #[command(flatten)]
    matrix: MatrixArgs,
}

/// LED panel hardware options
#[cfg(feature = "hardware")]
#[derive(clap::Args)]
struct MatrixArgs {
    /// Rows of one physical panel
    #[arg(long, default_value = "64")]
    panel_rows: u32,

    /// Columns of one physical panel
    #[arg(long, default_value = "128")]
    panel_cols: u32,

    /// Panels daisy-chained per output
    #[arg(long, default_value = "4")]
    chain_length: u32,

    /// Parallel chains
    #[arg(long, default_value = "3")]
    parallel: u32,

    /// GPIO mapping of the driver board
    #[arg(long, default_value = "regular")]
    hardware_mapping: String,

    /// Pixel mapper applied to the chained panels
    #[arg(long, default_value = "V-mapper")]
    pixel_mapper: String,

    /// Color depth; one bit keeps the refresh rate up across twelve panels
    #[arg(long, default_value = "1")]
    pwm_bits: u8,

    #[arg(long, default_value = "5")]
    gpio_slowdown: u32,
}

#[cfg(feature = "hardware")]
impl From<&MatrixArgs> for on_deck::matrix::MatrixOptions {
    fn from(args: &MatrixArgs) -> Self {
        Self {
            rows: args.panel_rows,
            cols: args.panel_cols,
            chain_length: args.chain_length,
            parallel: args.parallel,
            hardware_mapping: args.hardware_mapping.clone(),
            pixel_mapper: args.pixel_mapper.clone(),
            pwm_bits: args.pwm_bits,
            gpio_slowdown: args.gpio_slowdown,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_ansi(false) // Disable ANSI color codes for systemd/journald
        .compact()
        .init();

    let args = Args::parse();
    let running = setup_signal_handler()?;

    let page_sizes = PageSizes {
        basic: args.basic_page_size,
        dual: args.dual_page_size,
        detailed: args.detailed_page_size,
        gamecast: args.gamecast_page_size,
    };
    for mode in [Mode::Basic, Mode::Dual, Mode::Detailed, Mode::Gamecast] {
        let requested = page_sizes.requested(mode);
        if requested != page_sizes.for_mode(mode) {
            tracing::warn!(
                "{} page size {} does not fit the layout, using {}",
                mode,
                requested,
                page_sizes.for_mode(mode)
            );
        }
    }
    let dwell = Duration::from_secs(args.dwell_secs.max(1));

    tracing::info!("On Deck v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Slots: {}, mode: {}, dwell: {:?}", args.slots, args.mode, dwell);
    tracing::info!("Fonts dir: {}", args.fonts_dir.display());
    tracing::info!("Port: {}", args.port);

    let fonts = FontPaths::locate(&args.fonts_dir);

    let store = Arc::new(GameStore::new(args.slots));
    let modes = Arc::new(Mutex::new(ModeController::new(args.mode)));
    let status = Arc::new(Mutex::new(DisplayStatus::new(args.mode, args.brightness)));

    // Create the channel for sending redraw requests to the render thread.
    let (tx, rx) = mpsc::channel();

    #[cfg(feature = "hardware")]
    let matrix_options = on_deck::matrix::MatrixOptions::from(&args.matrix);

    let render_store = store.clone();
    let render_modes = modes.clone();
    let render_status = status.clone();
    let render_running = running.clone();
    let brightness = args.brightness;
    let render_handle = std::thread::spawn(move || {
        // The matrix is not Send; it is created on the thread that uses it
        #[cfg(feature = "hardware")]
        let surface = {
            let fonts = match fonts {
                Ok(fonts) => fonts,
                Err(e) => {
                    tracing::error!("{}", e);
                    return;
                }
            };
            match on_deck::matrix::MatrixSurface::new(&matrix_options, &fonts) {
                Ok(surface) => surface,
                Err(e) => {
                    tracing::error!("Failed to initialize LED matrix: {}", e);
                    return;
                }
            }
        };

        #[cfg(not(feature = "hardware"))]
        let surface = {
            if let Err(e) = fonts {
                tracing::warn!("{} (not needed without a panel)", e);
            }
            on_deck::surface::HeadlessSurface::new(on_deck::PanelConfig::default())
        };

        let scoreboard = Scoreboard::new(
            surface,
            render_store,
            render_modes,
            render_status,
            Paginator::new(page_sizes),
            brightness,
        );
        render_loop(rx, scoreboard, dwell, render_running);
    });

    let app_state = AppState {
        command_tx: tx,
        store,
        modes,
        status,
    };

    let app = server::create_router(app_state);

    let addr = format!("0.0.0.0:{}", args.port);
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("API Documentation: http://localhost:{}/docs", args.port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let shutdown_flag = running.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            while is_running(&shutdown_flag) {
                tokio::time::sleep(Duration::from_millis(250)).await;
            }
            tracing::info!("Shutting down");
        })
        .await?;

    if render_handle.join().is_err() {
        tracing::error!("Render thread panicked");
    }

    Ok(())
}
