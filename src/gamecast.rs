//! The gamecast panel: one pinned game in detail on the right half of the
//! canvas, next to a single column of compact boxes.
//!
//! The panel is a header (team names, score, inning, bases, outs) followed
//! by text lines 16 pixels apart. The count line always follows the team
//! names; the optional sections after it only take up room when they have
//! something to say, separated by one blank line each.

use crate::Color;
use crate::game::{GameRecord, GamecastRecord, InningHalf};
use crate::surface::{Font, Surface};

const LINE_HEIGHT: i32 = 16;
const COLOR: Color = Color::WHITE;

// Header positions, relative to the left edge of the panel
const SCORE_COLUMN: i32 = 108;
const AWAY_ROW: i32 = 14;
const HOME_ROW: i32 = 30;
const INNING_COLUMN: i32 = 128;
const SECOND_BASE: (i32, i32) = (155, 15);
const BASE_OFFSET: i32 = 7;
const OUTS_COLUMNS: [i32; 3] = [152, 158, 164];
const OUTS_ROW: i32 = 28;

/// The body text, laid out as `(line number, text)`. Lines 0 and 1 hold the
/// team names and line 2 the count; sections follow with a gap between them.
pub fn panel_lines(game: &GameRecord) -> Vec<(usize, String)> {
    let mut lines = Vec::new();

    if let Some(name) = &game.away.name {
        lines.push((0, name.clone()));
    }
    if let Some(name) = &game.home.name {
        lines.push((1, name.clone()));
    }
    lines.push((2, count_line(game)));

    let sections = [
        vec![umpire_line(game), average_runs_line(game), win_probability_line(game)],
        pitch_lines(game),
        hit_lines(game),
    ];

    let mut next = 3;
    for section in sections {
        let section: Vec<String> = section.into_iter().flatten().collect();
        if section.is_empty() {
            continue;
        }
        next += 1;
        for line in section {
            lines.push((next, line));
            next += 1;
        }
    }

    lines
}

/// "2-1 1 Out", "0-0 2 Outs".
pub fn count_line(game: &GameRecord) -> String {
    let count = &game.count;
    let outs = count.outs.unwrap_or(0);
    let plural = if outs == 1 { "" } else { "s" };
    format!(
        "{}-{} {outs} Out{plural}",
        count.balls.unwrap_or(0),
        count.strikes.unwrap_or(0)
    )
}

/// Net runs the missed calls handed to one side, credited to whichever
/// team benefited.
fn umpire_line(game: &GameRecord) -> Option<String> {
    let umpire = &game.umpire;
    let num_missed = umpire.num_missed?;
    let home_favor = umpire.home_favor.unwrap_or(0.0);

    let (favor, team) = if home_favor < 0.0 {
        (-home_favor, &game.away)
    } else {
        (home_favor, &game.home)
    };
    let abv = team.abv.as_deref().unwrap_or_default();

    Some(format!("Ump: +{favor:.2} {abv} ({num_missed})"))
}

fn average_runs_line(game: &GameRecord) -> Option<String> {
    let runs = game.run_expectancy.average_runs?;
    Some(format!("Avg Runs: {runs:.2}"))
}

/// The favorite's win probability.
fn win_probability_line(game: &GameRecord) -> Option<String> {
    let probability = &game.win_probability;
    let away = probability.away? * 100.0;
    let home = probability.home.unwrap_or(0.0) * 100.0;

    let (win, team) = if away > home {
        (away, &game.away)
    } else {
        (home, &game.home)
    };
    let abv = team.abv.as_deref().unwrap_or_default();

    Some(format!("Win Prob: {win:.1}% {abv}"))
}

fn pitch_lines(game: &GameRecord) -> Vec<Option<String>> {
    let pitch = &game.pitch_details;

    // No speed on a non-pitch such as a step off
    let speed = pitch.speed.map(|speed| match pitch.zone {
        Some(zone) => format!("{speed:.1} MPH  Zone:{zone:>2}"),
        None => format!("{speed:.1} MPH"),
    });

    vec![pitch.description.clone(), speed, pitch.kind.clone()]
}

fn hit_lines(game: &GameRecord) -> Vec<Option<String>> {
    let hit = &game.hit_details;
    let Some(distance) = hit.distance else {
        return Vec::new();
    };

    vec![
        Some(format!("Dist: {distance:>5.1} ft")),
        hit.exit_velo.map(|ev| format!("  EV: {ev:>5.1} MPH")),
        hit.launch_angle.map(|la| format!("  LA: {la:>5.1}°")),
    ]
}

/// Clear the panel and, if the gamecast is visible, draw it.
pub fn render_gamecast<S: Surface + ?Sized>(surface: &mut S, gamecast: &GamecastRecord) {
    let panel = surface.panel();
    let left = panel.half_width();
    surface.clear_section(left, 0, panel.cols as i32 - 1, panel.rows as i32 - 1);

    let game = &gamecast.game;
    if !game.visible {
        return;
    }

    for (line, text) in panel_lines(game) {
        let y = LINE_HEIGHT * (line as i32 + 1);
        surface.draw_text(Font::Small, left, y, COLOR, &text);
    }

    for (runs, row) in [(game.away.runs, AWAY_ROW), (game.home.runs, HOME_ROW)] {
        if let Some(runs) = runs {
            surface.draw_text(Font::Small, left + SCORE_COLUMN, row, COLOR, &runs.to_string());
        }
    }

    if let Some(inning) = game.inning {
        let row = (AWAY_ROW + HOME_ROW) / 2;
        surface.draw_text(Font::Small, left + INNING_COLUMN, row, COLOR, &inning.to_string());
    }

    match game.inning_state {
        Some(InningHalf::Top) => surface.draw_text(Font::Symbols, left + INNING_COLUMN, 8, COLOR, "_"),
        Some(InningHalf::Bottom) => {
            surface.draw_text(Font::Symbols, left + INNING_COLUMN, 29, COLOR, "w")
        }
        None => {}
    }

    let (sx, sy) = SECOND_BASE;
    let bases = [
        (0, sx + BASE_OFFSET, sy + BASE_OFFSET),
        (1, sx, sy),
        (2, sx - BASE_OFFSET, sy + BASE_OFFSET),
    ];
    for (base, x, y) in bases {
        let glyph = if game.runner_on(base) { "C" } else { "c" };
        surface.draw_text(Font::Symbols, left + x, y, COLOR, glyph);
    }

    let outs = game.count.outs.unwrap_or(0);
    for (i, x) in OUTS_COLUMNS.into_iter().enumerate() {
        let glyph = if usize::from(outs) > i { "P" } else { "p" };
        surface.draw_text(Font::Symbols, left + x, OUTS_ROW, COLOR, glyph);
    }
}
