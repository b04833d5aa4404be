//! Game box rendering: one game's state drawn into its slot on the page.
//!
//! Boxes are 50 pixels tall and stack five to a column. Compact modes use
//! half the canvas width per box (a second column starts at the middle);
//! detailed mode uses the full width and adds pitcher lines on the right.
//!
//! Layout per box (x relative to the box, y relative to its top):
//! ```text
//!  0        55/63     100        126-154       175
//!  AWAY     score     ^          bases         line a
//!                     inning                   line b
//!  HOME     score     v          o o o         line c
//! ```

use crate::Color;
use crate::game::{GameRecord, GameState, InningHalf};
use crate::mode::Mode;
use crate::surface::{Font, Surface};

pub const BOX_HEIGHT: i32 = 50;
pub const BOXES_PER_COLUMN: usize = 5;

const AWAY_ROW: i32 = 22;
const HOME_ROW: i32 = 44;
const INNING_ROW: i32 = (AWAY_ROW + HOME_ROW) / 2;
const INNING_COLUMN: i32 = 100;
const SCORE_COLUMN: i32 = 63;
/// Shift applied to two-digit numbers so they stay centered.
const DOUBLE_DIGIT_OFFSET: i32 = 8;
const TIME_OFFSET: i32 = -25;

const OUTS_COLUMNS: [i32; 3] = [130, 142, 154];
const OUTS_ROW: i32 = 43;
const SECOND_BASE: (i32, i32) = (137, 22);
const BASE_OFFSET: i32 = 11;

const LINE_COLUMN: i32 = 175;
const LINE_ROWS: [i32; 3] = [14, 29, 44];
/// Vertical nudge that centers two pitcher lines on the box.
const TWO_LINE_OFFSET: i32 = 7;

/// Left anchor for a number drawn at `column`.
pub fn digit_anchor(value: u32, column: i32) -> i32 {
    if value > 9 {
        column - DOUBLE_DIGIT_OFFSET
    } else {
        column
    }
}

/// Final-inning label: plain "F" for a regulation nine, "F/10" otherwise.
pub fn final_label(inning: Option<u32>) -> String {
    match inning {
        Some(9) | None => "F".to_string(),
        Some(inning) => format!("F/{inning}"),
    }
}

/// Top-left corner of the box at `position` on the page.
pub fn box_origin(position: usize, column_width: i32) -> (i32, i32) {
    let column = (position / BOXES_PER_COLUMN) as i32;
    let row = (position % BOXES_PER_COLUMN) as i32;
    (column * column_width, row * BOX_HEIGHT)
}

/// Alternating row colors; a no-hitter in progress is drawn in red.
pub fn box_color(position: usize, game: &GameRecord) -> Color {
    if game.no_hitter() {
        Color::RED
    } else if position % 2 == 0 {
        Color::WHITE
    } else {
        Color::GREEN
    }
}

fn box_width<S: Surface + ?Sized>(surface: &S, mode: Mode) -> i32 {
    let panel = surface.panel();
    if mode.is_detailed() {
        panel.cols as i32
    } else {
        panel.half_width()
    }
}

/// Blank the box at `position`.
pub fn clear_box<S: Surface + ?Sized>(surface: &mut S, position: usize, mode: Mode) {
    let column_width = surface.panel().half_width();
    let (x, y) = box_origin(position, column_width);
    let width = box_width(surface, mode);
    surface.clear_section(x, y, x + width - 1, y + BOX_HEIGHT - 1);
}

/// Clear the box at `position` and draw `game` into it. Hidden games leave
/// the box blank.
pub fn render_game<S: Surface + ?Sized>(
    surface: &mut S,
    position: usize,
    game: &GameRecord,
    mode: Mode,
) {
    clear_box(surface, position, mode);

    if !game.visible {
        return;
    }

    let (x, y) = box_origin(position, surface.panel().half_width());
    let mut game_box = GameBox {
        surface,
        x,
        y,
        color: box_color(position, game),
        detailed: mode.is_detailed(),
    };

    game_box.teams(game);

    let Some(state) = game.game_state else {
        return;
    };

    match state {
        GameState::Pre => game_box.pre(game),
        GameState::Live => game_box.live(game),
        GameState::Final => game_box.finished(game),
        GameState::Suspended => game_box.interrupted(game, "Susp", 25, "Suspended"),
        GameState::Delay => game_box.interrupted(game, "Dly", 32, "Delayed"),
    }
}

/// Dashes along the bottom row, one per page up to and including `page`.
pub fn render_page_indicator<S: Surface + ?Sized>(surface: &mut S, page: usize, page_count: usize) {
    let panel = surface.panel();
    let y = panel.rows as i32 - 1;
    surface.draw_line(0, y, panel.cols as i32 - 1, y, Color::BLACK);

    if page_count <= 1 {
        return;
    }

    let dash = 5;
    let step = dash + 2;
    for i in 0..=page as i32 {
        let x0 = 40 + (i + 1) * step;
        surface.draw_line(x0, y, x0 + dash - 1, y, Color::WHITE);
    }
}

// ── Per-state drawing ────────────────────────────────────────────────

struct GameBox<'a, S: Surface + ?Sized> {
    surface: &'a mut S,
    x: i32,
    y: i32,
    color: Color,
    detailed: bool,
}

impl<S: Surface + ?Sized> GameBox<'_, S> {
    fn text(&mut self, font: Font, dx: i32, dy: i32, text: &str) {
        self.surface
            .draw_text(font, self.x + dx, self.y + dy, self.color, text);
    }

    fn teams(&mut self, game: &GameRecord) {
        if let Some(abv) = &game.away.abv {
            self.text(Font::Large, 0, AWAY_ROW, abv);
        }
        if let Some(abv) = &game.home.abv {
            self.text(Font::Large, 0, HOME_ROW, abv);
        }
    }

    fn scores(&mut self, game: &GameRecord) {
        for (runs, row) in [(game.away.runs, AWAY_ROW), (game.home.runs, HOME_ROW)] {
            if let Some(runs) = runs {
                let column = digit_anchor(runs, SCORE_COLUMN);
                self.text(Font::Large, column, row, &runs.to_string());
            }
        }
    }

    fn inning(&mut self, game: &GameRecord) {
        if let Some(inning) = game.inning {
            let column = digit_anchor(inning, INNING_COLUMN);
            self.text(Font::Large, column, INNING_ROW, &inning.to_string());
        }

        match game.inning_state {
            Some(InningHalf::Top) => self.text(Font::Symbols, INNING_COLUMN, 11, "^"),
            Some(InningHalf::Bottom) => self.text(Font::Symbols, INNING_COLUMN, 43, "v"),
            None => {}
        }
    }

    /// Text in the large font on the inning row, `dx` right of the inning column.
    fn label(&mut self, dx: i32, text: &str) {
        self.text(Font::Large, INNING_COLUMN + dx, INNING_ROW, text);
    }

    fn outs(&mut self, game: &GameRecord) {
        let outs = game.count.outs.unwrap_or(0);
        for (i, column) in OUTS_COLUMNS.into_iter().enumerate() {
            let glyph = if usize::from(outs) > i { "O" } else { "o" };
            self.text(Font::Symbols, column, OUTS_ROW, glyph);
        }
    }

    fn runners(&mut self, game: &GameRecord) {
        let (sx, sy) = SECOND_BASE;
        let bases = [
            (0, sx + BASE_OFFSET, sy + BASE_OFFSET),
            (1, sx, sy),
            (2, sx - BASE_OFFSET, sy + BASE_OFFSET),
        ];
        for (base, dx, dy) in bases {
            let glyph = if game.runner_on(base) { "B" } else { "b" };
            self.text(Font::Symbols, dx, dy, glyph);
        }
    }

    /// Up to three small-font lines on the right of a detailed box. With
    /// only the outer two present they are pulled toward the middle.
    fn lines(&mut self, a: Option<String>, b: Option<String>, c: Option<String>) {
        let squeeze = if b.is_some() { 0 } else { TWO_LINE_OFFSET };
        let rows = [
            LINE_ROWS[0] + squeeze,
            LINE_ROWS[1],
            LINE_ROWS[2] - squeeze,
        ];
        for (line, row) in [a, b, c].into_iter().zip(rows) {
            if let Some(line) = line {
                self.text(Font::Small, LINE_COLUMN, row, &line);
            }
        }
    }

    fn pre(&mut self, game: &GameRecord) {
        if let Some(start_time) = &game.start_time {
            // Five-character times ("12:05") need the extra room
            let dx = if start_time.chars().count() > 4 {
                TIME_OFFSET - 6
            } else {
                TIME_OFFSET + 10
            };
            self.label(dx, start_time);
        }

        if self.detailed {
            let probables = &game.probables;
            let away = pitcher_line("SP", probables.away.as_deref(), probables.away_era.as_deref());
            let home = pitcher_line("SP", probables.home.as_deref(), probables.home_era.as_deref());
            self.lines(Some(away), None, Some(home));
        }
    }

    fn live(&mut self, game: &GameRecord) {
        self.scores(game);
        self.inning(game);
        self.outs(game);
        self.runners(game);

        if self.detailed {
            let (a, c) = matchup_lines(game);
            self.lines(a, None, c);
        }
    }

    fn finished(&mut self, game: &GameRecord) {
        self.scores(game);
        self.label(0, &final_label(game.inning));

        if self.detailed {
            let (a, b, c) = decision_lines(game);
            self.lines(a, b, c);
        }
    }

    /// Suspended and delayed games: score and inning plus a status label.
    fn interrupted(&mut self, game: &GameRecord, short: &str, short_dx: i32, long: &str) {
        self.scores(game);
        self.inning(game);

        if self.detailed {
            self.label(75, long);
            self.runners(game);
            self.outs(game);
        } else {
            self.label(short_dx, short);
        }
    }
}

fn pitcher_line(prefix: &str, name: Option<&str>, summary: Option<&str>) -> String {
    let name = name.unwrap_or("TBD");
    match summary {
        Some(summary) => format!("{prefix}:{name} ({summary})"),
        None => format!("{prefix}:{name}"),
    }
}

/// Batter and pitcher lines, ordered so the batting team's line sits on its
/// own row. After the third out the feeder already describes the next half
/// inning, so the order flips.
pub fn matchup_lines(game: &GameRecord) -> (Option<String>, Option<String>) {
    let Some(mut half) = game.inning_state else {
        return (None, None);
    };
    if game.count.outs == Some(3) {
        half = half.flipped();
    }

    let matchup = &game.matchup;
    let batter = matchup
        .batter
        .as_deref()
        .map(|name| pitcher_line("B", Some(name), matchup.batter_summary.as_deref()));
    let pitcher = matchup
        .pitcher
        .as_deref()
        .map(|name| pitcher_line("P", Some(name), matchup.pitcher_summary.as_deref()));

    match half {
        InningHalf::Top => (batter, pitcher),
        InningHalf::Bottom => (pitcher, batter),
    }
}

/// Win/loss/save lines. The winning pitcher goes on the winning team's row
/// (top for away, bottom for home); a tie has no decisions.
pub fn decision_lines(game: &GameRecord) -> (Option<String>, Option<String>, Option<String>) {
    let (Some(away), Some(home)) = (game.away.runs, game.home.runs) else {
        return (None, None, None);
    };

    let d = &game.decisions;
    let win = pitcher_line("WP", d.win.as_deref(), d.win_summary.as_deref());
    let loss = pitcher_line("LP", d.loss.as_deref(), d.loss_summary.as_deref());
    let save = d
        .save
        .as_deref()
        .map(|name| pitcher_line("SV", Some(name), d.save_summary.as_deref()));

    if away > home {
        (Some(win), save, Some(loss))
    } else if home > away {
        (Some(loss), save, Some(win))
    } else {
        (None, None, None)
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PanelConfig;
    use crate::game::{GamePatch, Merge};
    use crate::surface::{DrawOp, RecordingSurface};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn game(value: serde_json::Value) -> GameRecord {
        let mut game = GameRecord {
            visible: true,
            ..GameRecord::default()
        };
        game.merge(serde_json::from_value::<GamePatch>(value).unwrap());
        game
    }

    fn live(outs: u8, half: &str) -> GameRecord {
        game(json!({
            "game_state": "L",
            "inning": 7,
            "inning_state": half,
            "away": {"abv": "NYM", "runs": 3},
            "home": {"abv": "TEX", "runs": 12},
            "count": {"outs": outs},
            "runners": 2,
            "matchup": {
                "batter": "Semien",
                "batter_summary": "1-3",
                "pitcher": "Senga",
                "pitcher_summary": "6.2 IP"
            }
        }))
    }

    fn surface() -> RecordingSurface {
        RecordingSurface::new(PanelConfig::default())
    }

    fn text_at(surface: &RecordingSurface, text: &str) -> Option<(i32, i32)> {
        surface.ops().iter().find_map(|op| match op {
            DrawOp::Text { x, y, text: t, .. } if t == text => Some((*x, *y)),
            _ => None,
        })
    }

    #[rstest]
    #[case(0, (0, 0))]
    #[case(4, (0, 200))]
    #[case(5, (192, 0))]
    #[case(9, (192, 200))]
    fn boxes_fill_columns_of_five(#[case] position: usize, #[case] expected: (i32, i32)) {
        assert_eq!(box_origin(position, 192), expected);
    }

    #[rstest]
    #[case(Some(9), "F")]
    #[case(Some(11), "F/11")]
    #[case(Some(7), "F/7")]
    #[case(None, "F")]
    fn final_labels(#[case] inning: Option<u32>, #[case] expected: &str) {
        assert_eq!(final_label(inning), expected);
    }

    #[rstest]
    #[case(0, 63)]
    #[case(9, 63)]
    #[case(10, 55)]
    #[case(23, 55)]
    fn two_digit_numbers_shift_left(#[case] value: u32, #[case] expected: i32) {
        assert_eq!(digit_anchor(value, SCORE_COLUMN), expected);
    }

    #[test]
    fn hidden_game_is_cleared_and_left_blank() {
        let mut surface = surface();
        let mut hidden = live(1, "T");
        hidden.visible = false;

        render_game(&mut surface, 1, &hidden, Mode::Basic);

        assert_eq!(
            surface.ops(),
            &[DrawOp::Clear {
                x0: 0,
                y0: 50,
                x1: 191,
                y1: 99
            }]
        );
    }

    #[test]
    fn detailed_mode_clears_full_width() {
        let mut surface = surface();
        render_game(&mut surface, 0, &live(1, "T"), Mode::Detailed);
        assert_eq!(
            surface.ops()[0],
            DrawOp::Clear {
                x0: 0,
                y0: 0,
                x1: 383,
                y1: 49
            }
        );
    }

    #[test]
    fn live_game_draws_score_inning_outs_and_bases() {
        let mut surface = surface();
        render_game(&mut surface, 0, &live(2, "T"), Mode::Basic);

        assert_eq!(text_at(&surface, "NYM"), Some((0, 22)));
        assert_eq!(text_at(&surface, "TEX"), Some((0, 44)));
        assert_eq!(text_at(&surface, "3"), Some((63, 22)));
        assert_eq!(text_at(&surface, "12"), Some((55, 44)));
        assert_eq!(text_at(&surface, "7"), Some((100, 33)));
        assert_eq!(text_at(&surface, "^"), Some((100, 11)));

        let texts = surface.texts();
        assert_eq!(texts.iter().filter(|t| **t == "O").count(), 2);
        assert_eq!(texts.iter().filter(|t| **t == "o").count(), 1);
        // Runner on second only
        assert_eq!(text_at(&surface, "B"), Some((137, 22)));
        assert_eq!(texts.iter().filter(|t| **t == "b").count(), 2);
        // Compact mode has no pitcher lines
        assert!(!texts.iter().any(|t| t.starts_with("B:")));
    }

    #[test]
    fn second_column_offsets_everything() {
        let mut surface = surface();
        render_game(&mut surface, 6, &live(0, "B"), Mode::Dual);
        assert_eq!(text_at(&surface, "NYM"), Some((192, 72)));
        assert_eq!(text_at(&surface, "v"), Some((292, 93)));
    }

    #[test]
    fn detailed_live_game_shows_batter_on_batting_row() {
        let mut surface = surface();
        render_game(&mut surface, 0, &live(1, "T"), Mode::Detailed);

        assert_eq!(text_at(&surface, "B:Semien (1-3)"), Some((175, 21)));
        assert_eq!(text_at(&surface, "P:Senga (6.2 IP)"), Some((175, 37)));
    }

    #[test]
    fn three_outs_show_the_next_half_inning_pairing() {
        let (top, bottom) = matchup_lines(&live(3, "T"));
        assert_eq!(top.as_deref(), Some("P:Senga (6.2 IP)"));
        assert_eq!(bottom.as_deref(), Some("B:Semien (1-3)"));

        let (top, _) = matchup_lines(&live(2, "T"));
        assert_eq!(top.as_deref(), Some("B:Semien (1-3)"));
    }

    #[rstest]
    #[case(9, "F")]
    #[case(11, "F/11")]
    fn final_game_label(#[case] inning: u32, #[case] label: &str) {
        let mut surface = surface();
        let final_game = game(json!({
            "game_state": "F",
            "inning": inning,
            "away": {"abv": "LAA", "runs": 2},
            "home": {"abv": "MIA", "runs": 3}
        }));

        render_game(&mut surface, 0, &final_game, Mode::Basic);

        assert_eq!(text_at(&surface, label), Some((100, 33)));
    }

    #[test]
    fn home_win_puts_winning_pitcher_on_home_row() {
        let final_game = game(json!({
            "game_state": "F",
            "away": {"runs": 2},
            "home": {"runs": 3},
            "decisions": {
                "win": "Alcantara", "win_summary": "5-2",
                "loss": "Sandoval", "loss_summary": "3-4"
            }
        }));

        let (a, b, c) = decision_lines(&final_game);
        assert_eq!(a.as_deref(), Some("LP:Sandoval (3-4)"));
        assert_eq!(b, None);
        assert_eq!(c.as_deref(), Some("WP:Alcantara (5-2)"));
    }

    #[test]
    fn save_line_sits_in_the_middle() {
        let final_game = game(json!({
            "game_state": "F",
            "inning": 9,
            "away": {"runs": 5},
            "home": {"runs": 4},
            "decisions": {"win": "Gray", "loss": "Eovaldi", "save": "Helsley", "save_summary": "20"}
        }));

        let mut surface = surface();
        render_game(&mut surface, 0, &final_game, Mode::Detailed);

        assert_eq!(text_at(&surface, "WP:Gray"), Some((175, 14)));
        assert_eq!(text_at(&surface, "SV:Helsley (20)"), Some((175, 29)));
        assert_eq!(text_at(&surface, "LP:Eovaldi"), Some((175, 44)));
    }

    #[test]
    fn tied_final_has_no_decisions() {
        let tied = game(json!({"game_state": "F", "away": {"runs": 1}, "home": {"runs": 1}}));
        assert_eq!(decision_lines(&tied), (None, None, None));
    }

    #[rstest]
    #[case("7:05", 85)]
    #[case("12:10", 69)]
    fn pre_game_start_time_anchor(#[case] start_time: &str, #[case] x: i32) {
        let mut surface = surface();
        let pre = game(json!({"game_state": "P", "start_time": start_time}));
        render_game(&mut surface, 0, &pre, Mode::Basic);
        assert_eq!(text_at(&surface, start_time), Some((x, 33)));
    }

    #[test]
    fn detailed_pre_game_lists_probables() {
        let mut surface = surface();
        let pre = game(json!({
            "game_state": "P",
            "start_time": "7:05",
            "probables": {"away": "Gilbert", "away_era": "3.21", "home": null}
        }));
        render_game(&mut surface, 0, &pre, Mode::Detailed);

        assert_eq!(text_at(&surface, "SP:Gilbert (3.21)"), Some((175, 21)));
        assert_eq!(text_at(&surface, "SP:TBD"), Some((175, 37)));
    }

    #[rstest]
    #[case("S", "Susp", "Suspended")]
    #[case("D", "Dly", "Delayed")]
    fn interrupted_games_show_status(#[case] state: &str, #[case] short: &str, #[case] long: &str) {
        let record = game(json!({
            "game_state": state,
            "inning": 5,
            "inning_state": "B",
            "away": {"runs": 0},
            "home": {"runs": 1},
            "count": {"outs": 1}
        }));

        let mut compact = surface();
        render_game(&mut compact, 0, &record, Mode::Basic);
        assert!(compact.texts().contains(&short));
        assert!(!compact.texts().contains(&"O"));

        let mut detailed = surface();
        render_game(&mut detailed, 0, &record, Mode::Detailed);
        assert_eq!(text_at(&detailed, long), Some((175, 33)));
        assert!(detailed.texts().contains(&"O"));
        assert!(detailed.texts().contains(&"b"));
    }

    #[test]
    fn no_hitter_is_drawn_in_red() {
        let record = game(json!({"flags": {"no_hitter": true}}));
        assert_eq!(box_color(1, &record), Color::RED);
        assert_eq!(box_color(0, &GameRecord::default()), Color::WHITE);
        assert_eq!(box_color(1, &GameRecord::default()), Color::GREEN);
    }

    #[test]
    fn page_indicator_draws_one_dash_per_page_so_far() {
        let mut surface = surface();
        render_page_indicator(&mut surface, 1, 3);

        let dashes: Vec<_> = surface
            .ops()
            .iter()
            .filter(|op| matches!(op, DrawOp::Line { color, .. } if *color == Color::WHITE))
            .collect();
        assert_eq!(dashes.len(), 2);
        assert_eq!(
            dashes[0],
            &DrawOp::Line {
                x0: 47,
                y0: 255,
                x1: 51,
                y1: 255,
                color: Color::WHITE
            }
        );
    }

    #[test]
    fn single_page_indicator_is_blank() {
        let mut surface = surface();
        render_page_indicator(&mut surface, 0, 1);
        assert_eq!(surface.ops().len(), 1);
    }
}
