//! Game records as pushed by the feeder, and the typed deep merge applied to them.
//!
//! Every record type has a `*Patch` twin in which each field is tri-state:
//! a missing key keeps the stored value, an explicit `null` clears it, and
//! anything else overwrites it. Nested blocks merge recursively, so a feeder
//! can send `{"away": {"runs": 3}}` without repeating the team's name.
//!
//! ## Rust concepts
//! - Associated types on a trait (`Merge::Patch`)
//! - `macro_rules!` to generate a record and its patch from one definition
//! - `#[serde(deserialize_with = ...)]` to tell `null` apart from "absent"

use serde::{Deserialize, Deserializer, Serialize};

// ── Merge ────────────────────────────────────────────────────────────

/// A record that can absorb a partial update of itself.
pub trait Merge {
    type Patch;

    fn merge(&mut self, patch: Self::Patch);
}

/// Deserialize a key that is present in the body. Combined with
/// `#[serde(default)]` this yields `None` for a missing key, `Some(None)`
/// for `null` and `Some(Some(v))` for a value.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Declare a flat record whose fields are all optional, plus its patch type
/// and `Merge` impl.
macro_rules! leaf_record {
    (
        $(#[$meta:meta])*
        pub struct $name:ident / $patch:ident {
            $( $(#[$fmeta:meta])* $field:ident : $ty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq, Serialize, utoipa::ToSchema)]
        pub struct $name {
            $( $(#[$fmeta])* pub $field: Option<$ty>, )*
        }

        #[doc = concat!("Partial update for [`", stringify!($name), "`].")]
        #[derive(Clone, Debug, Default, PartialEq, Deserialize)]
        pub struct $patch {
            $(
                $(#[$fmeta])*
                #[serde(default, deserialize_with = "present")]
                pub $field: Option<Option<$ty>>,
            )*
        }

        impl Merge for $name {
            type Patch = $patch;

            fn merge(&mut self, patch: $patch) {
                $(
                    if let Some(value) = patch.$field {
                        self.$field = value;
                    }
                )*
            }
        }
    };
}

fn merge_nested<T: Merge>(target: &mut T, patch: Option<T::Patch>) {
    if let Some(patch) = patch {
        target.merge(patch);
    }
}

// ── Enums ────────────────────────────────────────────────────────────

/// Where the game is in its lifecycle. The feeder sends single letters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub enum GameState {
    #[serde(rename = "P")]
    Pre,
    #[serde(rename = "L")]
    Live,
    #[serde(rename = "F")]
    Final,
    #[serde(rename = "S")]
    Suspended,
    #[serde(rename = "D")]
    Delay,
}

/// Top or bottom of the inning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub enum InningHalf {
    #[serde(rename = "T")]
    Top,
    #[serde(rename = "B")]
    Bottom,
}

impl InningHalf {
    pub fn flipped(self) -> Self {
        match self {
            InningHalf::Top => InningHalf::Bottom,
            InningHalf::Bottom => InningHalf::Top,
        }
    }
}

// ── Blocks ───────────────────────────────────────────────────────────

leaf_record! {
    /// One side of the matchup plus its line score.
    pub struct Team / TeamPatch {
        /// Three-letter abbreviation, e.g. "TEX"
        abv: String,
        /// Full team name, e.g. "Texas Rangers"
        name: String,
        location: String,
        runs: u32,
        hits: u32,
        errors: u32,
        left_on_base: u32,
    }
}

leaf_record! {
    /// Ball-strike-out count.
    pub struct Count / CountPatch {
        balls: u8,
        strikes: u8,
        outs: u8,
    }
}

leaf_record! {
    /// Current batter and pitcher (live games).
    pub struct Matchup / MatchupPatch {
        batter: String,
        batter_summary: String,
        pitcher: String,
        pitcher_summary: String,
    }
}

leaf_record! {
    /// Pitcher decisions (final games).
    pub struct Decisions / DecisionsPatch {
        win: String,
        win_summary: String,
        loss: String,
        loss_summary: String,
        save: String,
        save_summary: String,
    }
}

leaf_record! {
    /// Probable starting pitchers (pre-game).
    pub struct Probables / ProbablesPatch {
        away: String,
        away_era: String,
        home: String,
        home_era: String,
    }
}

leaf_record! {
    /// Last pitch.
    pub struct PitchDetails / PitchDetailsPatch {
        description: String,
        /// Release speed in MPH
        speed: f64,
        #[serde(rename = "type")]
        kind: String,
        zone: u8,
        spin_rate: f64,
    }
}

leaf_record! {
    /// Last ball in play.
    pub struct HitDetails / HitDetailsPatch {
        /// Feet
        distance: f64,
        /// Exit velocity in MPH
        exit_velo: f64,
        /// Degrees
        launch_angle: f64,
    }
}

leaf_record! {
    /// Missed-call tally for the home plate umpire.
    pub struct Umpire / UmpirePatch {
        num_missed: u32,
        /// Runs gained by the home team from missed calls (negative favors away)
        home_favor: f64,
        home_wpa: f64,
    }
}

leaf_record! {
    pub struct RunExpectancy / RunExpectancyPatch {
        average_runs: f64,
    }
}

leaf_record! {
    /// Win probabilities in the range 0.0-1.0.
    pub struct WinProbability / WinProbabilityPatch {
        away: f64,
        home: f64,
        extras: f64,
    }
}

leaf_record! {
    pub struct Flags / FlagsPatch {
        no_hitter: bool,
        perfect_game: bool,
    }
}

// ── Game record ──────────────────────────────────────────────────────

/// Everything the scoreboard knows about one game slot.
///
/// All fields start unset; `visible` flips to true on the first update and
/// back to false on reset.
#[derive(Clone, Debug, Default, PartialEq, Serialize, utoipa::ToSchema)]
pub struct GameRecord {
    pub game_state: Option<GameState>,
    pub inning: Option<u32>,
    pub inning_state: Option<InningHalf>,
    pub away: Team,
    pub home: Team,
    pub count: Count,
    /// Occupied bases: bit 0 = first, bit 1 = second, bit 2 = third
    pub runners: Option<u8>,
    /// Scheduled first pitch, already formatted (e.g. "7:05")
    pub start_time: Option<String>,
    pub matchup: Matchup,
    pub decisions: Decisions,
    pub probables: Probables,
    pub pitch_details: PitchDetails,
    pub hit_details: HitDetails,
    pub umpire: Umpire,
    pub run_expectancy: RunExpectancy,
    pub win_probability: WinProbability,
    pub flags: Flags,
    /// Whether this slot takes part in pagination
    #[serde(rename = "display_game")]
    pub visible: bool,
}

/// Partial update for [`GameRecord`], deserialized straight from a POST body.
/// Unknown keys are ignored.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct GamePatch {
    #[serde(default, deserialize_with = "present")]
    pub game_state: Option<Option<GameState>>,
    #[serde(default, deserialize_with = "present")]
    pub inning: Option<Option<u32>>,
    #[serde(default, deserialize_with = "present")]
    pub inning_state: Option<Option<InningHalf>>,
    #[serde(default)]
    pub away: Option<TeamPatch>,
    #[serde(default)]
    pub home: Option<TeamPatch>,
    #[serde(default)]
    pub count: Option<CountPatch>,
    #[serde(default, deserialize_with = "present")]
    pub runners: Option<Option<u8>>,
    #[serde(default, deserialize_with = "present")]
    pub start_time: Option<Option<String>>,
    #[serde(default)]
    pub matchup: Option<MatchupPatch>,
    #[serde(default)]
    pub decisions: Option<DecisionsPatch>,
    #[serde(default)]
    pub probables: Option<ProbablesPatch>,
    #[serde(default)]
    pub pitch_details: Option<PitchDetailsPatch>,
    #[serde(default)]
    pub hit_details: Option<HitDetailsPatch>,
    #[serde(default)]
    pub umpire: Option<UmpirePatch>,
    #[serde(default)]
    pub run_expectancy: Option<RunExpectancyPatch>,
    #[serde(default)]
    pub win_probability: Option<WinProbabilityPatch>,
    #[serde(default)]
    pub flags: Option<FlagsPatch>,
}

impl Merge for GameRecord {
    type Patch = GamePatch;

    fn merge(&mut self, patch: GamePatch) {
        if let Some(value) = patch.game_state {
            self.game_state = value;
        }
        if let Some(value) = patch.inning {
            self.inning = value;
        }
        if let Some(value) = patch.inning_state {
            self.inning_state = value;
        }
        if let Some(value) = patch.runners {
            // Only three bases exist
            self.runners = value.map(|mask| mask & 0b111);
        }
        if let Some(value) = patch.start_time {
            self.start_time = value;
        }

        merge_nested(&mut self.away, patch.away);
        merge_nested(&mut self.home, patch.home);
        merge_nested(&mut self.count, patch.count);
        merge_nested(&mut self.matchup, patch.matchup);
        merge_nested(&mut self.decisions, patch.decisions);
        merge_nested(&mut self.probables, patch.probables);
        merge_nested(&mut self.pitch_details, patch.pitch_details);
        merge_nested(&mut self.hit_details, patch.hit_details);
        merge_nested(&mut self.umpire, patch.umpire);
        merge_nested(&mut self.run_expectancy, patch.run_expectancy);
        merge_nested(&mut self.win_probability, patch.win_probability);
        merge_nested(&mut self.flags, patch.flags);
    }
}

impl GameRecord {
    /// Runner on `base` (0 = first, 1 = second, 2 = third).
    pub fn runner_on(&self, base: u8) -> bool {
        self.runners.is_some_and(|mask| mask & (1 << base) != 0)
    }

    pub fn no_hitter(&self) -> bool {
        self.flags.no_hitter == Some(true)
    }
}

/// The pinned game shown in the gamecast panel.
#[derive(Clone, Debug, Default, PartialEq, Serialize, utoipa::ToSchema)]
pub struct GamecastRecord {
    #[serde(flatten)]
    pub game: GameRecord,
    /// Slot this gamecast mirrors, if any
    pub pinned_index: Option<usize>,
}

// ── Tests ────────────────────────────────────────────────────────────
