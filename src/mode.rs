//! Display modes and the controller that defers mode switches to a safe
//! point in the render cycle.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Layout density of the scoreboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// One column of compact game boxes
    Basic,
    /// Two columns of compact game boxes
    Dual,
    /// One column of full-width boxes with pitcher lines
    Detailed,
    /// One column of compact boxes beside the gamecast panel
    Gamecast,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Basic, Mode::Dual, Mode::Detailed, Mode::Gamecast];

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Basic => "basic",
            Mode::Dual => "dual",
            Mode::Detailed => "detailed",
            Mode::Gamecast => "gamecast",
        }
    }

    /// Whether game boxes span the whole canvas width.
    pub fn is_detailed(self) -> bool {
        self == Mode::Detailed
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModeError {
    #[error("Mode {0} not recognized")]
    Unknown(String),
}

impl FromStr for Mode {
    type Err = ModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| ModeError::Unknown(s.to_string()))
    }
}

/// Holds the mode being drawn and the mode requested for the next cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeController {
    current: Mode,
    pending: Mode,
}

impl ModeController {
    pub fn new(initial: Mode) -> Self {
        Self {
            current: initial,
            pending: initial,
        }
    }

    pub fn current(&self) -> Mode {
        self.current
    }

    pub fn pending(&self) -> Mode {
        self.pending
    }

    /// Queue a mode switch. `None` leaves everything as is; an unknown name
    /// is rejected and the pending mode stays untouched.
    pub fn request_mode(&mut self, value: Option<&str>) -> Result<(), ModeError> {
        let Some(value) = value else {
            return Ok(());
        };
        self.pending = value.parse()?;
        Ok(())
    }

    /// Apply the pending mode. Returns true when the mode changed, meaning
    /// the whole canvas has to be cleared before the next page.
    pub fn commit_if_changed(&mut self) -> bool {
        if self.pending == self.current {
            return false;
        }
        tracing::info!("Mode {} -> {}", self.current, self.pending);
        self.current = self.pending;
        true
    }
}

impl Default for ModeController {
    fn default() -> Self {
        Self::new(Mode::Dual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("basic", Mode::Basic)]
    #[case("dual", Mode::Dual)]
    #[case("detailed", Mode::Detailed)]
    #[case("gamecast", Mode::Gamecast)]
    fn parses_known_modes(#[case] input: &str, #[case] expected: Mode) {
        assert_eq!(input.parse::<Mode>().unwrap(), expected);
        assert_eq!(expected.to_string(), input);
    }

    #[rstest]
    #[case("bogus")]
    #[case("")]
    #[case("Basic")]
    fn rejects_unknown_modes(#[case] input: &str) {
        assert_eq!(
            input.parse::<Mode>(),
            Err(ModeError::Unknown(input.to_string()))
        );
    }

    #[test]
    fn request_only_changes_pending() {
        let mut modes = ModeController::new(Mode::Basic);
        modes.request_mode(Some("detailed")).unwrap();
        assert_eq!(modes.current(), Mode::Basic);
        assert_eq!(modes.pending(), Mode::Detailed);
    }

    #[test]
    fn invalid_request_leaves_pending_untouched() {
        let mut modes = ModeController::new(Mode::Basic);
        modes.request_mode(Some("dual")).unwrap();

        let err = modes.request_mode(Some("bogus")).unwrap_err();
        assert_eq!(err.to_string(), "Mode bogus not recognized");
        assert_eq!(modes.pending(), Mode::Dual);
    }

    #[test]
    fn none_request_is_a_no_op() {
        let mut modes = ModeController::new(Mode::Gamecast);
        modes.request_mode(None).unwrap();
        assert_eq!(modes.pending(), Mode::Gamecast);
        assert!(!modes.commit_if_changed());
    }

    #[test]
    fn commit_applies_pending_once() {
        let mut modes = ModeController::new(Mode::Basic);
        modes.request_mode(Some("detailed")).unwrap();

        assert!(modes.commit_if_changed());
        assert_eq!(modes.current(), Mode::Detailed);
        assert!(!modes.commit_if_changed());
    }

    #[test]
    fn requesting_current_mode_needs_no_clear() {
        let mut modes = ModeController::new(Mode::Dual);
        modes.request_mode(Some("dual")).unwrap();
        assert!(!modes.commit_if_changed());
    }
}
