//! Scripted player actions accepted by `hexwalk play`.

use std::{fmt, str::FromStr, time::Duration};

use anyhow::{bail, Context, Error, Result};
use hexwalk_core::{AxialCoord, WorldPoint};

/// Single scripted player action.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Action {
    /// Press on the centre of a cell, asking the agent to walk there.
    Move(AxialCoord),
    /// Secondary press on the centre of a cell, laying a decoy there.
    Decoy(AxialCoord),
    /// Primary press at a world position.
    Click(WorldPoint),
    /// Secondary press at a world position.
    DecoyClick(WorldPoint),
    /// Pointer rests at a world position.
    Hover(WorldPoint),
    /// Lets simulated time pass.
    Wait(Duration),
    /// Abandons the run.
    GiveUp,
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        let (verb, argument) = match text.split_once(':') {
            Some((verb, argument)) => (verb.trim(), Some(argument.trim())),
            None => (text.trim(), None),
        };

        let action = match (verb, argument) {
            ("giveup", None) => Self::GiveUp,
            ("move", Some(argument)) => Self::Move(parse_cell(argument)?),
            ("decoy", Some(argument)) => Self::Decoy(parse_cell(argument)?),
            ("click", Some(argument)) => Self::Click(parse_point(argument)?),
            ("decoy-click", Some(argument)) => Self::DecoyClick(parse_point(argument)?),
            ("hover", Some(argument)) => Self::Hover(parse_point(argument)?),
            ("wait", Some(argument)) => {
                let millis: u64 = argument
                    .parse()
                    .with_context(|| format!("invalid wait duration `{argument}`"))?;
                Self::Wait(Duration::from_millis(millis))
            }
            ("giveup", Some(_)) => bail!("`giveup` takes no argument"),
            (verb, _) => bail!(
                "unknown action `{verb}`; expected move:Q,R, decoy:Q,R, click:X,Y, \
                 decoy-click:X,Y, hover:X,Y, wait:MS or giveup"
            ),
        };
        Ok(action)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Move(cell) => write!(f, "move:{},{}", cell.q(), cell.r()),
            Self::Decoy(cell) => write!(f, "decoy:{},{}", cell.q(), cell.r()),
            Self::Click(point) => write!(f, "click:{},{}", point.x, point.y),
            Self::DecoyClick(point) => write!(f, "decoy-click:{},{}", point.x, point.y),
            Self::Hover(point) => write!(f, "hover:{},{}", point.x, point.y),
            Self::Wait(duration) => write!(f, "wait:{}", duration.as_millis()),
            Self::GiveUp => f.write_str("giveup"),
        }
    }
}

fn split_pair(argument: &str) -> Result<(&str, &str)> {
    argument
        .split_once(',')
        .map(|(first, second)| (first.trim(), second.trim()))
        .with_context(|| format!("expected two comma-separated values, got `{argument}`"))
}

fn parse_cell(argument: &str) -> Result<AxialCoord> {
    let (q, r) = split_pair(argument)?;
    let q = q.parse().with_context(|| format!("invalid q `{q}`"))?;
    let r = r.parse().with_context(|| format!("invalid r `{r}`"))?;
    Ok(AxialCoord::new(q, r))
}

fn parse_point(argument: &str) -> Result<WorldPoint> {
    let (x, y) = split_pair(argument)?;
    let x: f32 = x.parse().with_context(|| format!("invalid x `{x}`"))?;
    let y: f32 = y.parse().with_context(|| format!("invalid y `{y}`"))?;
    if !(x.is_finite() && y.is_finite()) {
        bail!("world position must be finite, got `{argument}`");
    }
    Ok(WorldPoint::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_action() {
        let cases = [
            ("move:1,-1", Action::Move(AxialCoord::new(1, -1))),
            ("decoy: 0, 2", Action::Decoy(AxialCoord::new(0, 2))),
            ("click:1.5,-0.25", Action::Click(WorldPoint::new(1.5, -0.25))),
            (
                "decoy-click:3,4",
                Action::DecoyClick(WorldPoint::new(3.0, 4.0)),
            ),
            ("hover:0,0", Action::Hover(WorldPoint::new(0.0, 0.0))),
            ("wait:750", Action::Wait(Duration::from_millis(750))),
            ("giveup", Action::GiveUp),
        ];

        for (text, expected) in cases {
            let parsed: Action = text.parse().expect("action parses");
            assert_eq!(parsed, expected, "parsing `{text}`");
        }
    }

    #[test]
    fn display_matches_the_accepted_syntax() {
        for text in ["move:2,-3", "wait:40", "giveup", "hover:1,2"] {
            let parsed: Action = text.parse().expect("action parses");
            assert_eq!(parsed.to_string(), text);
        }
    }

    #[test]
    fn malformed_actions_are_rejected() {
        for text in ["jump:1,1", "move:1", "move:a,b", "wait:-3", "giveup:now", "click:NaN,0"] {
            assert!(text.parse::<Action>().is_err(), "`{text}` should be rejected");
        }
    }
}
