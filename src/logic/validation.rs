//! Structural and numeric checks on a "finish match" request body.

use crate::error::ValidationError;
use crate::models::{MatchResult, OneEighties, PlayerId, PlayerPair, ReportedStats};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Most legs one player can win in a single match.
pub const MAX_LEGS_PER_MATCH: u32 = 99;

/// Validate a raw request body and turn it into a [`MatchResult`].
///
/// Pure: nothing is read or written. Checks, in order: every required field is
/// present; leg counts are at most [`MAX_LEGS_PER_MATCH`]; `highestCheckout` is a pair of non-negative integers; `oneEighties`
/// holds a non-negative count and strictly positive dart values per player;
/// per-player `stats` carry a finite, non-negative average.
///
/// Whether `winnerId` belongs to the match is checked later, against the stored
/// match (see [`GameMatch::finish`](crate::models::GameMatch::finish)).
pub fn validate_finish_request(body: &Value) -> Result<MatchResult, ValidationError> {
    let body = body
        .as_object()
        .ok_or_else(|| ValidationError::Malformed("expected a JSON object".to_string()))?;

    let winner_id: String = field(body, "winnerId")?;
    let player1_legs_won: u32 = field(body, "player1LegsWon")?;
    let player2_legs_won: u32 = field(body, "player2LegsWon")?;
    let stats: PlayerPair<ReportedStats> = field(body, "stats")?;
    let highest_checkout: PlayerPair<u32> = field(body, "highestCheckout")?;
    let one_eighties: PlayerPair<OneEighties> = field(body, "oneEighties")?;

    let winner_id = winner_id
        .trim()
        .parse::<PlayerId>()
        .map_err(|e| invalid("winnerId", e))?;

    for (name, legs) in [("player1LegsWon", player1_legs_won), ("player2LegsWon", player2_legs_won)] {
        if legs > MAX_LEGS_PER_MATCH {
            return Err(invalid(name, format!("at most {MAX_LEGS_PER_MATCH} legs per match")));
        }
    }
    for darts in [&one_eighties.player1.darts, &one_eighties.player2.darts] {
        if darts.iter().any(|&d| d == 0) {
            return Err(invalid("oneEighties", "dart values must be positive integers"));
        }
    }
    for reported in [&stats.player1, &stats.player2] {
        if !reported.average.is_finite() || reported.average < 0.0 {
            return Err(invalid("stats", "average must be a non-negative number"));
        }
    }

    Ok(MatchResult {
        winner_id,
        player1_legs_won,
        player2_legs_won,
        stats,
        highest_checkout,
        one_eighties,
    })
}

/// A required field, deserialized into `T`. `null` counts as absent.
fn field<T: DeserializeOwned>(body: &Map<String, Value>, name: &'static str) -> Result<T, ValidationError> {
    let value = body
        .get(name)
        .filter(|v| !v.is_null())
        .ok_or(ValidationError::MissingField(name))?;
    T::deserialize(value).map_err(|e| invalid(name, e))
}

fn invalid(field: &'static str, reason: impl ToString) -> ValidationError {
    ValidationError::InvalidField {
        field,
        reason: reason.to_string(),
    }
}
