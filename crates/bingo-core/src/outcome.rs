//! Guess outcomes and their messages

use serde::Serialize;

/// Result of a guess
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The user already played this cycle
    AlreadyPlayed,
    /// The guess matches the number of the day
    Win,
    /// The guess does not match
    Lose,
    /// The guess is not an integer
    InvalidInput,
}

impl Outcome {
    /// Classify a guess
    ///
    /// Pure: the outcome depends only on its arguments. `guess` is `None`
    /// when the submitted text is not an integer.
    pub fn classify(already_played: bool, guess: Option<i64>, number_of_the_day: i64) -> Self {
        if already_played {
            return Outcome::AlreadyPlayed;
        }
        match guess {
            None => Outcome::InvalidInput,
            Some(guess) if guess == number_of_the_day => Outcome::Win,
            Some(_) => Outcome::Lose,
        }
    }

    /// Human-readable answer for `name`
    pub fn message(&self, name: &str, guess: &str) -> String {
        match self {
            Outcome::AlreadyPlayed => format!("hey {name}, you already tried your luck today"),
            Outcome::Win => format!("hooray {name}, great job you guess the correct number!"),
            Outcome::Lose => format!(
                "sorry {name}, you didn't guess the right number this time, but try again tomorrow!"
            ),
            Outcome::InvalidInput => format!("sorry {name}, \"{guess}\" is not a number"),
        }
    }

    /// Whether the request was well-formed
    pub fn is_success(&self) -> bool {
        !matches!(self, Outcome::InvalidInput)
    }
}

/// Parse a submitted guess
pub fn parse_guess(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}
