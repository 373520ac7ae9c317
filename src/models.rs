use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::MusicError;

pub const UNKNOWN_TRACK_TITLE: &str = "UNKNOWN TRACK";

/// One playable item. Never mutated once it is in a queue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Track {
    pub title: String,
    pub url: String,
    pub duration: Option<Duration>,
}

impl Track {
    pub fn new(title: impl Into<String>, url: impl Into<String>, duration: Option<Duration>) -> Self {
        Track {
            title: title.into(),
            url: url.into(),
            duration,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RepeatMode {
    /// Advance normally and stop at the end of the queue.
    #[default]
    None,
    /// Replay the current track whenever it finishes.
    One,
    /// Wrap to the first track once the queue is exhausted.
    All,
}

impl FromStr for RepeatMode {
    type Err = MusicError;

    fn from_str(word: &str) -> Result<Self, Self::Err> {
        match word.trim().to_lowercase().as_str() {
            "none" | "off" | "noloop" => Ok(RepeatMode::None),
            "one" | "song" | "onesong" => Ok(RepeatMode::One),
            "all" | "queue" | "entirequeue" => Ok(RepeatMode::All),
            _ => Err(MusicError::InvalidRepeatMode(word.to_string())),
        }
    }
}

impl fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RepeatMode::None => "off",
            RepeatMode::One => "current song",
            RepeatMode::All => "entire queue",
        };

        f.write_str(name)
    }
}

/// Why the driver stopped streaming a track.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackEndReason {
    Finished,
    Stopped,
    Errored,
}

/// Ties a driver's end notification back to the play request that started it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlayTicket(pub u64);
