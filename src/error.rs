//! Error types shared by the queue core, the player and the binary.

use thiserror::Error;

/// Raised by [`PlaybackSession`](crate::session::PlaybackSession) reads and moves.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    #[error("the queue is empty")]
    QueueEmpty,

    #[error("there are no previous tracks in the queue")]
    NoPreviousTracks,
}

#[derive(Error, Debug)]
pub enum MusicError {
    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("no tracks could be found")]
    NoTracksFound,

    #[error("you are not connected to a voice channel")]
    NoVoiceChannel,

    #[error("already connected to a voice channel")]
    AlreadyConnectedToChannel,

    #[error("nothing is playing right now")]
    NothingPlaying,

    #[error("the player is already paused")]
    PlayerIsAlreadyPaused,

    #[error("the player is already playing")]
    PlayerIsAlreadyPlaying,

    #[error("unknown repeat mode `{0}`, use none, one or all")]
    InvalidRepeatMode(String),

    #[error("volume must be between 0 and 100, got {0}")]
    InvalidVolume(i64),

    #[error("track lookup failed: {0}")]
    Source(String),

    #[error("playback failed: {0}")]
    Driver(String),
}

impl MusicError {
    /// True for the "nothing in the queue" family the command layer renders softly.
    pub fn is_queue_empty(&self) -> bool {
        matches!(self, MusicError::Queue(QueueError::QueueEmpty))
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("expected {0} in the environment")]
    Missing(&'static str),

    #[error("invalid value `{value}` for {key}")]
    Invalid { key: &'static str, value: String },
}

pub type MusicResult<T> = Result<T, MusicError>;
