use async_trait::async_trait;

use crate::error::MusicResult;
use crate::models::{PlayTicket, Track};

/// Streams audio for a [`Player`](crate::player::Player).
///
/// When a track started with `play` ends for any reason the driver must hand
/// the same ticket back through
/// [`Player::on_track_end`](crate::player::Player::on_track_end). Starting a new
/// track replaces whatever was streaming before.
#[async_trait]
pub trait PlaybackDriver: Send {
    async fn play(&mut self, track: &Track, ticket: PlayTicket) -> MusicResult<()>;

    async fn stop(&mut self) -> MusicResult<()>;

    async fn pause(&mut self) -> MusicResult<()>;

    async fn resume(&mut self) -> MusicResult<()>;

    /// `percent` is already validated to be within 0..=100.
    async fn set_volume(&mut self, percent: u8) -> MusicResult<()>;
}
