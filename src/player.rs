//! Glue between a guild's [`PlaybackSession`] and whatever streams its audio.

use tracing::{debug, info, warn};

use crate::driver::PlaybackDriver;
use crate::error::{MusicError, MusicResult, QueueError};
use crate::models::{PlayTicket, RepeatMode, Track, TrackEndReason};
use crate::session::PlaybackSession;

pub const MAX_VOLUME: i64 = 100;

/// What a track-end notification led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndOutcome {
    /// The notification belonged to a track that was already replaced.
    Ignored,
    Repeated(Track),
    Advanced(Track),
    /// Nothing left to play.
    Idle,
}

pub struct Player<D> {
    session: PlaybackSession,
    driver: D,
    now_playing: Option<PlayTicket>,
    next_ticket: u64,
    paused: bool,
    volume: u8,
}

impl<D: PlaybackDriver> Player<D> {
    pub fn new(driver: D) -> Self {
        Player {
            session: PlaybackSession::new(),
            driver,
            now_playing: None,
            next_ticket: 0,
            paused: false,
            volume: MAX_VOLUME as u8,
        }
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn is_playing(&self) -> bool {
        self.now_playing.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn now_playing(&self) -> Option<PlayTicket> {
        self.now_playing
    }

    /// Enqueues resolved tracks and starts playback if the player was idle.
    ///
    /// Returns the track that started, if any.
    pub async fn add_tracks(&mut self, tracks: Vec<Track>) -> MusicResult<Option<Track>> {
        if tracks.is_empty() {
            return Err(MusicError::NoTracksFound);
        }

        info!("Adding {} track(s) to the queue", tracks.len());
        self.session.enqueue(tracks);

        if !self.is_playing() && !self.session.is_empty() {
            return self.start_playback().await;
        }

        Ok(None)
    }

    pub async fn start_playback(&mut self) -> MusicResult<Option<Track>> {
        match self.session.current_track()?.cloned() {
            Some(track) => self.play_with_fallback(track).await,
            None => Ok(None),
        }
    }

    /// Moves to the next track after the current one finished.
    ///
    /// An empty queue just leaves the player idle.
    pub async fn advance(&mut self) -> MusicResult<Option<Track>> {
        let next = match self.session.advance_to_next() {
            Ok(next) => next.cloned(),
            Err(QueueError::QueueEmpty) => None,
            Err(why) => return Err(why.into()),
        };

        match next {
            Some(track) => self.play_with_fallback(track).await,
            None => {
                debug!("Queue exhausted");
                self.go_idle();
                Ok(None)
            }
        }
    }

    pub async fn repeat_track(&mut self) -> MusicResult<Option<Track>> {
        match self.session.repeat_current_track()?.cloned() {
            Some(track) => self.play_with_fallback(track).await,
            None => {
                self.go_idle();
                Ok(None)
            }
        }
    }

    /// Handles the driver's end-of-track notification.
    pub async fn on_track_end(&mut self, ticket: PlayTicket, reason: TrackEndReason) -> MusicResult<EndOutcome> {
        if self.now_playing != Some(ticket) {
            debug!("Ignoring end of replaced track {ticket:?}");
            return Ok(EndOutcome::Ignored);
        }

        info!("Track {ticket:?} ended: {reason:?}");
        self.go_idle();

        let replay = reason == TrackEndReason::Finished && self.session.repeat_mode() == RepeatMode::One;

        if replay {
            Ok(self.repeat_track().await?.map_or(EndOutcome::Idle, EndOutcome::Repeated))
        } else {
            Ok(self.advance().await?.map_or(EndOutcome::Idle, EndOutcome::Advanced))
        }
    }

    /// Jumps to the next track right away, ignoring the repeat-one mode.
    pub async fn skip(&mut self) -> MusicResult<Option<Track>> {
        let next = self.session.advance_to_next()?.cloned();

        match next {
            Some(track) => self.play_with_fallback(track).await,
            None => {
                self.go_idle();
                self.driver.stop().await?;
                Ok(None)
            }
        }
    }

    /// Replays the track before the current one.
    ///
    /// The cursor only moves once the driver accepted the track; a failure is
    /// returned and whatever was streaming keeps going.
    pub async fn previous(&mut self) -> MusicResult<Track> {
        let track = match self.session.history()?.last() {
            Some(track) => track.clone(),
            None => return Err(QueueError::NoPreviousTracks.into()),
        };

        self.play(&track).await?;
        self.session.rewind_to_previous()?;

        Ok(track)
    }

    /// Clears the queue and silences the driver.
    pub async fn stop(&mut self) -> MusicResult<()> {
        self.session.clear();
        self.go_idle();
        self.driver.stop().await
    }

    pub async fn pause(&mut self) -> MusicResult<()> {
        if !self.is_playing() {
            return Err(MusicError::NothingPlaying);
        }
        if self.paused {
            return Err(MusicError::PlayerIsAlreadyPaused);
        }

        self.driver.pause().await?;
        self.paused = true;

        Ok(())
    }

    pub async fn resume(&mut self) -> MusicResult<()> {
        if !self.is_playing() {
            return Err(MusicError::NothingPlaying);
        }
        if !self.paused {
            return Err(MusicError::PlayerIsAlreadyPlaying);
        }

        self.driver.resume().await?;
        self.paused = false;

        Ok(())
    }

    pub async fn set_volume(&mut self, percent: i64) -> MusicResult<()> {
        if !(0..=MAX_VOLUME).contains(&percent) {
            return Err(MusicError::InvalidVolume(percent));
        }

        let percent = percent as u8;
        self.driver.set_volume(percent).await?;
        self.volume = percent;

        Ok(())
    }

    pub fn shuffle(&mut self) -> MusicResult<()> {
        Ok(self.session.shuffle()?)
    }

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.session.set_repeat_mode(mode);
    }

    /// Discards every queued track before the player is dropped.
    pub async fn teardown(&mut self) -> MusicResult<()> {
        info!("Tearing down player with {} queued track(s)", self.session.len());

        self.session.clear();
        self.go_idle();
        self.driver.stop().await
    }

    async fn play(&mut self, track: &Track) -> MusicResult<()> {
        let ticket = PlayTicket(self.next_ticket);
        self.next_ticket += 1;

        self.driver.play(track, ticket).await?;

        info!("Playing {} - {}", track.title, track.url);
        self.now_playing = Some(ticket);
        self.paused = false;

        Ok(())
    }

    // Tries each queued track at most once, so a queue of broken tracks under
    // repeat-all still terminates.
    async fn play_with_fallback(&mut self, mut track: Track) -> MusicResult<Option<Track>> {
        for _ in 0..self.session.len() {
            match self.play(&track).await {
                Ok(()) => return Ok(Some(track)),
                Err(why) => {
                    warn!("Could not play {}: {why}", track.title);

                    match self.session.advance_to_next() {
                        Ok(Some(next)) => track = next.clone(),
                        _ => break,
                    }
                }
            }
        }

        // Whatever streamed before the failed attempts must not outlive them.
        self.go_idle();
        self.driver.stop().await?;
        Ok(None)
    }

    fn go_idle(&mut self) {
        self.now_playing = None;
        self.paused = false;
    }
}
