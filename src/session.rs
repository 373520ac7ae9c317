//! Per-room playback queue.
//!
//! A [`PlaybackSession`] is an ordered list of tracks with a cursor and a
//! repeat mode. It performs no I/O: the [`Player`](crate::player::Player)
//! decides when to consult it and what to stream.
//!
//! Every read or move on an empty queue fails with [`QueueError::QueueEmpty`].
//! Only `enqueue`, `clear` and `set_repeat_mode` are valid on an empty queue.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::error::QueueError;
use crate::models::{RepeatMode, Track};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// No tracks at all.
    Empty,
    /// The cursor points at a track.
    Playing,
    /// Tracks exist but the cursor ran past the last one.
    Exhausted,
}

#[derive(Debug, Default)]
pub struct PlaybackSession {
    tracks: Vec<Track>,
    // Never greater than `tracks.len()`; equal to it when exhausted.
    position: usize,
    repeat_mode: RepeatMode,
}

impl PlaybackSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat_mode
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn state(&self) -> SessionState {
        if self.tracks.is_empty() {
            SessionState::Empty
        } else if self.position < self.tracks.len() {
            SessionState::Playing
        } else {
            SessionState::Exhausted
        }
    }

    /// The track under the cursor.
    ///
    /// `Ok(None)` means the queue still holds tracks but the cursor is past the
    /// end; callers advance or enqueue to get a current track again.
    pub fn current_track(&self) -> Result<Option<&Track>, QueueError> {
        self.ensure_not_empty()?;

        Ok(self.tracks.get(self.position))
    }

    /// Tracks after the cursor, in play order.
    pub fn upcoming(&self) -> Result<&[Track], QueueError> {
        self.ensure_not_empty()?;

        Ok(self.tracks.get(self.position + 1..).unwrap_or(&[]))
    }

    /// Tracks before the cursor, in play order.
    pub fn history(&self) -> Result<&[Track], QueueError> {
        self.ensure_not_empty()?;

        Ok(&self.tracks[..self.position])
    }

    /// Appends tracks to the end of the queue, keeping their order.
    pub fn enqueue<I>(&mut self, tracks: I)
    where
        I: IntoIterator<Item = Track>,
    {
        let before = self.tracks.len();
        self.tracks.extend(tracks);

        debug!("Enqueued {} track(s), queue length {}", self.tracks.len() - before, self.tracks.len());
    }

    /// Moves the cursor forward one track.
    ///
    /// Past the last track the cursor wraps to the start under
    /// [`RepeatMode::All`]; otherwise it parks past the end and `Ok(None)` is
    /// returned.
    pub fn advance_to_next(&mut self) -> Result<Option<&Track>, QueueError> {
        self.ensure_not_empty()?;

        let next = self.position + 1;

        if next < self.tracks.len() {
            self.position = next;
        } else if self.repeat_mode == RepeatMode::All {
            debug!("End of queue reached, wrapping to the first track");
            self.position = 0;
        } else {
            debug!("End of queue reached");
            self.position = self.tracks.len();
            return Ok(None);
        }

        Ok(self.tracks.get(self.position))
    }

    /// The current track again, without moving the cursor.
    pub fn repeat_current_track(&self) -> Result<Option<&Track>, QueueError> {
        self.current_track()
    }

    /// Moves the cursor back one track and returns it.
    pub fn rewind_to_previous(&mut self) -> Result<&Track, QueueError> {
        self.ensure_not_empty()?;

        if self.position == 0 {
            return Err(QueueError::NoPreviousTracks);
        }

        self.position -= 1;

        Ok(&self.tracks[self.position])
    }

    /// Randomly reorders the tracks after the cursor.
    ///
    /// History and the current track keep their indices.
    pub fn shuffle(&mut self) -> Result<(), QueueError> {
        self.shuffle_with(&mut rand::thread_rng())
    }

    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), QueueError> {
        self.ensure_not_empty()?;

        if let Some(upcoming) = self.tracks.get_mut(self.position + 1..) {
            upcoming.shuffle(rng);
        }

        Ok(())
    }

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        debug!("Repeat mode set to {mode:?}");
        self.repeat_mode = mode;
    }

    /// Drops every track and puts the cursor back at the start.
    pub fn clear(&mut self) {
        self.tracks.clear();
        self.position = 0;
    }

    fn ensure_not_empty(&self) -> Result<(), QueueError> {
        if self.tracks.is_empty() {
            Err(QueueError::QueueEmpty)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn track(name: &str) -> Track {
        Track::new(name, format!("https://example.com/{name}"), None)
    }

    fn session_of(names: &[&str]) -> PlaybackSession {
        let mut session = PlaybackSession::new();
        session.enqueue(names.iter().map(|name| track(name)));
        session
    }

    fn titles(tracks: &[Track]) -> Vec<&str> {
        tracks.iter().map(|track| track.title.as_str()).collect()
    }

    fn current_title(session: &PlaybackSession) -> Option<String> {
        session.current_track().unwrap().map(|track| track.title.clone())
    }

    #[test]
    fn empty_session_rejects_reads_and_moves() {
        let mut session = PlaybackSession::new();

        assert!(session.is_empty());
        assert_eq!(session.state(), SessionState::Empty);
        assert_eq!(session.upcoming().unwrap_err(), QueueError::QueueEmpty);
        assert_eq!(session.history().unwrap_err(), QueueError::QueueEmpty);
        assert_eq!(session.current_track().unwrap_err(), QueueError::QueueEmpty);
        assert_eq!(session.advance_to_next().unwrap_err(), QueueError::QueueEmpty);
        assert_eq!(session.shuffle().unwrap_err(), QueueError::QueueEmpty);
        assert_eq!(session.rewind_to_previous().unwrap_err(), QueueError::QueueEmpty);
        assert_eq!(session.repeat_current_track().unwrap_err(), QueueError::QueueEmpty);
    }

    #[test]
    fn enqueue_on_empty_session_makes_first_track_current() {
        let mut session = PlaybackSession::new();
        session.enqueue([track("A")]);

        assert_eq!(session.position(), 0);
        assert_eq!(current_title(&session).as_deref(), Some("A"));
        assert_eq!(session.state(), SessionState::Playing);
    }

    #[test]
    fn advancing_without_repeat_exhausts_the_queue() {
        let mut session = session_of(&["A", "B", "C"]);

        assert_eq!(session.advance_to_next().unwrap().unwrap().title, "B");
        assert_eq!(session.position(), 1);
        assert_eq!(session.advance_to_next().unwrap().unwrap().title, "C");
        assert_eq!(session.position(), 2);
        assert!(session.advance_to_next().unwrap().is_none());
        assert_eq!(session.position(), 3);

        assert!(!session.is_empty());
        assert!(session.current_track().unwrap().is_none());
        assert_eq!(session.state(), SessionState::Exhausted);
        assert!(session.upcoming().unwrap().is_empty());
        assert_eq!(titles(session.history().unwrap()), ["A", "B", "C"]);
    }

    #[test]
    fn repeat_all_wraps_exactly_after_queue_length_advances() {
        let mut session = session_of(&["A", "B", "C"]);
        session.set_repeat_mode(RepeatMode::All);

        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(session.advance_to_next().unwrap().unwrap().title.clone());
        }

        assert_eq!(seen, ["B", "C", "A"]);
        assert_eq!(session.position(), 0);
    }

    #[test]
    fn repeat_all_resumes_an_exhausted_queue() {
        let mut session = session_of(&["A", "B"]);
        session.advance_to_next().unwrap();
        assert!(session.advance_to_next().unwrap().is_none());

        session.set_repeat_mode(RepeatMode::All);

        assert_eq!(session.advance_to_next().unwrap().unwrap().title, "A");
    }

    #[test]
    fn repeated_advances_past_the_end_stay_parked() {
        let mut session = session_of(&["A"]);

        for _ in 0..4 {
            assert!(session.advance_to_next().unwrap().is_none());
        }

        assert_eq!(session.position(), 1);
    }

    #[test]
    fn enqueue_after_exhaustion_resumes_with_the_new_track() {
        let mut session = session_of(&["A", "B"]);
        session.advance_to_next().unwrap();
        session.advance_to_next().unwrap();
        session.advance_to_next().unwrap();

        session.enqueue([track("C")]);

        assert_eq!(current_title(&session).as_deref(), Some("C"));
        assert_eq!(session.state(), SessionState::Playing);
    }

    #[test]
    fn repeat_current_track_does_not_move_the_cursor() {
        let mut session = session_of(&["A", "B"]);
        session.set_repeat_mode(RepeatMode::One);
        session.advance_to_next().unwrap();

        assert_eq!(session.repeat_current_track().unwrap().unwrap().title, "B");
        assert_eq!(session.repeat_current_track().unwrap().unwrap().title, "B");
        assert_eq!(session.position(), 1);
    }

    #[test]
    fn upcoming_and_history_split_around_the_cursor() {
        let mut session = session_of(&["A", "B", "C", "D"]);
        session.advance_to_next().unwrap();

        assert_eq!(titles(session.history().unwrap()), ["A"]);
        assert_eq!(current_title(&session).as_deref(), Some("B"));
        assert_eq!(titles(session.upcoming().unwrap()), ["C", "D"]);
    }

    #[test]
    fn duplicates_are_kept_in_order() {
        let session = session_of(&["A", "A", "B"]);

        assert_eq!(titles(session.tracks()), ["A", "A", "B"]);
    }

    #[test]
    fn shuffle_only_permutes_unplayed_tracks() {
        let names = ["A", "B", "C", "D", "E", "F", "G", "H"];
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..20 {
            let mut session = session_of(&names);
            session.advance_to_next().unwrap();
            session.advance_to_next().unwrap();

            session.shuffle_with(&mut rng).unwrap();

            assert_eq!(titles(session.history().unwrap()), ["A", "B"]);
            assert_eq!(current_title(&session).as_deref(), Some("C"));

            let mut rest = titles(session.upcoming().unwrap());
            rest.sort_unstable();
            assert_eq!(rest, ["D", "E", "F", "G", "H"]);
            assert_eq!(session.len(), names.len());
        }
    }

    #[test]
    fn shuffle_keeps_first_two_of_four_in_place() {
        let mut session = session_of(&["A", "B", "C", "D"]);
        session.advance_to_next().unwrap();

        session.shuffle().unwrap();

        let order = titles(session.tracks());
        assert_eq!(&order[..2], ["A", "B"]);
        let mut tail = order[2..].to_vec();
        tail.sort_unstable();
        assert_eq!(tail, ["C", "D"]);
    }

    #[test]
    fn shuffle_of_an_exhausted_queue_changes_nothing() {
        let mut session = session_of(&["A", "B"]);
        session.advance_to_next().unwrap();
        session.advance_to_next().unwrap();

        session.shuffle().unwrap();

        assert_eq!(titles(session.tracks()), ["A", "B"]);
    }

    #[test]
    fn rewind_moves_back_into_history() {
        let mut session = session_of(&["A", "B", "C"]);

        assert_eq!(session.rewind_to_previous().unwrap_err(), QueueError::NoPreviousTracks);

        session.advance_to_next().unwrap();
        session.advance_to_next().unwrap();
        session.advance_to_next().unwrap();

        assert_eq!(session.rewind_to_previous().unwrap().title, "C");
        assert_eq!(session.rewind_to_previous().unwrap().title, "B");
        assert_eq!(session.position(), 1);
    }

    #[test]
    fn clear_resets_everything_but_repeat_mode() {
        let mut session = session_of(&["A", "B", "C"]);
        session.set_repeat_mode(RepeatMode::All);
        session.advance_to_next().unwrap();
        session.advance_to_next().unwrap();

        session.clear();

        assert!(session.is_empty());
        assert_eq!(session.position(), 0);
        assert_eq!(session.state(), SessionState::Empty);
        assert_eq!(session.repeat_mode(), RepeatMode::All);

        session.clear();
        assert!(session.is_empty());
    }
}
