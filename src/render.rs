//! Plain-text messages for the chat commands.

use std::time::Duration;

use crate::error::QueueError;
use crate::models::Track;
use crate::selection::MAX_CANDIDATES;
use crate::session::PlaybackSession;

pub fn format_duration(duration: Duration) -> String {
    let seconds = duration.as_secs();
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let display_seconds = seconds % 60;

    if hours > 0 {
        format!("{hours}:{minutes:0>2}:{display_seconds:0>2}")
    } else {
        format!("{minutes}:{display_seconds:0>2}")
    }
}

pub fn track_line(track: &Track) -> String {
    match track.duration {
        Some(duration) => format!("{} ({})", track.title, format_duration(duration)),
        None => track.title.clone(),
    }
}

pub fn now_playing(track: &Track) -> String {
    format!("Playing song [{}]({})", track_line(track), track.url)
}

/// The current track followed by up to `limit` upcoming ones.
pub fn queue_summary(session: &PlaybackSession, limit: usize) -> Result<String, QueueError> {
    let current = session.current_track()?;
    let upcoming = session.upcoming()?;

    let mut message = String::from("**Currently playing**\n");
    match current {
        Some(track) => message.push_str(&track_line(track)),
        None => message.push_str("Nothing, the queue has ended"),
    }

    if !upcoming.is_empty() && limit > 0 {
        let lines = upcoming
            .iter()
            .take(limit)
            .enumerate()
            .map(|(index, track)| format!("{} - {}", index + 1, track_line(track)))
            .collect::<Vec<String>>()
            .join("\n");

        message.push_str(&format!("\n**Next up**\n```{lines}```"));

        if upcoming.len() > limit {
            message.push_str(&format!("...and {} more", upcoming.len() - limit));
        }
    }

    message.push_str(&format!("\nRepeat: {}", session.repeat_mode()));

    Ok(message)
}

pub fn playback_status(volume: u8, paused: bool) -> String {
    if paused {
        format!("Volume: {volume}% (paused)")
    } else {
        format!("Volume: {volume}%")
    }
}

pub fn selection_prompt(candidates: &[Track]) -> String {
    let options = candidates
        .iter()
        .take(MAX_CANDIDATES)
        .enumerate()
        .map(|(index, track)| format!("**{}.** {}", index + 1, track_line(track)))
        .collect::<Vec<String>>()
        .join("\n");

    format!("**Choose a song**\n{options}")
}
