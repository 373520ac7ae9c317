//! Letting the requester pick one of several search results.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, info};

use crate::models::Track;
use crate::source::Resolution;

/// Reaction options, in candidate order.
pub const OPTIONS: [&str; 5] = ["1️⃣", "2️⃣", "3️⃣", "4️⃣", "5️⃣"];

pub const MAX_CANDIDATES: usize = OPTIONS.len();

pub fn option_index(emoji: &str) -> Option<usize> {
    OPTIONS.iter().position(|option| *option == emoji)
}

/// The options to offer for `count` candidates.
pub fn options_for(count: usize) -> &'static [&'static str] {
    &OPTIONS[..count.min(MAX_CANDIDATES)]
}

/// Waits up to `timeout` for `pick` and returns the chosen candidate.
///
/// A timeout, an abandoned pick or an index outside the offered options all
/// mean nothing was chosen.
pub async fn choose<F>(candidates: &[Track], pick: F, timeout: Duration) -> Option<Track>
where
    F: Future<Output = Option<usize>>,
{
    let offered = candidates.len().min(MAX_CANDIDATES);

    match tokio::time::timeout(timeout, pick).await {
        Ok(Some(index)) if index < offered => Some(candidates[index].clone()),
        Ok(Some(index)) => {
            debug!("Ignoring out of range pick {index}");
            None
        }
        Ok(None) => None,
        Err(_) => {
            info!("Track selection timed out after {timeout:?}");
            None
        }
    }
}

/// What to do with a [`Resolution`] before anything is enqueued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settled {
    /// Enqueue these as they are.
    Ready(Vec<Track>),
    /// Ask the requester to pick one; never more than [`MAX_CANDIDATES`].
    Choose(Vec<Track>),
    Nothing,
}

/// Playlists and single matches go straight to the queue, several
/// candidates need a pick.
pub fn settle(resolution: Resolution) -> Settled {
    match resolution {
        Resolution::Playlist(tracks) | Resolution::Candidates(tracks) if tracks.is_empty() => Settled::Nothing,
        Resolution::Playlist(tracks) => Settled::Ready(tracks),
        Resolution::Candidates(tracks) if tracks.len() == 1 => Settled::Ready(tracks),
        Resolution::Candidates(mut tracks) => {
            tracks.truncate(MAX_CANDIDATES);
            Settled::Choose(tracks)
        }
    }
}
