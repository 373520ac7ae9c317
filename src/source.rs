use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{info, warn};

use crate::error::{MusicError, MusicResult};
use crate::models::{Track, UNKNOWN_TRACK_TITLE};

/// What a query turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Every track is wanted, in order.
    Playlist(Vec<Track>),
    /// Alternatives for a single request; more than one needs a pick.
    Candidates(Vec<Track>),
}

impl Resolution {
    pub fn tracks(&self) -> &[Track] {
        match self {
            Resolution::Playlist(tracks) | Resolution::Candidates(tracks) => tracks,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tracks().is_empty()
    }
}

/// Turns user input into playable tracks.
#[async_trait]
pub trait TrackSource: Send + Sync {
    /// Fails with [`MusicError::NoTracksFound`] when nothing matched.
    async fn resolve(&self, query: &str) -> MusicResult<Resolution>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Url(String),
    Search(String),
}

/// Strips Discord's `<...>` embed suppression and tells links from search terms.
pub fn normalize_query(input: &str) -> Query {
    let query = input.trim().trim_start_matches('<').trim_end_matches('>').trim();
    let lowercase = query.to_lowercase();

    if lowercase.starts_with("http://") || lowercase.starts_with("https://") || lowercase.starts_with("www.") {
        Query::Url(query.to_string())
    } else {
        Query::Search(query.to_string())
    }
}

pub fn is_playlist_url(url: &str) -> bool {
    url.contains("&list=") || url.contains("?list=")
}

#[derive(Deserialize)]
struct YtDlpEntry {
    title: Option<String>,
    webpage_url: Option<String>,
    url: Option<String>,
    duration: Option<f64>,
}

impl YtDlpEntry {
    fn into_track(self) -> Option<Track> {
        let url = self.webpage_url.or(self.url)?;
        let duration = self
            .duration
            .filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
            .map(Duration::from_secs_f64);

        Some(Track {
            title: self.title.unwrap_or_else(|| UNKNOWN_TRACK_TITLE.to_string()),
            url,
            duration,
        })
    }
}

/// Parses `yt-dlp -j` output, one JSON object per line.
pub fn parse_tracks(output: &str) -> Vec<Track> {
    let lines: Vec<&str> = output.lines().filter(|line| !line.trim().is_empty()).collect();

    let tracks = lines
        .iter()
        .filter_map(|line| {
            let entry: YtDlpEntry = serde_json::from_str(line).ok()?;
            entry.into_track()
        })
        .collect::<Vec<Track>>();

    if tracks.len() < lines.len() {
        warn!("Skipped {} yt-dlp entries that could not be parsed", lines.len() - tracks.len());
    }

    tracks
}

pub struct YtDlpSource {
    binary: String,
    search_candidates: usize,
}

impl YtDlpSource {
    pub fn new(binary: impl Into<String>, search_candidates: usize) -> Self {
        YtDlpSource {
            binary: binary.into(),
            search_candidates: search_candidates.max(1),
        }
    }

    async fn run(&self, target: &str) -> MusicResult<Vec<Track>> {
        info!("Looking up {target} with {}", self.binary);

        let output = Command::new(&self.binary)
            .arg("-j")
            .arg("--flat-playlist")
            .arg(target)
            .output()
            .await
            .map_err(|why| MusicError::Source(format!("could not start {}: {why}", self.binary)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);

        if !output.status.success() && stdout.trim().is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MusicError::Source(stderr.trim().to_string()));
        }

        Ok(parse_tracks(&stdout))
    }
}

#[async_trait]
impl TrackSource for YtDlpSource {
    async fn resolve(&self, query: &str) -> MusicResult<Resolution> {
        let resolution = match normalize_query(query) {
            Query::Url(url) => {
                let tracks = self.run(&url).await?;

                if is_playlist_url(&url) {
                    Resolution::Playlist(tracks)
                } else {
                    Resolution::Candidates(tracks)
                }
            }
            Query::Search(terms) if terms.is_empty() => return Err(MusicError::NoTracksFound),
            Query::Search(terms) => {
                let target = format!("ytsearch{}:{terms}", self.search_candidates);
                Resolution::Candidates(self.run(&target).await?)
            }
        };

        if resolution.is_empty() {
            return Err(MusicError::NoTracksFound);
        }

        Ok(resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_are_detected_and_unwrapped() {
        assert_eq!(
            normalize_query("<https://youtu.be/abc>"),
            Query::Url("https://youtu.be/abc".to_string())
        );
        assert_eq!(normalize_query("  www.example.com/x "), Query::Url("www.example.com/x".to_string()));
        assert_eq!(normalize_query("never gonna"), Query::Search("never gonna".to_string()));
    }

    #[test]
    fn playlist_links_are_recognized() {
        assert!(is_playlist_url("https://www.youtube.com/watch?v=x&list=PL1"));
        assert!(is_playlist_url("https://www.youtube.com/playlist?list=PL1"));
        assert!(!is_playlist_url("https://www.youtube.com/watch?v=x"));
    }

    #[test]
    fn yt_dlp_lines_become_tracks() {
        let output = concat!(
            r#"{"_type":"url","title":"First","url":"https://www.youtube.com/watch?v=1","duration":212.0}"#,
            "\n",
            r#"{"title":"Second","webpage_url":"https://www.youtube.com/watch?v=2","url":"https://cdn/2"}"#,
            "\n",
        );

        let tracks = parse_tracks(output);

        assert_eq!(
            tracks,
            vec![
                Track::new("First", "https://www.youtube.com/watch?v=1", Some(Duration::from_secs(212))),
                Track::new("Second", "https://www.youtube.com/watch?v=2", None),
            ]
        );
    }

    #[test]
    fn broken_lines_are_skipped() {
        let output = "not json\n{\"title\":\"No link\"}\n{\"url\":\"https://x\"}\n";

        let tracks = parse_tracks(output);

        assert_eq!(tracks, vec![Track::new(UNKNOWN_TRACK_TITLE, "https://x", None)]);
    }

    #[tokio::test]
    async fn empty_search_finds_nothing() {
        let source = YtDlpSource::new("yt-dlp", 5);

        assert!(matches!(source.resolve("  <> ").await, Err(MusicError::NoTracksFound)));
    }

    #[tokio::test]
    async fn missing_binary_is_a_source_error() {
        let source = YtDlpSource::new("/nonexistent/yt-dlp-binary", 5);

        assert!(matches!(source.resolve("anything").await, Err(MusicError::Source(_))));
    }
}
