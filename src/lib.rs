//! Music queue core and orchestration for the jukebox bot.
//!
//! [`session::PlaybackSession`] is the pure per-guild queue. [`player::Player`]
//! composes a session with a [`driver::PlaybackDriver`], and
//! [`registry::SessionRegistry`] owns one player per guild. The binary plugs
//! serenity and songbird in at those seams.

pub mod config;
pub mod driver;
pub mod error;
pub mod models;
pub mod player;
pub mod registry;
pub mod render;
pub mod selection;
pub mod session;
pub mod source;
