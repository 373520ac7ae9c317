use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

/// Guild-keyed store of per-room players.
///
/// Each entry sits behind its own mutex, so commands against one guild are
/// serialized while other guilds proceed untouched.
pub struct SessionRegistry<P> {
    servers: HashMap<u64, Arc<Mutex<P>>>,
}

impl<P> SessionRegistry<P> {
    pub fn new() -> Self {
        SessionRegistry {
            servers: HashMap::new(),
        }
    }

    pub fn get(&self, guild_id: u64) -> Option<Arc<Mutex<P>>> {
        self.servers.get(&guild_id).cloned()
    }

    pub fn get_or_insert_with<F>(&mut self, guild_id: u64, create: F) -> Arc<Mutex<P>>
    where
        F: FnOnce() -> P,
    {
        self.servers
            .entry(guild_id)
            .or_insert_with(|| Arc::new(Mutex::new(create())))
            .clone()
    }

    /// Forgets the guild's player; the caller tears it down.
    pub fn remove(&mut self, guild_id: u64) -> Option<Arc<Mutex<P>>> {
        self.servers.remove(&guild_id)
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}

impl<P> Default for SessionRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Track;
    use crate::session::PlaybackSession;

    #[tokio::test]
    async fn sessions_are_created_once_per_guild() {
        let mut registry: SessionRegistry<PlaybackSession> = SessionRegistry::new();

        let first = registry.get_or_insert_with(1, PlaybackSession::new);
        first.lock().await.enqueue([Track::new("A", "https://a", None)]);

        let again = registry.get_or_insert_with(1, || panic!("should reuse the existing session"));

        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(again.lock().await.len(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn guilds_do_not_share_state() {
        let mut registry: SessionRegistry<PlaybackSession> = SessionRegistry::new();

        let one = registry.get_or_insert_with(1, PlaybackSession::new);
        let two = registry.get_or_insert_with(2, PlaybackSession::new);
        one.lock().await.enqueue([Track::new("A", "https://a", None)]);

        assert!(two.lock().await.is_empty());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn remove_forgets_the_guild() {
        let mut registry: SessionRegistry<PlaybackSession> = SessionRegistry::default();
        registry.get_or_insert_with(9, PlaybackSession::new);

        assert!(registry.remove(9).is_some());
        assert!(registry.get(9).is_none());
        assert!(registry.remove(9).is_none());
        assert!(registry.is_empty());
    }
}
