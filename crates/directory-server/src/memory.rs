//! In-process backend client for development and tests
//!
//! Mirrors the Redis key layout with plain maps: businesses by id, a slug
//! reservation map, and session tokens.

use async_trait::async_trait;
use localbiz_common::{Error, NewBusiness, Result};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::backend::{Backend, StoredBusiness, User};

#[derive(Default)]
struct State {
    businesses: HashMap<Uuid, StoredBusiness>,
    slugs: HashMap<String, Uuid>,
    sessions: HashMap<String, User>,
}

#[derive(Default)]
pub struct InMemoryBackend {
    state: Mutex<State>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a session token for `user`
    pub fn with_session(mut self, token: impl Into<String>, user: User) -> Self {
        self.state.get_mut().sessions.insert(token.into(), user);
        self
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.businesses.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl Backend for InMemoryBackend {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<StoredBusiness>> {
        let state = self.state.lock().await;
        Ok(state.businesses.get(&id).cloned())
    }

    async fn create(&self, new: NewBusiness, owner: &User) -> Result<StoredBusiness> {
        let mut state = self.state.lock().await;

        if state.slugs.contains_key(new.slug()) {
            debug!("Slug already taken: {}", new.slug());
            return Err(Error::Conflict(format!(
                "A business named '{}' already exists",
                new.record.name
            )));
        }

        let stored = StoredBusiness::new(new, owner);
        state.slugs.insert(stored.record.slug.clone(), stored.id);
        state.businesses.insert(stored.id, stored.clone());

        info!(
            "Created business {} ({}) for owner {}",
            stored.id, stored.record.slug, owner.id
        );
        Ok(stored)
    }

    async fn get_current_user(&self, session_token: &str) -> Result<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.sessions.get(session_token).cloned())
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
