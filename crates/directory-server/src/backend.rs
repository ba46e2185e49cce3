//! Hosted backend client
//!
//! The directory reads live businesses from, and writes new ones to, a hosted
//! database/auth service. [`Backend`] is the seam; [`crate::storage`] talks to
//! Redis and [`crate::memory`] keeps everything in process.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use localbiz_common::{BusinessRecord, NewBusiness, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Signed-in user as reported by the auth service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
}

impl User {
    pub fn new(email: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            display_name: display_name.into(),
        }
    }
}

/// A business created through the form, as stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredBusiness {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub record: BusinessRecord,
}

impl StoredBusiness {
    pub fn new(new: NewBusiness, owner: &User) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: owner.id,
            created_at: Utc::now(),
            record: new.record,
        }
    }

    /// Site-relative path of the business page
    pub fn path(&self) -> String {
        format!("/business/{}", self.id)
    }
}

#[async_trait]
pub trait Backend: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<StoredBusiness>>;

    /// Store a new business owned by `owner`
    ///
    /// Fails with [`localbiz_common::Error::Conflict`] when the slug is taken.
    async fn create(&self, new: NewBusiness, owner: &User) -> Result<StoredBusiness>;

    /// Resolve a session token to its user
    async fn get_current_user(&self, session_token: &str) -> Result<Option<User>>;

    async fn health_check(&self) -> Result<()>;
}
