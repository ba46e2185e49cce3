//! Redis-backed backend client

use async_trait::async_trait;
use localbiz_common::{Error, NewBusiness, Result};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::backend::{Backend, StoredBusiness, User};

const BUSINESS_INDEX: &str = "businesses:all";

fn redis_err(err: redis::RedisError) -> Error {
    Error::Redis(err.to_string())
}

fn business_key(id: Uuid) -> String {
    format!("business:{}", id)
}

fn slug_key(slug: &str) -> String {
    format!("business_slug:{}", slug)
}

fn session_key(token: &str) -> String {
    format!("session:{}", token)
}

/// Businesses and sessions stored in Redis
#[derive(Clone)]
pub struct RedisBackend {
    conn: ConnectionManager,
}

impl RedisBackend {
    /// Create a new storage instance
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url).map_err(redis_err)?;

        let conn = ConnectionManager::new(client).await.map_err(redis_err)?;

        info!("Connected to Redis at {}", redis_url);

        Ok(Self { conn })
    }

    /// Store a session for `user`, expiring after `ttl_secs`
    pub async fn put_session(&self, token: &str, user: &User, ttl_secs: u64) -> Result<()> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(user)?;
        let _: () = redis::cmd("SET")
            .arg(session_key(token))
            .arg(json)
            .arg("EX")
            .arg(ttl_secs)
            .query_async(&mut conn)
            .await
            .map_err(redis_err)?;
        Ok(())
    }
}

#[async_trait]
impl Backend for RedisBackend {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<StoredBusiness>> {
        let mut conn = self.conn.clone();
        let json: Option<String> = conn.get(business_key(id)).await.map_err(redis_err)?;

        match json {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => {
                debug!("Business {} not found", id);
                Ok(None)
            }
        }
    }

    async fn create(&self, new: NewBusiness, owner: &User) -> Result<StoredBusiness> {
        let stored = StoredBusiness::new(new, owner);
        let json = serde_json::to_string(&stored)?;
        let mut conn = self.conn.clone();

        // Reserve the slug first so concurrent creates cannot both win
        let reserved: bool = conn
            .set_nx(slug_key(&stored.record.slug), stored.id.to_string())
            .await
            .map_err(redis_err)?;
        if !reserved {
            debug!("Slug already taken: {}", stored.record.slug);
            return Err(Error::Conflict(format!(
                "A business named '{}' already exists",
                stored.record.name
            )));
        }

        // Record and index land together; on failure the slug is released
        let written: redis::RedisResult<()> = redis::pipe()
            .atomic()
            .set(business_key(stored.id), json)
            .ignore()
            .sadd(BUSINESS_INDEX, stored.id.to_string())
            .ignore()
            .query_async(&mut conn)
            .await;
        if let Err(err) = written {
            warn!(
                "Failed to store business {}, releasing slug {}: {}",
                stored.id, stored.record.slug, err
            );
            let released: redis::RedisResult<()> = redis::pipe()
                .del(slug_key(&stored.record.slug))
                .ignore()
                .del(business_key(stored.id))
                .ignore()
                .query_async(&mut conn)
                .await;
            if let Err(release_err) = released {
                error!(
                    "Failed to release slug {}: {}",
                    stored.record.slug, release_err
                );
            }
            return Err(redis_err(err));
        }

        info!(
            "Created business {} ({}) for owner {}",
            stored.id, stored.record.slug, owner.id
        );
        Ok(stored)
    }

    async fn get_current_user(&self, session_token: &str) -> Result<Option<User>> {
        let mut conn = self.conn.clone();
        let json: Option<String> = conn
            .get(session_key(session_token))
            .await
            .map_err(redis_err)?;

        match json {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }

    async fn health_check(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(redis_err)?;
        Ok(())
    }
}
