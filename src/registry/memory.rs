//! Memory storage
//!
//! Will be destroyed on system shutdown

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::links::LinkRecord;
use crate::users::User;

use super::AliasRegistry;
use super::CreateUserValues;
use super::Error;
use super::Result;
use super::UserDirectory;

/// An in-memory storage
///
/// Will be destroyed on system shutdown
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// All users in storage
    users: Arc<Mutex<HashMap<Uuid, User>>>,

    /// All links in storage, by alias
    links: Arc<Mutex<HashMap<String, LinkRecord>>>,
}

impl Memory {
    /// Create a new empty Memory storage
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AliasRegistry for Memory {
    async fn put(&self, record: &LinkRecord) -> Result<()> {
        self.links
            .lock()
            .await
            .insert(record.alias.clone(), record.clone());

        Ok(())
    }

    async fn get(&self, alias: &str) -> Result<Option<LinkRecord>> {
        Ok(self.links.lock().await.get(alias).cloned())
    }

    async fn query_by_owner(&self, owner_id: &Uuid) -> Result<Vec<LinkRecord>> {
        let mut links = self
            .links
            .lock()
            .await
            .values()
            .filter(|link| link.owner_id.as_ref() == Some(owner_id))
            .cloned()
            .collect::<Vec<LinkRecord>>();

        links.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.alias.cmp(&b.alias))
        });

        Ok(links)
    }

    async fn close(&self) {}
}

#[async_trait]
impl UserDirectory for Memory {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .await
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn find_user_by_id(&self, id: &Uuid) -> Result<Option<User>> {
        Ok(self.users.lock().await.get(id).cloned())
    }

    async fn create_user(&self, values: &CreateUserValues<'_>) -> Result<User> {
        let mut users = self.users.lock().await;

        // same guarantee as the unique index in Postgres
        if users.values().any(|user| user.email == values.email) {
            return Err(Error::DuplicateEmail(values.email.to_string()));
        }

        let user = User {
            id: Uuid::new_v4(),
            session_id: *values.session_id,
            email: values.email.to_string(),
            hashed_password: values.hashed_password.to_string(),
            created_at: Utc::now().naive_utc(),
        };

        users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn rotate_session(&self, user: &User, session_id: &Uuid) -> Result<User> {
        self.users
            .lock()
            .await
            .get_mut(&user.id)
            .map(|user| {
                user.session_id = *session_id;

                user.clone()
            })
            .ok_or_else(|| Error::Connection(format!("Unknown user: {}", user.id)))
    }
}
