// User entity
// Level and experience are only ever changed by the leveling service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::Uid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub uid: Uid,
    pub username: String,
    pub email: String,
    pub level: i32,
    pub experience: i64,
    pub total_spent: i64,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
}

impl NewUser {
    pub fn normalized(&self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_lowercase(),
        }
    }
}
