use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::ids::{InternalUserId, LogicalUserId};

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: InternalUserId,
    pub user_id: LogicalUserId,
    pub email: String,
    pub password_hash: String,
    pub fornavn: Option<String>,
    pub etternavn: Option<String>,
    pub adresse: Option<String>,
    pub postnr: Option<String>,
    pub sted: Option<String>,
    pub mobil: Option<String>,
    pub admin_user: bool,
    pub created_at: DateTime<Utc>,
}

/// User as exposed to the client. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub user_id: LogicalUserId,
    pub email: String,
    pub fornavn: Option<String>,
    pub etternavn: Option<String>,
    pub adresse: Option<String>,
    pub postnr: Option<String>,
    pub sted: Option<String>,
    pub mobil: Option<String>,
    pub admin_user: bool,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            email: user.email,
            fornavn: user.fornavn,
            etternavn: user.etternavn,
            adresse: user.adresse,
            postnr: user.postnr,
            sted: user.sted,
            mobil: user.mobil,
            admin_user: user.admin_user,
        }
    }
}

/// Partial profile update. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub fornavn: Option<String>,
    pub etternavn: Option<String>,
    pub adresse: Option<String>,
    pub postnr: Option<String>,
    pub sted: Option<String>,
    pub mobil: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.fornavn.is_none()
            && self.etternavn.is_none()
            && self.adresse.is_none()
            && self.postnr.is_none()
            && self.sted.is_none()
            && self.mobil.is_none()
    }
}
