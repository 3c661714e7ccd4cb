use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::model::{Role, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ActiveView {
    Login,
    Dashboard,
}

/// The signed-in user and the view the front end is showing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Uuid,
    pub user: User,
    pub opened_at: DateTime<Utc>,
    pub active_view: ActiveView,
}

impl Session {
    pub fn open(user: User) -> Self {
        Session {
            id: Uuid::new_v4(),
            user,
            opened_at: Utc::now(),
            active_view: ActiveView::Login,
        }
    }

    pub fn role(&self) -> Role {
        self.user.role
    }

    pub fn user_id(&self) -> i64 {
        self.user.id
    }

    /// An empty list admits every role.
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.is_empty() || roles.contains(&self.user.role)
    }
}
