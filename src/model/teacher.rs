use serde::Serialize;

use super::compose_full_name;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: i64,
    pub user_id: Option<i64>,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub email: Option<String>,
    pub department: Option<String>,
    pub phone: Option<String>,
    /// Denormalized; `store::teachers::sync_class_counts` recomputes it.
    pub classes_assigned: i64,
}

impl Teacher {
    pub fn full_name(&self) -> String {
        compose_full_name(
            &self.first_name,
            self.middle_name.as_deref(),
            &self.last_name,
        )
    }
}
