//! Row mapping and queries for each entity table.

pub mod attendance;
pub mod classes;
pub mod notifications;
pub mod students;
pub mod teachers;
pub mod users;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

use crate::model::{AttendanceStatus, ClassType, NotificationType, Role};

macro_rules! tag_column {
    ($ty:ty) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

tag_column!(Role);
tag_column!(ClassType);
tag_column!(AttendanceStatus);
tag_column!(NotificationType);

