use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::ParseTagError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    #[default]
    Announcement,
    AttendanceAlert,
    Reminder,
    System,
}

impl NotificationType {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationType::Announcement => "ANNOUNCEMENT",
            NotificationType::AttendanceAlert => "ATTENDANCE_ALERT",
            NotificationType::Reminder => "REMINDER",
            NotificationType::System => "SYSTEM",
        }
    }
}

impl FromStr for NotificationType {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ANNOUNCEMENT" => Ok(NotificationType::Announcement),
            "ATTENDANCE_ALERT" => Ok(NotificationType::AttendanceAlert),
            "REMINDER" => Ok(NotificationType::Reminder),
            "SYSTEM" => Ok(NotificationType::System),
            _ => Err(ParseTagError {
                kind: "notification type",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub sender_name: String,
    pub title: String,
    pub message: String,
    timestamp: DateTime<Utc>,
    read: bool,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
}

impl Notification {
    /// New unsent notification stamped with the current time.
    pub fn new(
        sender_id: i64,
        sender_name: impl Into<String>,
        receiver_id: i64,
        title: impl Into<String>,
        message: impl Into<String>,
        notification_type: NotificationType,
    ) -> Self {
        Notification {
            id: 0,
            sender_id,
            receiver_id,
            sender_name: sender_name.into(),
            title: title.into(),
            message: message.into(),
            timestamp: Utc::now(),
            read: false,
            notification_type,
        }
    }

    /// Rebuilds a stored notification, keeping its original timestamp.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: i64,
        sender_id: i64,
        receiver_id: i64,
        sender_name: String,
        title: String,
        message: String,
        timestamp: DateTime<Utc>,
        read: bool,
        notification_type: NotificationType,
    ) -> Self {
        Notification {
            id,
            sender_id,
            receiver_id,
            sender_name,
            title,
            message,
            timestamp,
            read,
            notification_type,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn is_read(&self) -> bool {
        self.read
    }

    pub fn mark_read(&mut self) {
        self.read = true;
    }
}
