mod attendance;
mod class;
mod notification;
mod student;
mod teacher;
mod user;

pub use attendance::{Attendance, AttendanceStatus};
pub use class::{classify, Class, ClassType};
pub use notification::{Notification, NotificationType};
pub use student::{ClassRef, Student, SubjectEnrollment};
pub use teacher::Teacher;
pub use user::{Role, User};

/// Joins name parts, skipping a blank middle name.
pub fn compose_full_name(first: &str, middle: Option<&str>, last: &str) -> String {
    match middle.map(str::trim).filter(|m| !m.is_empty()) {
        Some(m) => format!("{} {} {}", first, m, last),
        None => format!("{} {}", first, last),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTagError {
    pub kind: &'static str,
    pub value: String,
}

impl std::fmt::Display for ParseTagError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown {}: {}", self.kind, self.value)
    }
}

impl std::error::Error for ParseTagError {}
