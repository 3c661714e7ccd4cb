//! JSON shapes handed to the front end.

use serde_json::json;

use crate::model::{Class, Student, Teacher};

pub const NO_SUBJECTS: &str = "No subjects enrolled";

pub fn subjects_summary(s: &Student) -> String {
    if s.subject_count() == 0 {
        return NO_SUBJECTS.to_string();
    }
    s.enrolled_subject_names().join(", ")
}

pub fn student(s: &Student) -> serde_json::Value {
    json!({
        "id": s.id,
        "userId": s.user_id,
        "externalId": s.student_id,
        "firstName": s.first_name,
        "middleName": s.middle_name,
        "lastName": s.last_name,
        "fullName": s.full_name(),
        "email": s.email,
        "department": s.department,
        "administrativeClassId": s.administrative_class.as_ref().map(|c| c.id),
        "administrativeClassName": s.administrative_class.as_ref().map(|c| c.name.clone()),
        "enrolledSubjectIds": s.enrolled_subject_ids(),
        "enrolledSubjectNames": s.enrolled_subject_names(),
        "subjectCount": s.subject_count(),
        "subjectsDisplay": subjects_summary(s),
    })
}

pub fn teacher(t: &Teacher) -> serde_json::Value {
    let mut v = serde_json::to_value(t).unwrap_or_else(|_| json!({}));
    v["fullName"] = json!(t.full_name());
    v
}

pub fn class(c: &Class) -> serde_json::Value {
    serde_json::to_value(c).unwrap_or_else(|_| json!({ "id": c.id }))
}
