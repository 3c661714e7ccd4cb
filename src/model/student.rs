use serde::Serialize;

use super::compose_full_name;

/// Reference to a class by id, with the name it had when loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectEnrollment {
    pub subject_id: i64,
    pub subject_name: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: i64,
    pub user_id: Option<i64>,
    pub student_id: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub email: Option<String>,
    pub department: Option<String>,
    pub administrative_class: Option<ClassRef>,
    enrollments: Vec<SubjectEnrollment>,
}

impl Student {
    pub fn new(id: i64) -> Self {
        Student {
            id,
            ..Default::default()
        }
    }

    pub fn full_name(&self) -> String {
        compose_full_name(
            &self.first_name,
            self.middle_name.as_deref(),
            &self.last_name,
        )
    }

    pub fn set_administrative_class(&mut self, class: Option<ClassRef>) {
        self.administrative_class = class;
    }

    pub fn administrative_class_id(&self) -> Option<i64> {
        self.administrative_class.as_ref().map(|c| c.id)
    }

    pub fn enrollments(&self) -> &[SubjectEnrollment] {
        &self.enrollments
    }

    pub fn is_enrolled_in_subject(&self, subject_id: i64) -> bool {
        self.enrollments.iter().any(|e| e.subject_id == subject_id)
    }

    /// Appends the subject unless already enrolled. Returns whether it was added.
    pub fn add_subject(&mut self, subject_id: i64, subject_name: impl Into<String>) -> bool {
        if self.is_enrolled_in_subject(subject_id) {
            return false;
        }
        self.enrollments.push(SubjectEnrollment {
            subject_id,
            subject_name: subject_name.into(),
        });
        true
    }

    /// Drops the enrollment for `subject_id`. Returns whether anything was removed.
    pub fn remove_subject(&mut self, subject_id: i64) -> bool {
        match self
            .enrollments
            .iter()
            .position(|e| e.subject_id == subject_id)
        {
            Some(idx) => {
                self.enrollments.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn enrolled_subject_ids(&self) -> Vec<i64> {
        self.enrollments.iter().map(|e| e.subject_id).collect()
    }

    pub fn enrolled_subject_names(&self) -> Vec<&str> {
        self.enrollments
            .iter()
            .map(|e| e.subject_name.as_str())
            .collect()
    }

    pub fn subject_count(&self) -> usize {
        self.enrollments.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_subject_is_idempotent() {
        let mut s = Student::new(1);
        assert!(s.add_subject(10, "Algebra"));
        assert!(!s.add_subject(10, "Algebra"));
        assert!(!s.add_subject(10, "Renamed Algebra"));
        assert_eq!(s.enrolled_subject_ids(), vec![10]);
        assert_eq!(s.enrolled_subject_names(), vec!["Algebra"]);
        assert_eq!(s.subject_count(), 1);
    }

    #[test]
    fn remove_unknown_subject_is_noop() {
        let mut s = Student::new(1);
        s.add_subject(10, "Algebra");
        assert!(!s.remove_subject(99));
        assert_eq!(s.enrolled_subject_ids(), vec![10]);
        assert_eq!(s.subject_count(), 1);

        let mut empty = Student::new(2);
        assert!(!empty.remove_subject(10));
        assert!(!empty.remove_subject(10));
        assert_eq!(empty.subject_count(), 0);
    }

    #[test]
    fn enroll_then_drop_keeps_ids_and_names_aligned() {
        let mut s = Student::new(1);
        s.add_subject(10, "Algebra");
        s.add_subject(11, "Biology");
        assert!(s.remove_subject(10));
        assert_eq!(s.enrolled_subject_ids(), vec![11]);
        assert_eq!(s.enrolled_subject_names(), vec!["Biology"]);
        assert_eq!(s.subject_count(), 1);
    }

    #[test]
    fn insertion_order_is_preserved() {
        let mut s = Student::new(1);
        for (id, name) in [(3, "Chemistry"), (1, "Art"), (2, "Biology")] {
            s.add_subject(id, name);
        }
        assert_eq!(s.enrolled_subject_ids(), vec![3, 1, 2]);
        s.remove_subject(1);
        assert_eq!(s.enrolled_subject_names(), vec!["Chemistry", "Biology"]);
    }

    #[test]
    fn administrative_class_is_single_valued() {
        let mut s = Student::new(1);
        assert_eq!(s.administrative_class_id(), None);
        s.set_administrative_class(Some(ClassRef {
            id: 5,
            name: "Class 10A".into(),
        }));
        s.set_administrative_class(Some(ClassRef {
            id: 6,
            name: "Class 10B".into(),
        }));
        assert_eq!(s.administrative_class_id(), Some(6));
        s.set_administrative_class(None);
        assert_eq!(s.administrative_class_id(), None);
    }

    #[test]
    fn full_name_uses_middle_only_when_present() {
        let mut s = Student::new(1);
        s.first_name = "Grace".into();
        s.last_name = "Hopper".into();
        s.middle_name = Some(" ".into());
        assert_eq!(s.full_name(), "Grace Hopper");
        s.middle_name = Some("Brewster".into());
        assert_eq!(s.full_name(), "Grace Brewster Hopper");
    }
}
