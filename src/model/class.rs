use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::ParseTagError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClassType {
    Administrative,
    Subject,
}

impl ClassType {
    pub fn as_str(self) -> &'static str {
        match self {
            ClassType::Administrative => "ADMINISTRATIVE",
            ClassType::Subject => "SUBJECT",
        }
    }
}

impl FromStr for ClassType {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMINISTRATIVE" => Ok(ClassType::Administrative),
            "SUBJECT" => Ok(ClassType::Subject),
            _ => Err(ParseTagError {
                kind: "class type",
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for ClassType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Infers the class type from its human-entered name.
///
/// A non-blank subject code always wins. Otherwise the name is matched
/// against the usual home-room shapes ("Class 10A", "10A", "Grade 10",
/// "Section A", "A10", anything mentioning a room). Names of five
/// characters or fewer are treated as administrative as well, which also
/// catches short subject names such as "Math".
pub fn classify(name: Option<&str>, subject_code: Option<&str>) -> ClassType {
    if has_subject_code(subject_code) {
        return ClassType::Subject;
    }
    let Some(raw) = name else {
        return ClassType::Subject;
    };
    let n = raw.trim().to_lowercase();
    let administrative = is_class_number(&n)
        || is_number_letter(&n)
        || is_grade(&n)
        || is_section(&n)
        || is_letter_number(&n)
        || n.contains("homeroom")
        || n.contains("room")
        || raw.chars().count() <= 5;
    if administrative {
        ClassType::Administrative
    } else {
        ClassType::Subject
    }
}

fn has_subject_code(code: Option<&str>) -> bool {
    code.map(|c| !c.trim().is_empty()).unwrap_or(false)
}

// Same set as a `\s` regex class.
fn is_regex_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0B' | '\x0C' | '\r')
}

fn after_keyword<'a>(s: &'a str, keyword: &str) -> Option<&'a str> {
    s.strip_prefix(keyword)
        .map(|rest| rest.trim_start_matches(is_regex_space))
}

/// Splits a leading run of ASCII digits off `s`.
fn split_digits(s: &str) -> (&str, &str) {
    let end = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    s.split_at(end)
}

fn is_single_letter(s: &str) -> bool {
    let mut chars = s.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_lowercase())
}

// class\s*\d+[a-z]?
fn is_class_number(n: &str) -> bool {
    let Some(rest) = after_keyword(n, "class") else {
        return false;
    };
    let (digits, tail) = split_digits(rest);
    !digits.is_empty() && (tail.is_empty() || is_single_letter(tail))
}

// \d+[a-z]
fn is_number_letter(n: &str) -> bool {
    let (digits, tail) = split_digits(n);
    !digits.is_empty() && is_single_letter(tail)
}

// grade\s*\d+
fn is_grade(n: &str) -> bool {
    let Some(rest) = after_keyword(n, "grade") else {
        return false;
    };
    let (digits, tail) = split_digits(rest);
    !digits.is_empty() && tail.is_empty()
}

// section\s*[a-z]
fn is_section(n: &str) -> bool {
    after_keyword(n, "section")
        .map(is_single_letter)
        .unwrap_or(false)
}

// [a-z]\d+
fn is_letter_number(n: &str) -> bool {
    let mut chars = n.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {
            let rest = chars.as_str();
            !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit())
        }
        _ => false,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: i64,
    class_name: Option<String>,
    class_type: ClassType,
    subject_code: Option<String>,
    pub room_number: Option<String>,
    pub schedule: Option<String>,
    pub teacher_id: Option<i64>,
    pub teacher_name: Option<String>,
    pub student_count: i64,
}

impl Default for Class {
    fn default() -> Self {
        Class {
            id: 0,
            class_name: None,
            class_type: ClassType::Subject,
            subject_code: None,
            room_number: None,
            schedule: None,
            teacher_id: None,
            teacher_name: None,
            student_count: 0,
        }
    }
}

impl Class {
    pub fn new(id: i64, class_name: impl Into<String>) -> Self {
        let mut c = Class {
            id,
            ..Default::default()
        };
        c.set_class_name(class_name);
        c
    }

    /// Rebuilds a class from stored columns without re-deriving its type.
    pub fn restore(
        id: i64,
        class_name: String,
        class_type: ClassType,
        subject_code: Option<String>,
    ) -> Self {
        Class {
            id,
            class_name: Some(class_name),
            class_type,
            subject_code,
            ..Default::default()
        }
    }

    pub fn class_name(&self) -> &str {
        self.class_name.as_deref().unwrap_or("")
    }

    pub fn class_type(&self) -> ClassType {
        self.class_type
    }

    pub fn subject_code(&self) -> Option<&str> {
        self.subject_code.as_deref()
    }

    pub fn is_administrative(&self) -> bool {
        self.class_type == ClassType::Administrative
    }

    /// Sets the name and re-derives the type, unless a subject code pins it.
    pub fn set_class_name(&mut self, class_name: impl Into<String>) {
        let name = class_name.into();
        self.class_type = classify(Some(&name), self.subject_code.as_deref());
        self.class_name = Some(name);
    }

    /// A non-blank code forces `Subject`; a blank one leaves the type alone
    /// until the name is set again.
    pub fn set_subject_code(&mut self, subject_code: Option<String>) {
        if has_subject_code(subject_code.as_deref()) {
            self.class_type = ClassType::Subject;
        }
        self.subject_code = subject_code;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn by_name(name: &str) -> ClassType {
        classify(Some(name), None)
    }

    #[test]
    fn home_room_shapes_are_administrative() {
        for name in [
            "Class 10A",
            "class10",
            "10A",
            "Grade 10",
            "grade12",
            "Section A",
            "A10",
            "Homeroom 3",
            "Science Room Block",
        ] {
            assert_eq!(by_name(name), ClassType::Administrative, "{}", name);
        }
    }

    #[test]
    fn long_course_titles_are_subjects() {
        assert_eq!(by_name("Introduction to Programming"), ClassType::Subject);
        assert_eq!(by_name("Advanced Biology"), ClassType::Subject);
        assert_eq!(by_name("Class 10AB"), ClassType::Subject);
        assert_eq!(by_name("Grade Ten Music"), ClassType::Subject);
    }

    #[test]
    fn short_names_fall_into_administrative() {
        // Known quirk of the length rule: short course names look like home rooms.
        assert_eq!(by_name("Math"), ClassType::Administrative);
        assert_eq!(by_name("PE"), ClassType::Administrative);
        assert_eq!(by_name("Music"), ClassType::Administrative);
        assert_eq!(by_name("Physics"), ClassType::Subject);
    }

    #[test]
    fn length_rule_counts_untrimmed_name() {
        assert_eq!(by_name("  Art   "), ClassType::Subject);
        assert_eq!(by_name(" Art "), ClassType::Administrative);
    }

    #[test]
    fn missing_name_is_subject() {
        assert_eq!(classify(None, None), ClassType::Subject);
    }

    #[test]
    fn subject_code_overrides_name() {
        assert_eq!(classify(Some("Class 10A"), Some("MTH101")), ClassType::Subject);
        assert_eq!(classify(Some("Class 10A"), Some("  ")), ClassType::Administrative);

        let mut before = Class::default();
        before.set_subject_code(Some("MTH101".into()));
        before.set_class_name("Class 10A");
        assert_eq!(before.class_type(), ClassType::Subject);

        let mut after = Class::new(1, "Class 10A");
        assert_eq!(after.class_type(), ClassType::Administrative);
        after.set_subject_code(Some("MTH101".into()));
        assert_eq!(after.class_type(), ClassType::Subject);
    }

    #[test]
    fn clearing_subject_code_waits_for_next_rename() {
        let mut c = Class::new(1, "Grade 9");
        c.set_subject_code(Some("BIO9".into()));
        c.set_subject_code(None);
        assert_eq!(c.class_type(), ClassType::Subject);
        c.set_class_name("Grade 9");
        assert_eq!(c.class_type(), ClassType::Administrative);
    }
}
