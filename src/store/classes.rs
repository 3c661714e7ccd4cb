use rusqlite::{Connection, OptionalExtension, Row};

use crate::model::{compose_full_name, Class, ClassType};

// Members are counted the way a roster resolves them: home-room students
// for administrative classes, enrollments for subject classes.
const SELECT: &str = "SELECT
       c.id,
       c.class_name,
       c.class_type,
       c.subject_code,
       c.room_number,
       c.schedule,
       c.teacher_id,
       t.first_name,
       t.middle_name,
       t.last_name,
       CASE c.class_type
         WHEN 'ADMINISTRATIVE' THEN
           (SELECT COUNT(*) FROM students s WHERE s.administrative_class_id = c.id)
         ELSE
           (SELECT COUNT(*) FROM student_subjects ss WHERE ss.class_id = c.id)
       END AS student_count
     FROM classes c
     LEFT JOIN teachers t ON t.id = c.teacher_id";

fn from_row(r: &Row<'_>) -> rusqlite::Result<Class> {
    let mut class = Class::restore(r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?);
    class.room_number = r.get(4)?;
    class.schedule = r.get(5)?;
    class.teacher_id = r.get(6)?;
    let first: Option<String> = r.get(7)?;
    let middle: Option<String> = r.get(8)?;
    let last: Option<String> = r.get(9)?;
    class.teacher_name = match (first, last) {
        (Some(f), Some(l)) => Some(compose_full_name(&f, middle.as_deref(), &l)),
        _ => None,
    };
    class.student_count = r.get(10)?;
    Ok(class)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ClassFilter {
    pub class_type: Option<ClassType>,
    pub teacher_id: Option<i64>,
}

pub fn list(conn: &Connection, filter: ClassFilter) -> rusqlite::Result<Vec<Class>> {
    let sql = format!(
        "{}
         WHERE (?1 IS NULL OR c.class_type = ?1)
           AND (?2 IS NULL OR c.teacher_id = ?2)
         ORDER BY c.class_name",
        SELECT
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map((filter.class_type, filter.teacher_id), from_row)?;
    rows.collect()
}

pub fn get(conn: &Connection, id: i64) -> rusqlite::Result<Option<Class>> {
    let sql = format!("{} WHERE c.id = ?", SELECT);
    conn.query_row(&sql, [id], from_row).optional()
}

pub fn insert(conn: &Connection, c: &Class) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO classes(class_name, class_type, subject_code, room_number, schedule, teacher_id)
         VALUES(?, ?, ?, ?, ?, ?)",
        (
            c.class_name(),
            c.class_type(),
            c.subject_code(),
            &c.room_number,
            &c.schedule,
            c.teacher_id,
        ),
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update(conn: &Connection, c: &Class) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE classes SET class_name = ?, class_type = ?, subject_code = ?, room_number = ?,
           schedule = ?, teacher_id = ?
         WHERE id = ?",
        (
            c.class_name(),
            c.class_type(),
            c.subject_code(),
            &c.room_number,
            &c.schedule,
            c.teacher_id,
            c.id,
        ),
    )?;
    Ok(changed > 0)
}

/// Number of students that would lose their membership if the class
/// changed type or went away.
pub fn member_count(conn: &Connection, id: i64) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT
           (SELECT COUNT(*) FROM students WHERE administrative_class_id = ?1)
         + (SELECT COUNT(*) FROM student_subjects WHERE class_id = ?1)",
        [id],
        |r| r.get(0),
    )
}

/// Deletes the class, dropping enrollments and home-room links to it.
pub fn delete(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let tx = conn.unchecked_transaction()?;
    // Explicit dependency order; there is no ON DELETE CASCADE.
    tx.execute("DELETE FROM student_subjects WHERE class_id = ?", [id])?;
    tx.execute(
        "UPDATE students SET administrative_class_id = NULL WHERE administrative_class_id = ?",
        [id],
    )?;
    let changed = tx.execute("DELETE FROM classes WHERE id = ?", [id])?;
    tx.commit()?;
    Ok(changed > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory;

    #[test]
    fn stored_type_survives_reload() {
        let conn = open_memory();
        let mut math = Class::new(0, "Math");
        math.set_subject_code(Some("MTH1".into()));
        let id = insert(&conn, &math).expect("insert");
        let loaded = get(&conn, id).expect("get").expect("exists");
        assert_eq!(loaded.class_type(), ClassType::Subject);
        assert_eq!(loaded.subject_code(), Some("MTH1"));
        assert_eq!(loaded.class_name(), "Math");
    }

    #[test]
    fn list_filters_by_type() {
        let conn = open_memory();
        insert(&conn, &Class::new(0, "Class 10A")).expect("insert");
        insert(&conn, &Class::new(0, "Introduction to Programming")).expect("insert");
        let admin = list(
            &conn,
            ClassFilter {
                class_type: Some(ClassType::Administrative),
                ..Default::default()
            },
        )
        .expect("list");
        assert_eq!(admin.len(), 1);
        assert_eq!(admin[0].class_name(), "Class 10A");
        assert_eq!(list(&conn, ClassFilter::default()).expect("list").len(), 2);
    }
}
