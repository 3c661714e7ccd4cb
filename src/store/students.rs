use rusqlite::{Connection, OptionalExtension, Row};

use crate::model::{Class, ClassRef, Student};

const SELECT: &str = "SELECT
       s.id, s.user_id, s.student_id, s.first_name, s.middle_name, s.last_name,
       s.email, s.department, s.administrative_class_id, c.class_name
     FROM students s
     LEFT JOIN classes c ON c.id = s.administrative_class_id";

fn from_row(r: &Row<'_>) -> rusqlite::Result<Student> {
    let mut s = Student::new(r.get(0)?);
    s.user_id = r.get(1)?;
    s.student_id = r.get(2)?;
    s.first_name = r.get(3)?;
    s.middle_name = r.get(4)?;
    s.last_name = r.get(5)?;
    s.email = r.get(6)?;
    s.department = r.get(7)?;
    let class_id: Option<i64> = r.get(8)?;
    let class_name: Option<String> = r.get(9)?;
    s.administrative_class = class_id.map(|id| ClassRef {
        id,
        name: class_name.unwrap_or_default(),
    });
    Ok(s)
}

/// Fills in enrollments, in enrollment order, for every student in `students`.
fn attach_enrollments(conn: &Connection, students: &mut [Student]) -> rusqlite::Result<()> {
    if students.is_empty() {
        return Ok(());
    }
    let mut stmt = conn.prepare(
        "SELECT ss.student_id, ss.class_id, c.class_name
         FROM student_subjects ss
         JOIN classes c ON c.id = ss.class_id
         WHERE ss.student_id = ?
         ORDER BY ss.position",
    )?;
    for student in students.iter_mut() {
        let rows = stmt
            .query_map([student.id], |r| {
                Ok((r.get::<_, i64>(1)?, r.get::<_, String>(2)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        for (subject_id, subject_name) in rows {
            student.add_subject(subject_id, subject_name);
        }
    }
    Ok(())
}

fn query_many(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> rusqlite::Result<Vec<Student>> {
    let mut stmt = conn.prepare(sql)?;
    let mut students = stmt
        .query_map(params, from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    attach_enrollments(conn, &mut students)?;
    Ok(students)
}

pub fn list(conn: &Connection) -> rusqlite::Result<Vec<Student>> {
    let sql = format!("{} ORDER BY s.last_name, s.first_name, s.id", SELECT);
    query_many(conn, &sql, [])
}

pub fn get(conn: &Connection, id: i64) -> rusqlite::Result<Option<Student>> {
    let sql = format!("{} WHERE s.id = ?", SELECT);
    let found = conn.query_row(&sql, [id], from_row).optional()?;
    match found {
        Some(s) => {
            let mut one = [s];
            attach_enrollments(conn, &mut one)?;
            let [s] = one;
            Ok(Some(s))
        }
        None => Ok(None),
    }
}

pub fn find_by_user(conn: &Connection, user_id: i64) -> rusqlite::Result<Option<Student>> {
    let id: Option<i64> = conn
        .query_row("SELECT id FROM students WHERE user_id = ?", [user_id], |r| {
            r.get(0)
        })
        .optional()?;
    match id {
        Some(id) => get(conn, id),
        None => Ok(None),
    }
}

/// Members of a class: home-room students for an administrative class,
/// enrolled students for a subject class.
pub fn roster(conn: &Connection, class: &Class) -> rusqlite::Result<Vec<Student>> {
    if class.is_administrative() {
        let sql = format!(
            "{} WHERE s.administrative_class_id = ? ORDER BY s.last_name, s.first_name, s.id",
            SELECT
        );
        query_many(conn, &sql, [class.id])
    } else {
        let sql = format!(
            "{} JOIN student_subjects ss ON ss.student_id = s.id
             WHERE ss.class_id = ?
             ORDER BY s.last_name, s.first_name, s.id",
            SELECT
        );
        query_many(conn, &sql, [class.id])
    }
}

pub fn student_id_taken(
    conn: &Connection,
    student_id: &str,
    except_id: i64,
) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT 1 FROM students WHERE student_id = ? AND id <> ?",
        (student_id, except_id),
        |r| r.get::<_, i64>(0),
    )
    .optional()
    .map(|v| v.is_some())
}

/// Whether another student profile already holds this account.
pub fn user_linked(conn: &Connection, user_id: i64, except_id: i64) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT 1 FROM students WHERE user_id = ? AND id <> ?",
        (user_id, except_id),
        |r| r.get::<_, i64>(0),
    )
    .optional()
    .map(|v| v.is_some())
}

pub fn exists(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    conn.query_row("SELECT 1 FROM students WHERE id = ?", [id], |r| {
        r.get::<_, i64>(0)
    })
    .optional()
    .map(|v| v.is_some())
}

/// Inserts the profile fields and home-room link. Enrollments are saved separately.
pub fn insert(conn: &Connection, s: &Student) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO students(user_id, student_id, first_name, middle_name, last_name, email, department, administrative_class_id)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
        (
            s.user_id,
            &s.student_id,
            &s.first_name,
            &s.middle_name,
            &s.last_name,
            &s.email,
            &s.department,
            s.administrative_class_id(),
        ),
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update(conn: &Connection, s: &Student) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE students SET user_id = ?, student_id = ?, first_name = ?, middle_name = ?,
           last_name = ?, email = ?, department = ?, administrative_class_id = ?
         WHERE id = ?",
        (
            s.user_id,
            &s.student_id,
            &s.first_name,
            &s.middle_name,
            &s.last_name,
            &s.email,
            &s.department,
            s.administrative_class_id(),
            s.id,
        ),
    )?;
    Ok(changed > 0)
}

/// Rewrites the student's enrollment rows to match `s.enrollments()`.
pub fn save_enrollments(conn: &Connection, s: &Student) -> rusqlite::Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM student_subjects WHERE student_id = ?", [s.id])?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO student_subjects(student_id, class_id, position) VALUES(?, ?, ?)",
        )?;
        for (pos, e) in s.enrollments().iter().enumerate() {
            stmt.execute((s.id, e.subject_id, pos as i64))?;
        }
    }
    tx.commit()
}

pub fn delete(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM student_subjects WHERE student_id = ?", [id])?;
    tx.execute("DELETE FROM attendance WHERE student_id = ?", [id])?;
    let changed = tx.execute("DELETE FROM students WHERE id = ?", [id])?;
    tx.commit()?;
    Ok(changed > 0)
}
