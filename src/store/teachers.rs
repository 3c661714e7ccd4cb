use rusqlite::{Connection, OptionalExtension, Row};

use crate::model::Teacher;

const COLUMNS: &str = "id, user_id, first_name, middle_name, last_name, email, department, phone, classes_assigned";

fn from_row(r: &Row<'_>) -> rusqlite::Result<Teacher> {
    Ok(Teacher {
        id: r.get(0)?,
        user_id: r.get(1)?,
        first_name: r.get(2)?,
        middle_name: r.get(3)?,
        last_name: r.get(4)?,
        email: r.get(5)?,
        department: r.get(6)?,
        phone: r.get(7)?,
        classes_assigned: r.get(8)?,
    })
}

pub fn list(conn: &Connection) -> rusqlite::Result<Vec<Teacher>> {
    let sql = format!(
        "SELECT {} FROM teachers ORDER BY last_name, first_name",
        COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], from_row)?;
    rows.collect()
}

pub fn get(conn: &Connection, id: i64) -> rusqlite::Result<Option<Teacher>> {
    let sql = format!("SELECT {} FROM teachers WHERE id = ?", COLUMNS);
    conn.query_row(&sql, [id], from_row).optional()
}

pub fn find_by_user(conn: &Connection, user_id: i64) -> rusqlite::Result<Option<Teacher>> {
    let sql = format!("SELECT {} FROM teachers WHERE user_id = ?", COLUMNS);
    conn.query_row(&sql, [user_id], from_row).optional()
}

/// Whether another teacher profile already holds this account.
pub fn user_linked(conn: &Connection, user_id: i64, except_id: i64) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT 1 FROM teachers WHERE user_id = ? AND id <> ?",
        (user_id, except_id),
        |r| r.get::<_, i64>(0),
    )
    .optional()
    .map(|v| v.is_some())
}

pub fn insert(conn: &Connection, t: &Teacher) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO teachers(user_id, first_name, middle_name, last_name, email, department, phone, classes_assigned)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
        (
            t.user_id,
            &t.first_name,
            &t.middle_name,
            &t.last_name,
            &t.email,
            &t.department,
            &t.phone,
            t.classes_assigned,
        ),
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update(conn: &Connection, t: &Teacher) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE teachers SET user_id = ?, first_name = ?, middle_name = ?, last_name = ?,
           email = ?, department = ?, phone = ?, classes_assigned = ?
         WHERE id = ?",
        (
            t.user_id,
            &t.first_name,
            &t.middle_name,
            &t.last_name,
            &t.email,
            &t.department,
            &t.phone,
            t.classes_assigned,
            t.id,
        ),
    )?;
    Ok(changed > 0)
}

/// Deletes the teacher and leaves their classes unassigned.
pub fn delete(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("UPDATE classes SET teacher_id = NULL WHERE teacher_id = ?", [id])?;
    let changed = tx.execute("DELETE FROM teachers WHERE id = ?", [id])?;
    tx.commit()?;
    Ok(changed > 0)
}

/// Recomputes `classes_assigned` from the classes table. Returns rows changed.
pub fn sync_class_counts(conn: &Connection) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE teachers SET classes_assigned = (
           SELECT COUNT(*) FROM classes c WHERE c.teacher_id = teachers.id
         )
         WHERE classes_assigned <> (
           SELECT COUNT(*) FROM classes c WHERE c.teacher_id = teachers.id
         )",
        [],
    )
}
