use rusqlite::{Connection, OptionalExtension, Row};

use crate::model::{Role, User};

const COLUMNS: &str = "id, username, password_hash, role, name, email";

fn from_row(r: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: r.get(0)?,
        username: r.get(1)?,
        password_hash: r.get(2)?,
        role: r.get(3)?,
        name: r.get(4)?,
        email: r.get(5)?,
    })
}

pub fn list(conn: &Connection, role: Option<Role>) -> rusqlite::Result<Vec<User>> {
    let sql = format!(
        "SELECT {} FROM users WHERE (?1 IS NULL OR role = ?1) ORDER BY username",
        COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([role], from_row)?;
    rows.collect()
}

pub fn get(conn: &Connection, id: i64) -> rusqlite::Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE id = ?", COLUMNS);
    conn.query_row(&sql, [id], from_row).optional()
}

pub fn find_by_username(conn: &Connection, username: &str) -> rusqlite::Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE username = ?", COLUMNS);
    conn.query_row(&sql, [username], from_row).optional()
}

pub fn username_taken(conn: &Connection, username: &str, except_id: i64) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT 1 FROM users WHERE username = ? AND id <> ?",
        (username, except_id),
        |r| r.get::<_, i64>(0),
    )
    .optional()
    .map(|v| v.is_some())
}

pub fn insert(conn: &Connection, user: &User) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO users(username, password_hash, role, name, email) VALUES(?, ?, ?, ?, ?)",
        (
            &user.username,
            &user.password_hash,
            user.role,
            &user.name,
            &user.email,
        ),
    )?;
    Ok(conn.last_insert_rowid())
}

/// Writes every field including the password hash.
pub fn update(conn: &Connection, user: &User) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE users SET username = ?, password_hash = ?, role = ?, name = ?, email = ? WHERE id = ?",
        (
            &user.username,
            &user.password_hash,
            user.role,
            &user.name,
            &user.email,
            user.id,
        ),
    )?;
    Ok(changed > 0)
}

/// Deletes the user with their notifications and unlinks any profile rows.
pub fn delete(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM notifications WHERE receiver_id = ?", [id])?;
    tx.execute("UPDATE students SET user_id = NULL WHERE user_id = ?", [id])?;
    tx.execute("UPDATE teachers SET user_id = NULL WHERE user_id = ?", [id])?;
    let changed = tx.execute("DELETE FROM users WHERE id = ?", [id])?;
    tx.commit()?;
    Ok(changed > 0)
}

pub fn count_admins(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM users WHERE role = 'ADMIN'", [], |r| {
        r.get(0)
    })
}
