use rusqlite::{Connection, OptionalExtension, Row};

use crate::model::Notification;

const COLUMNS: &str =
    "id, sender_id, receiver_id, sender_name, title, message, created_at, is_read, notification_type";

fn from_row(r: &Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification::restore(
        r.get(0)?,
        r.get(1)?,
        r.get(2)?,
        r.get(3)?,
        r.get(4)?,
        r.get(5)?,
        r.get(6)?,
        r.get::<_, i64>(7)? != 0,
        r.get(8)?,
    ))
}

pub fn insert(conn: &Connection, n: &Notification) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO notifications(sender_id, receiver_id, sender_name, title, message, created_at, is_read, notification_type)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
        (
            n.sender_id,
            n.receiver_id,
            &n.sender_name,
            &n.title,
            &n.message,
            n.timestamp(),
            n.is_read() as i64,
            n.notification_type,
        ),
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get(conn: &Connection, id: i64) -> rusqlite::Result<Option<Notification>> {
    let sql = format!("SELECT {} FROM notifications WHERE id = ?", COLUMNS);
    conn.query_row(&sql, [id], from_row).optional()
}

/// Newest first.
pub fn inbox(
    conn: &Connection,
    receiver_id: i64,
    unread_only: bool,
) -> rusqlite::Result<Vec<Notification>> {
    let sql = format!(
        "SELECT {} FROM notifications
         WHERE receiver_id = ? AND (? = 0 OR is_read = 0)
         ORDER BY created_at DESC, id DESC",
        COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map((receiver_id, unread_only as i64), from_row)?;
    rows.collect()
}

pub fn unread_count(conn: &Connection, receiver_id: i64) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM notifications WHERE receiver_id = ? AND is_read = 0",
        [receiver_id],
        |r| r.get(0),
    )
}

/// Marks one of the receiver's notifications read. Returns false if it is
/// not theirs or does not exist.
pub fn mark_read(conn: &Connection, id: i64, receiver_id: i64) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE notifications SET is_read = 1 WHERE id = ? AND receiver_id = ?",
        (id, receiver_id),
    )?;
    Ok(changed > 0)
}

pub fn mark_all_read(conn: &Connection, receiver_id: i64) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE notifications SET is_read = 1 WHERE receiver_id = ? AND is_read = 0",
        [receiver_id],
    )
}

pub fn delete(conn: &Connection, id: i64, receiver_id: i64) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "DELETE FROM notifications WHERE id = ? AND receiver_id = ?",
        (id, receiver_id),
    )?;
    Ok(changed > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory;
    use crate::model::NotificationType;

    #[test]
    fn timestamp_and_read_flag_survive_storage() {
        let conn = open_memory();
        let n = Notification::new(1, "Administrator", 1, "Hello", "First", NotificationType::Reminder);
        let id = insert(&conn, &n).expect("insert");
        let stored = get(&conn, id).expect("get").expect("exists");
        assert_eq!(stored.timestamp(), n.timestamp());
        assert_eq!(stored.notification_type, NotificationType::Reminder);
        assert!(!stored.is_read());

        assert_eq!(unread_count(&conn, 1).expect("count"), 1);
        assert!(!mark_read(&conn, id, 2).expect("mark other"));
        assert!(mark_read(&conn, id, 1).expect("mark own"));
        assert_eq!(unread_count(&conn, 1).expect("count"), 0);
        assert!(inbox(&conn, 1, true).expect("inbox").is_empty());
        assert_eq!(inbox(&conn, 1, false).expect("inbox").len(), 1);
    }
}
