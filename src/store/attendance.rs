use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row};
use std::collections::BTreeMap;

use crate::model::{Attendance, AttendanceStatus};

const COLUMNS: &str = "id, student_id, date, status, remarks";

fn from_row(r: &Row<'_>) -> rusqlite::Result<Attendance> {
    Ok(Attendance {
        id: r.get(0)?,
        student_id: r.get(1)?,
        date: r.get(2)?,
        status: r.get(3)?,
        remarks: r.get(4)?,
    })
}

/// Records the status for `(student_id, date)`, replacing any earlier record
/// for the same day.
pub fn upsert(
    conn: &Connection,
    student_id: i64,
    date: NaiveDate,
    status: AttendanceStatus,
    remarks: Option<&str>,
) -> rusqlite::Result<Attendance> {
    conn.execute(
        "INSERT INTO attendance(student_id, date, status, remarks)
         VALUES(?, ?, ?, ?)
         ON CONFLICT(student_id, date) DO UPDATE SET
           status = excluded.status,
           remarks = excluded.remarks",
        (student_id, date, status, remarks),
    )?;
    find(conn, student_id, date)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
}

/// The record for one student on one day, if any.
pub fn find(
    conn: &Connection,
    student_id: i64,
    date: NaiveDate,
) -> rusqlite::Result<Option<Attendance>> {
    let sql = format!(
        "SELECT {} FROM attendance WHERE student_id = ? AND date = ?",
        COLUMNS
    );
    conn.query_row(&sql, (student_id, date), from_row).optional()
}

pub fn get(conn: &Connection, id: i64) -> rusqlite::Result<Option<Attendance>> {
    let sql = format!("SELECT {} FROM attendance WHERE id = ?", COLUMNS);
    conn.query_row(&sql, [id], from_row).optional()
}

/// Records for one student, oldest first, optionally bounded by inclusive dates.
pub fn list_for_student(
    conn: &Connection,
    student_id: i64,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> rusqlite::Result<Vec<Attendance>> {
    let sql = format!(
        "SELECT {} FROM attendance
         WHERE student_id = ?1
           AND (?2 IS NULL OR date >= ?2)
           AND (?3 IS NULL OR date <= ?3)
         ORDER BY date",
        COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map((student_id, from, to), from_row)?;
    rows.collect()
}

/// Records on one date for the given students.
pub fn list_for_date(
    conn: &Connection,
    date: NaiveDate,
    student_ids: &[i64],
) -> rusqlite::Result<Vec<Attendance>> {
    let sql = format!(
        "SELECT {} FROM attendance WHERE date = ? AND student_id = ?",
        COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut out = Vec::new();
    for sid in student_ids {
        if let Some(a) = stmt.query_row((date, sid), from_row).optional()? {
            out.push(a);
        }
    }
    Ok(out)
}

/// Count of records per status for one student. Every status is present.
pub fn summary(
    conn: &Connection,
    student_id: i64,
) -> rusqlite::Result<BTreeMap<&'static str, i64>> {
    let mut counts: BTreeMap<&'static str, i64> = AttendanceStatus::ALL
        .iter()
        .map(|s| (s.as_str(), 0))
        .collect();
    let mut stmt = conn.prepare(
        "SELECT status, COUNT(*) FROM attendance WHERE student_id = ? GROUP BY status",
    )?;
    let rows = stmt
        .query_map([student_id], |r| {
            Ok((r.get::<_, AttendanceStatus>(0)?, r.get::<_, i64>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    for (status, n) in rows {
        counts.insert(status.as_str(), n);
    }
    Ok(counts)
}

pub fn delete(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let changed = conn.execute("DELETE FROM attendance WHERE id = ?", [id])?;
    Ok(changed > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory;
    use crate::model::Student;
    use crate::store::students;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, d).expect("valid date")
    }

    fn student(conn: &Connection, sid: &str) -> i64 {
        let mut s = Student::new(0);
        s.student_id = sid.into();
        s.first_name = "Kim".into();
        s.last_name = "Lee".into();
        students::insert(conn, &s).expect("insert student")
    }

    #[test]
    fn one_record_per_student_and_day() {
        let conn = open_memory();
        let sid = student(&conn, "S-1");
        let first = upsert(&conn, sid, day(2), AttendanceStatus::Absent, None).expect("upsert");
        let second = upsert(&conn, sid, day(2), AttendanceStatus::Late, Some("bus"))
            .expect("upsert");
        assert_eq!(first.id, second.id);
        assert_eq!(second.status, AttendanceStatus::Late);
        assert_eq!(second.remarks.as_deref(), Some("bus"));
        assert_eq!(list_for_student(&conn, sid, None, None).expect("list").len(), 1);
        let found = find(&conn, sid, day(2)).expect("find").expect("exists");
        assert_eq!(found.id, first.id);
        assert!(find(&conn, sid, day(3)).expect("find").is_none());
    }

    #[test]
    fn range_and_summary() {
        let conn = open_memory();
        let sid = student(&conn, "S-1");
        upsert(&conn, sid, day(2), AttendanceStatus::Present, None).expect("upsert");
        upsert(&conn, sid, day(3), AttendanceStatus::Absent, None).expect("upsert");
        upsert(&conn, sid, day(4), AttendanceStatus::Present, None).expect("upsert");

        let mid = list_for_student(&conn, sid, Some(day(3)), Some(day(4))).expect("list");
        assert_eq!(mid.iter().map(|a| a.date).collect::<Vec<_>>(), vec![day(3), day(4)]);

        let counts = summary(&conn, sid).expect("summary");
        assert_eq!(counts["PRESENT"], 2);
        assert_eq!(counts["ABSENT"], 1);
        assert_eq!(counts["LATE"], 0);
        assert_eq!(counts["EXCUSED"], 0);
    }
}
