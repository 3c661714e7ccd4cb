use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use tracing::{debug, info, warn};

pub const DB_FILE_NAME: &str = "attendance.sqlite3";
pub const SCHEMA_VERSION: i64 = 2;

/// Table whose presence proves the schema was created.
pub const SENTINEL_TABLE: &str = "users";

/// What the startup sequence needs from the database layer.
pub trait SchemaStore {
    fn initialize_database(&self) -> anyhow::Result<()>;
    fn check_and_update_schema(&self) -> anyhow::Result<()>;
    fn table_exists(&self, name: &str) -> anyhow::Result<bool>;
}

/// Initialize, migrate, then verify the sentinel table; if it is still
/// missing, run initialize and migrate one more time.
pub fn bootstrap(store: &impl SchemaStore) -> anyhow::Result<()> {
    store.initialize_database()?;
    store.check_and_update_schema()?;
    if !store.table_exists(SENTINEL_TABLE)? {
        warn!(
            table = SENTINEL_TABLE,
            "sentinel table missing after init; initializing again"
        );
        store.initialize_database()?;
        store.check_and_update_schema()?;
    }
    Ok(())
}

/// Credentials for the admin account created in an empty database.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub password: String,
    pub bcrypt_cost: u32,
}

pub struct SqliteSchema<'a> {
    conn: &'a Connection,
    seed: &'a AdminSeed,
}

impl<'a> SqliteSchema<'a> {
    pub fn new(conn: &'a Connection, seed: &'a AdminSeed) -> Self {
        SqliteSchema { conn, seed }
    }
}

impl SchemaStore for SqliteSchema<'_> {
    fn initialize_database(&self) -> anyhow::Result<()> {
        create_tables(self.conn)?;
        seed_admin(self.conn, self.seed)?;
        Ok(())
    }

    fn check_and_update_schema(&self) -> anyhow::Result<()> {
        update_schema(self.conn)
    }

    fn table_exists(&self, name: &str) -> anyhow::Result<bool> {
        table_exists(self.conn, name)
    }
}

pub fn open_db(workspace: &Path, seed: &AdminSeed) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE_NAME);
    let conn = Connection::open(&db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;
    bootstrap(&SqliteSchema::new(&conn, seed))?;
    info!(path = %db_path.display(), "database ready");
    Ok(conn)
}

#[cfg(test)]
pub fn open_memory() -> Connection {
    let conn = Connection::open_in_memory().expect("open in-memory db");
    conn.execute("PRAGMA foreign_keys = ON", [])
        .expect("enable foreign keys");
    let seed = AdminSeed {
        password: "admin".into(),
        bcrypt_cost: 4,
    };
    bootstrap(&SqliteSchema::new(&conn, &seed)).expect("bootstrap schema");
    conn
}

fn create_tables(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS users(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL,
            name TEXT NOT NULL,
            email TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS teachers(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER UNIQUE,
            first_name TEXT NOT NULL,
            middle_name TEXT,
            last_name TEXT NOT NULL,
            email TEXT,
            department TEXT,
            phone TEXT,
            classes_assigned INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY(user_id) REFERENCES users(id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS classes(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            class_name TEXT NOT NULL,
            class_type TEXT NOT NULL,
            subject_code TEXT,
            room_number TEXT,
            schedule TEXT,
            teacher_id INTEGER,
            FOREIGN KEY(teacher_id) REFERENCES teachers(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_classes_teacher ON classes(teacher_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER UNIQUE,
            student_id TEXT NOT NULL UNIQUE,
            first_name TEXT NOT NULL,
            middle_name TEXT,
            last_name TEXT NOT NULL,
            email TEXT,
            department TEXT,
            administrative_class_id INTEGER,
            FOREIGN KEY(user_id) REFERENCES users(id),
            FOREIGN KEY(administrative_class_id) REFERENCES classes(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_admin_class ON students(administrative_class_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS student_subjects(
            student_id INTEGER NOT NULL,
            class_id INTEGER NOT NULL,
            position INTEGER NOT NULL,
            PRIMARY KEY(student_id, class_id),
            FOREIGN KEY(student_id) REFERENCES students(id),
            FOREIGN KEY(class_id) REFERENCES classes(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_student_subjects_class ON student_subjects(class_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS attendance(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_id INTEGER NOT NULL,
            date TEXT NOT NULL,
            status TEXT NOT NULL,
            remarks TEXT,
            FOREIGN KEY(student_id) REFERENCES students(id),
            UNIQUE(student_id, date)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_attendance_date ON attendance(date)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS notifications(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            sender_id INTEGER NOT NULL,
            receiver_id INTEGER NOT NULL,
            sender_name TEXT NOT NULL,
            title TEXT NOT NULL,
            message TEXT NOT NULL,
            created_at TEXT NOT NULL,
            is_read INTEGER NOT NULL DEFAULT 0,
            notification_type TEXT NOT NULL DEFAULT 'ANNOUNCEMENT',
            FOREIGN KEY(receiver_id) REFERENCES users(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_notifications_receiver ON notifications(receiver_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_meta(
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

fn seed_admin(conn: &Connection, seed: &AdminSeed) -> anyhow::Result<()> {
    let users: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?;
    if users > 0 {
        return Ok(());
    }
    let hash = bcrypt::hash(&seed.password, seed.bcrypt_cost)?;
    conn.execute(
        "INSERT INTO users(username, password_hash, role, name) VALUES('admin', ?, 'ADMIN', 'Administrator')",
        [&hash],
    )?;
    info!("seeded default admin account");
    Ok(())
}

fn update_schema(conn: &Connection) -> anyhow::Result<()> {
    // Files created by the first release lack these columns.
    if !table_has_column(conn, "classes", "schedule")? {
        conn.execute("ALTER TABLE classes ADD COLUMN schedule TEXT", [])?;
        debug!("added classes.schedule");
    }
    if !table_has_column(conn, "notifications", "notification_type")? {
        conn.execute(
            "ALTER TABLE notifications ADD COLUMN notification_type TEXT NOT NULL DEFAULT 'ANNOUNCEMENT'",
            [],
        )?;
        debug!("added notifications.notification_type");
    }

    let stored: Option<String> = conn
        .query_row(
            "SELECT value FROM schema_meta WHERE key = 'schema_version'",
            [],
            |r| r.get(0),
        )
        .optional()?;
    let stored = stored.and_then(|v| v.parse::<i64>().ok()).unwrap_or(0);
    if stored < SCHEMA_VERSION {
        conn.execute(
            "INSERT INTO schema_meta(key, value) VALUES('schema_version', ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [SCHEMA_VERSION.to_string()],
        )?;
        info!(from = stored, to = SCHEMA_VERSION, "schema version updated");
    }
    Ok(())
}

pub fn table_exists(conn: &Connection, name: &str) -> anyhow::Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?",
            [name],
            |r| r.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}
