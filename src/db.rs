use rusqlite::Connection;
use std::path::Path;

pub fn open_db(data_dir: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(data_dir)?;
    let db_path = data_dir.join("college.sqlite3");
    let conn = Connection::open(db_path)?;
    init_schema(&conn)?;
    Ok(conn)
}

/// In-memory database with the full schema, for tests.
pub fn open_in_memory() -> anyhow::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS users(
            id TEXT PRIMARY KEY,
            role TEXT NOT NULL,
            password TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            roll_no TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            year INTEGER NOT NULL,
            semester INTEGER NOT NULL,
            section TEXT NOT NULL DEFAULT 'A',
            cgpa REAL NOT NULL DEFAULT 0.0,
            attendance_percentage REAL NOT NULL DEFAULT 0.0,
            profile_pic TEXT,
            FOREIGN KEY(roll_no) REFERENCES users(id)
        )",
        [],
    )?;
    // Databases created before sections and profile photos existed are
    // patched forward in place.
    ensure_students_section(conn)?;
    ensure_students_profile_pic(conn)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS faculty(
            staff_no TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            designation TEXT NOT NULL,
            doj TEXT NOT NULL,
            profile_pic TEXT,
            FOREIGN KEY(staff_no) REFERENCES users(id)
        )",
        [],
    )?;
    ensure_faculty_profile_pic(conn)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS courses(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL,
            title TEXT NOT NULL,
            semester INTEGER NOT NULL,
            credits INTEGER NOT NULL,
            category TEXT,
            section TEXT NOT NULL DEFAULT 'A',
            faculty_id TEXT,
            FOREIGN KEY(faculty_id) REFERENCES faculty(staff_no)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_courses_code ON courses(code)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_courses_sem_section ON courses(semester, section)",
        [],
    )?;

    // One row per (student, course) pair. Uniqueness is an application-level
    // pre-check in the enrollment handlers, not a constraint; see DESIGN.md.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS academic_data(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_roll_no TEXT NOT NULL,
            course_id INTEGER NOT NULL,
            course_code TEXT NOT NULL,
            subject TEXT NOT NULL DEFAULT '',
            section TEXT NOT NULL DEFAULT 'A',
            cia1_marks REAL NOT NULL DEFAULT 0.0,
            cia1_retest REAL NOT NULL DEFAULT 0.0,
            cia2_marks REAL NOT NULL DEFAULT 0.0,
            cia2_retest REAL NOT NULL DEFAULT 0.0,
            subject_attendance REAL NOT NULL DEFAULT 0.0,
            innovative_assignment_marks REAL NOT NULL DEFAULT 0.0,
            status TEXT NOT NULL DEFAULT 'Pursuing',
            FOREIGN KEY(student_roll_no) REFERENCES students(roll_no),
            FOREIGN KEY(course_id) REFERENCES courses(id)
        )",
        [],
    )?;
    ensure_academic_data_subject(conn)?;
    ensure_academic_data_innovative_marks(conn)?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_academic_data_student ON academic_data(student_roll_no)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_academic_data_course ON academic_data(course_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_academic_data_code ON academic_data(course_code)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS materials(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            course_id INTEGER NOT NULL,
            course_code TEXT NOT NULL,
            type TEXT NOT NULL,
            title TEXT NOT NULL,
            file_link TEXT NOT NULL,
            posted_by TEXT NOT NULL,
            FOREIGN KEY(course_id) REFERENCES courses(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_materials_course ON materials(course_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS announcements(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            type TEXT NOT NULL,
            course_code TEXT NOT NULL DEFAULT 'Global',
            section TEXT NOT NULL DEFAULT 'All',
            posted_by TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

fn ensure_students_section(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "students", "section")? {
        return Ok(());
    }
    conn.execute(
        "ALTER TABLE students ADD COLUMN section TEXT NOT NULL DEFAULT 'A'",
        [],
    )?;
    Ok(())
}

fn ensure_students_profile_pic(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "students", "profile_pic")? {
        return Ok(());
    }
    conn.execute("ALTER TABLE students ADD COLUMN profile_pic TEXT", [])?;
    Ok(())
}

fn ensure_faculty_profile_pic(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "faculty", "profile_pic")? {
        return Ok(());
    }
    conn.execute("ALTER TABLE faculty ADD COLUMN profile_pic TEXT", [])?;
    Ok(())
}

fn ensure_academic_data_subject(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "academic_data", "subject")? {
        return Ok(());
    }
    conn.execute(
        "ALTER TABLE academic_data ADD COLUMN subject TEXT NOT NULL DEFAULT ''",
        [],
    )?;
    // Backfill from the owning course so titles show up on older rows.
    conn.execute(
        "UPDATE academic_data SET subject = COALESCE(
            (SELECT c.title FROM courses c WHERE c.id = academic_data.course_id), '')",
        [],
    )?;
    Ok(())
}

fn ensure_academic_data_innovative_marks(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "academic_data", "innovative_assignment_marks")? {
        return Ok(());
    }
    conn.execute(
        "ALTER TABLE academic_data ADD COLUMN innovative_assignment_marks REAL NOT NULL DEFAULT 0.0",
        [],
    )?;
    Ok(())
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
