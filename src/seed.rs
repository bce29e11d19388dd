//! One-off fixture seeding: one admin account, the department's faculty
//! roster, a small semester-5 curriculum, and ten students fanned out into
//! the seeded courses. Safe to run repeatedly; every insert is guarded by an
//! existence check.

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};

struct FacultySeed {
    id: &'static str,
    name: &'static str,
    designation: &'static str,
    doj: &'static str,
}

const FACULTY: &[FacultySeed] = &[
    FacultySeed { id: "HTS 1794", name: "Dr. Sankar", designation: "Professor", doj: "20.01.2025" },
    FacultySeed { id: "HTS 1856", name: "Dr. S. Zulaikha Beevi", designation: "Professor", doj: "16.06.2025" },
    FacultySeed { id: "HTS 1766", name: "Dr. G. Mahalakshmi", designation: "Associate Professor", doj: "02.07.2024" },
    FacultySeed { id: "HTS 1821", name: "Dr. S. Sathish Kumar", designation: "Associate Professor", doj: "04.06.2025" },
    FacultySeed { id: "HTS 1488", name: "Mrs. Veerasundari R", designation: "Assistant Professor", doj: "02-Mar-2020" },
    FacultySeed { id: "HTS 1527", name: "Mrs. Vasanthapriya M J T", designation: "Assistant Professor", doj: "26-Nov-2020" },
    FacultySeed { id: "HTS 1655", name: "Mrs. Geetha L", designation: "Assistant Professor & HOD", doj: "13-Feb-2023" },
    FacultySeed { id: "HTS 1664", name: "Mrs. Priya R V", designation: "Assistant Professor", doj: "13-Jun-2023" },
    FacultySeed { id: "HTS 1711", name: "Mr. Balaji M", designation: "Assistant Professor", doj: "23-Dec-2023" },
    FacultySeed { id: "HTS 1745", name: "Mrs. Ranjani R", designation: "Assistant Professor", doj: "18-May-2024" },
    FacultySeed { id: "HTS 1767", name: "Ms. Preethi M", designation: "Assistant Professor", doj: "04.07.2024" },
    FacultySeed { id: "HTS 1774", name: "Ms. Nivetha P", designation: "Assistant Professor", doj: "22.07.2024" },
    FacultySeed { id: "HTS 1717", name: "Mr. Ramajayam A", designation: "Assistant Professor", doj: "24-Jan-2024" },
    FacultySeed { id: "HTS 1725", name: "Ms. Tamil Selvi B", designation: "Assistant Professor", doj: "15-Feb-2024" },
    FacultySeed { id: "HTS 1775", name: "Ms. Harini P", designation: "Assistant Professor", doj: "25.07.2024" },
    FacultySeed { id: "HTS 1791", name: "Mr. Umanath", designation: "Assistant Professor", doj: "08.01.2025" },
    FacultySeed { id: "HTS 1792", name: "Mr. Balaarunesh G", designation: "Assistant Professor", doj: "13.01.2025" },
    FacultySeed { id: "HTS 1801", name: "Ms. Suganya Devi S", designation: "Assistant Professor", doj: "22.01.2025" },
    FacultySeed { id: "HTS 1802", name: "Mr. Samuel Dinesh Hynes N", designation: "Assistant Professor", doj: "23.01.2025" },
    FacultySeed { id: "HTS 1819", name: "Ms. Kuppu Lakshmi", designation: "Assistant Professor", doj: "15.02.2025" },
    FacultySeed { id: "HTS 1857", name: "Mr. Vishnu Vamsi Nunna", designation: "Assistant Professor", doj: "16.06.2025" },
    FacultySeed { id: "HTS 1865", name: "Mr. Ahamed Haris", designation: "Assistant Professor", doj: "26.06.2025" },
    FacultySeed { id: "HTS 1900", name: "Ms. Pavithra M", designation: "Assistant Professor", doj: "08.09.2025" },
];

struct CourseSeed {
    semester: i64,
    code: &'static str,
    title: &'static str,
    credits: i64,
}

const CURRICULUM: &[CourseSeed] = &[
    CourseSeed { semester: 5, code: "CS3401", title: "Artificial Intelligence", credits: 3 },
    CourseSeed { semester: 5, code: "MA3151", title: "Matrices & Calculus", credits: 4 },
    CourseSeed { semester: 5, code: "21HI53IT", title: "Web Technology", credits: 4 },
];

struct StudentSeed {
    id: &'static str,
    name: &'static str,
    password: &'static str,
    cgpa: f64,
    attendance: f64,
}

const STUDENTS: &[StudentSeed] = &[
    StudentSeed { id: "21AD001", name: "Original Student", password: "01012000", cgpa: 8.5, attendance: 85.0 },
    StudentSeed { id: "21AD002", name: "Bhavani S", password: "pass002", cgpa: 9.1, attendance: 92.0 },
    StudentSeed { id: "21AD003", name: "Sankar P", password: "pass003", cgpa: 7.8, attendance: 74.0 },
    StudentSeed { id: "21AD004", name: "Deepak R", password: "pass004", cgpa: 8.2, attendance: 88.0 },
    StudentSeed { id: "21AD005", name: "Ishwarya M", password: "pass005", cgpa: 8.9, attendance: 95.0 },
    StudentSeed { id: "21AD006", name: "Karthik G", password: "pass006", cgpa: 7.5, attendance: 70.0 },
    StudentSeed { id: "21AD007", name: "Meena R", password: "pass007", cgpa: 9.5, attendance: 98.0 },
    StudentSeed { id: "21AD008", name: "Naveen J", password: "pass008", cgpa: 6.8, attendance: 65.0 },
    StudentSeed { id: "21AD009", name: "Priyanka V", password: "pass009", cgpa: 8.7, attendance: 89.0 },
    StudentSeed { id: "21AD010", name: "Rahul T", password: "pass010", cgpa: 7.2, attendance: 78.0 },
];

/// Faculty passwords are the digits of the date of joining (DDMMYYYY);
/// unparseable dates fall back to a fixed default.
fn doj_password(doj: &str) -> String {
    let parsed = NaiveDate::parse_from_str(doj, "%d.%m.%Y")
        .or_else(|_| NaiveDate::parse_from_str(doj, "%d-%b-%Y"));
    match parsed {
        Ok(d) => d.format("%d%m%Y").to_string(),
        Err(_) => "12345678".to_string(),
    }
}

fn user_exists(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    conn.query_row("SELECT 1 FROM users WHERE id = ?", [id], |r| {
        r.get::<_, i64>(0)
    })
    .optional()
    .map(|v| v.is_some())
}

pub fn run(conn: &Connection) -> anyhow::Result<()> {
    let tx = conn.unchecked_transaction()?;

    // Admin: credential plus a faculty profile, which some dashboards expect.
    if !user_exists(&tx, "admin")? {
        tx.execute(
            "INSERT INTO users(id, role, password) VALUES('admin', 'Admin', 'admin123')",
            [],
        )?;
        tx.execute(
            "INSERT INTO faculty(staff_no, name, designation, doj)
             VALUES('admin', 'System Admin', 'Admin', '01.01.2024')",
            [],
        )?;
        tracing::info!("seeded admin account");
    }

    for f in FACULTY {
        if user_exists(&tx, f.id)? {
            continue;
        }
        let role = if f.designation.contains("HOD") {
            "HOD"
        } else {
            "Faculty"
        };
        tx.execute(
            "INSERT INTO users(id, role, password) VALUES(?, ?, ?)",
            (f.id, role, doj_password(f.doj)),
        )?;
        tx.execute(
            "INSERT INTO faculty(staff_no, name, designation, doj) VALUES(?, ?, ?, ?)",
            (f.id, f.name, f.designation, f.doj),
        )?;
    }
    tracing::info!(count = FACULTY.len(), "faculty roster seeded");

    for c in CURRICULUM {
        let exists: Option<i64> = tx
            .query_row(
                "SELECT 1 FROM courses WHERE code = ? AND section = 'A'",
                [c.code],
                |r| r.get(0),
            )
            .optional()?;
        if exists.is_none() {
            tx.execute(
                "INSERT INTO courses(code, title, semester, credits, section)
                 VALUES(?, ?, ?, ?, 'A')",
                (c.code, c.title, c.semester, c.credits),
            )?;
        }
    }

    // The seeded cohort: third-year semester-5 section-A, enrolled into the
    // curriculum rows just created (real ids, not the static seed data).
    let sem5_courses = {
        let mut stmt = tx.prepare(
            "SELECT id, code, title FROM courses WHERE semester = 5 AND section = 'A'",
        )?;
        let rows = stmt.query_map([], |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
            ))
        })?;
        rows.collect::<Result<Vec<_>, _>>()?
    };

    for s in STUDENTS {
        if !user_exists(&tx, s.id)? {
            tx.execute(
                "INSERT INTO users(id, role, password) VALUES(?, 'Student', ?)",
                (s.id, s.password),
            )?;
        }
        let profile_exists: Option<i64> = tx
            .query_row(
                "SELECT 1 FROM students WHERE roll_no = ?",
                [s.id],
                |r| r.get(0),
            )
            .optional()?;
        if profile_exists.is_none() {
            tx.execute(
                "INSERT INTO students(roll_no, name, year, semester, section, cgpa, attendance_percentage)
                 VALUES(?, ?, 3, 5, 'A', ?, ?)",
                (s.id, s.name, s.cgpa, s.attendance),
            )?;
        }

        for (course_id, code, title) in &sem5_courses {
            let enrolled: Option<i64> = tx
                .query_row(
                    "SELECT 1 FROM academic_data WHERE student_roll_no = ? AND course_id = ?",
                    (s.id, course_id),
                    |r| r.get(0),
                )
                .optional()?;
            if enrolled.is_none() {
                tx.execute(
                    "INSERT INTO academic_data(student_roll_no, course_id, course_code, subject,
                                               section, subject_attendance, status)
                     VALUES(?, ?, ?, ?, 'A', ?, 'Pursuing')",
                    (s.id, course_id, code, title, s.attendance),
                )?;
            }
        }
    }
    tracing::info!(count = STUDENTS.len(), "students seeded");

    tx.commit()?;
    Ok(())
}
