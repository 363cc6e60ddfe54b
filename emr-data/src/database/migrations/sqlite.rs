use rusqlite::Connection;
use tracing::info;

/// Run SQLite migrations
pub fn run_migrations(conn: &Connection) -> Result<(), String> {
    info!("Running SQLite migrations");

    create_organization_tables(conn)?;
    create_users_table(conn)?;
    create_patients_table(conn)?;
    create_encounters_table(conn)?;
    create_observations_table(conn)?;
    create_prescriptions_table(conn)?;
    create_test_requests_table(conn)?;
    create_documents_table(conn)?;
    create_indexes(conn)?;

    info!("SQLite migrations completed successfully");
    Ok(())
}

/// Organizations, their locations and practitioners
fn create_organization_tables(conn: &Connection) -> Result<(), String> {
    info!("Creating organizations, locations and practitioners tables if not exist");

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS organizations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS locations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            organization_id INTEGER NOT NULL REFERENCES organizations (id),
            name TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS practitioners (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            organization_id INTEGER REFERENCES organizations (id),
            name TEXT NOT NULL,
            license_no TEXT UNIQUE,
            specialty TEXT
        );",
    ).map_err(|e| format!("Failed to create organization tables: {}", e))?;

    Ok(())
}

/// Create the users table
fn create_users_table(conn: &Connection) -> Result<(), String> {
    info!("Creating users table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            email TEXT,
            password_hash TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'active',
            practitioner_id INTEGER REFERENCES practitioners (id),
            created_at TEXT NOT NULL
        )",
        [],
    ).map_err(|e| e.to_string())?;

    Ok(())
}

/// Create the patients table
fn create_patients_table(conn: &Connection) -> Result<(), String> {
    info!("Creating patients table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS patients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            mrn TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            birth_date TEXT,
            sex TEXT,
            phone TEXT,
            email TEXT,
            address TEXT,
            created_at TEXT NOT NULL
        )",
        [],
    ).map_err(|e| e.to_string())?;

    Ok(())
}

/// Create the encounters table; an encounter without `end_at` is still open
fn create_encounters_table(conn: &Connection) -> Result<(), String> {
    info!("Creating encounters table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS encounters (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            patient_id INTEGER NOT NULL REFERENCES patients (id),
            practitioner_id INTEGER REFERENCES practitioners (id),
            location_id INTEGER REFERENCES locations (id),
            encounter_type TEXT NOT NULL,
            reason TEXT,
            start_at TEXT NOT NULL,
            end_at TEXT
        )",
        [],
    ).map_err(|e| e.to_string())?;

    Ok(())
}

/// Create the observations table
fn create_observations_table(conn: &Connection) -> Result<(), String> {
    info!("Creating observations table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS observations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            patient_id INTEGER NOT NULL REFERENCES patients (id),
            encounter_id INTEGER REFERENCES encounters (id),
            category TEXT NOT NULL,
            code_loinc TEXT NOT NULL,
            value TEXT NOT NULL,
            unit TEXT,
            effective_at TEXT NOT NULL
        )",
        [],
    ).map_err(|e| e.to_string())?;

    Ok(())
}

/// Create the prescriptions table; line items and alerts are stored as JSON
fn create_prescriptions_table(conn: &Connection) -> Result<(), String> {
    info!("Creating prescriptions table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS prescriptions (
            id TEXT PRIMARY KEY,
            patient_id INTEGER NOT NULL REFERENCES patients (id),
            patient_name TEXT NOT NULL,
            mrn TEXT NOT NULL,
            doctor TEXT NOT NULL,
            prescribed_at TEXT NOT NULL,
            status TEXT NOT NULL,
            total_amount REAL NOT NULL DEFAULT 0,
            notes TEXT NOT NULL DEFAULT '',
            medications TEXT NOT NULL,
            interactions TEXT NOT NULL,
            contraindications TEXT NOT NULL
        )",
        [],
    ).map_err(|e| e.to_string())?;

    Ok(())
}

/// Create the test requests table
fn create_test_requests_table(conn: &Connection) -> Result<(), String> {
    info!("Creating test_requests table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS test_requests (
            id TEXT PRIMARY KEY,
            patient_id INTEGER NOT NULL REFERENCES patients (id),
            patient_name TEXT NOT NULL,
            mrn TEXT NOT NULL,
            category TEXT NOT NULL,
            procedure_kind TEXT NOT NULL,
            test_name TEXT NOT NULL,
            purpose TEXT,
            urgency TEXT NOT NULL,
            requested_by TEXT NOT NULL,
            requested_at TEXT NOT NULL,
            status TEXT NOT NULL,
            scheduled_at TEXT,
            schedule TEXT,
            completed_at TEXT,
            result TEXT,
            notes TEXT NOT NULL DEFAULT ''
        )",
        [],
    ).map_err(|e| e.to_string())?;

    Ok(())
}

/// Create the generated documents table
fn create_documents_table(conn: &Connection) -> Result<(), String> {
    info!("Creating documents table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS documents (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            filename TEXT NOT NULL UNIQUE,
            kind TEXT NOT NULL,
            title TEXT NOT NULL,
            patient_id INTEGER REFERENCES patients (id),
            content TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    ).map_err(|e| e.to_string())?;

    Ok(())
}

/// Indexes for the time-ordered lookups the services perform
fn create_indexes(conn: &Connection) -> Result<(), String> {
    info!("Creating indexes");

    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_encounters_patient_start
            ON encounters (patient_id, start_at DESC);
        CREATE INDEX IF NOT EXISTS idx_observations_patient_effective
            ON observations (patient_id, effective_at DESC);
        CREATE INDEX IF NOT EXISTS idx_prescriptions_patient
            ON prescriptions (patient_id, prescribed_at DESC);
        CREATE INDEX IF NOT EXISTS idx_test_requests_status
            ON test_requests (status, requested_at DESC);",
    ).map_err(|e| format!("Failed to create index: {}", e))?;

    Ok(())
}
