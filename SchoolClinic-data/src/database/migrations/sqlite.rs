use rusqlite::Connection;
use tracing::info;

/// Run SQLite migrations
pub fn run_migrations(conn: &Connection) -> Result<(), String> {
    info!("Running SQLite migrations");

    create_bp_forms_table(conn)?;
    create_bp_readings_table(conn)?;
    create_dental_records_table(conn)?;

    info!("SQLite migrations completed successfully");
    Ok(())
}

/// Create the BP form table, one row per patient encounter
fn create_bp_forms_table(conn: &Connection) -> Result<(), String> {
    info!("Creating bp_forms table if not exists");

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS bp_forms (
            id TEXT PRIMARY KEY,
            patient_id TEXT NOT NULL,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_bp_forms_patient_id
        ON bp_forms (patient_id);",
    ).map_err(|e| e.to_string())?;

    Ok(())
}

/// Create the BP readings table; readings are owned by their form
fn create_bp_readings_table(conn: &Connection) -> Result<(), String> {
    info!("Creating bp_readings table if not exists");

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS bp_readings (
            id TEXT PRIMARY KEY,
            form_id TEXT NOT NULL REFERENCES bp_forms (id) ON DELETE CASCADE,
            date TEXT NOT NULL,
            time TEXT NOT NULL,
            blood_pressure TEXT NOT NULL,
            remarks TEXT NOT NULL,
            has_signature INTEGER NOT NULL DEFAULT 0
        );
        CREATE INDEX IF NOT EXISTS idx_bp_readings_form_id
        ON bp_readings (form_id, date, time);",
    ).map_err(|e| format!("Failed to create bp_readings: {}", e))?;

    Ok(())
}

/// Create the dental records table; the chart is a JSON text blob
fn create_dental_records_table(conn: &Connection) -> Result<(), String> {
    info!("Creating dental_records table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS dental_records (
            id TEXT PRIMARY KEY,
            patient_id TEXT NOT NULL,
            chart TEXT NOT NULL DEFAULT '',
            remarks TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    ).map_err(|e| format!("Failed to create dental_records: {}", e))?;

    Ok(())
}
