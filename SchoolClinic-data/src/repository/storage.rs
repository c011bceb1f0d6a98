use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use tracing::debug;

use crate::models::bp_form::{BpFormRecord, BpReadingRecord, MAX_READINGS_PER_FORM};
use crate::models::dental_record::DentalRecord;
use crate::database::DatabasePool;
use super::errors::RepositoryError;

/// Database storage operations for BP forms and dental records
pub struct DatabaseStorage;

impl DatabaseStorage {
    /// Store a new (empty) form
    pub async fn store_form(pool: &DatabasePool, form: &BpFormRecord) -> Result<(), RepositoryError> {
        debug!("Storing BP form in database: id={}", form.id);

        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;
                conn.execute(
                    "INSERT INTO bp_forms (id, patient_id, status, created_at)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![&form.id, &form.patient_id, &form.status, &form.created_at],
                )?;
                Ok(())
            },
        }
    }

    /// Get a form with its readings ordered by date and time
    pub async fn get_form(pool: &DatabasePool, id: &str) -> Result<Option<BpFormRecord>, RepositoryError> {
        debug!("Getting BP form from database: id={}", id);

        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;
                let form = conn.query_row(
                    "SELECT id, patient_id, status, created_at FROM bp_forms WHERE id = ?1",
                    [id],
                    form_from_row,
                ).optional()?;

                match form {
                    Some(mut form) => {
                        form.readings = readings_for_form(&conn, &form.id)?;
                        Ok(Some(form))
                    },
                    None => Ok(None),
                }
            },
        }
    }

    /// List the forms of one patient, oldest first
    pub async fn list_forms(pool: &DatabasePool, patient_id: &str) -> Result<Vec<BpFormRecord>, RepositoryError> {
        debug!("Listing BP forms from database: patient_id={}", patient_id);

        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;
                let mut stmt = conn.prepare(
                    "SELECT id, patient_id, status, created_at FROM bp_forms
                     WHERE patient_id = ?1 ORDER BY created_at ASC"
                )?;

                let forms = stmt
                    .query_map([patient_id], form_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;

                let mut result = Vec::with_capacity(forms.len());
                for mut form in forms {
                    form.readings = readings_for_form(&conn, &form.id)?;
                    result.push(form);
                }
                Ok(result)
            },
        }
    }

    /// Insert a reading and update the form status in one transaction.
    /// Fails with `CapacityExceeded` when the form is already full.
    pub async fn add_reading(
        pool: &DatabasePool,
        reading: &BpReadingRecord,
        status: &str,
    ) -> Result<(), RepositoryError> {
        debug!("Storing BP reading in database: form_id={}, id={}", reading.form_id, reading.id);

        match pool {
            DatabasePool::SQLite(pool) => {
                let mut conn = pool.get()?;
                // Writers are serialised from the first statement on, so the
                // count below cannot race another insert
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

                let updated = tx.execute(
                    "UPDATE bp_forms SET status = ?1 WHERE id = ?2",
                    params![status, &reading.form_id],
                )?;
                if updated == 0 {
                    return Err(RepositoryError::NotFound(format!("BP form {}", reading.form_id)));
                }

                let count: i64 = tx.query_row(
                    "SELECT COUNT(*) FROM bp_readings WHERE form_id = ?1",
                    [&reading.form_id],
                    |row| row.get(0),
                )?;
                if count >= MAX_READINGS_PER_FORM as i64 {
                    return Err(RepositoryError::CapacityExceeded(format!(
                        "BP form {} already holds {} readings",
                        reading.form_id, MAX_READINGS_PER_FORM
                    )));
                }

                tx.execute(
                    "INSERT INTO bp_readings
                     (id, form_id, date, time, blood_pressure, remarks, has_signature)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        &reading.id,
                        &reading.form_id,
                        &reading.date,
                        &reading.time,
                        &reading.blood_pressure,
                        &reading.remarks,
                        reading.has_signature,
                    ],
                )?;

                tx.commit()?;
                Ok(())
            },
        }
    }

    /// Delete a form and its readings, returns false if it did not exist
    pub async fn delete_form(pool: &DatabasePool, id: &str) -> Result<bool, RepositoryError> {
        debug!("Deleting BP form from database: id={}", id);

        match pool {
            DatabasePool::SQLite(pool) => {
                let mut conn = pool.get()?;
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM bp_readings WHERE form_id = ?1", [id])?;
                let deleted = tx.execute("DELETE FROM bp_forms WHERE id = ?1", [id])?;
                tx.commit()?;
                Ok(deleted > 0)
            },
        }
    }

    /// Store a new dental record
    pub async fn store_dental_record(pool: &DatabasePool, record: &DentalRecord) -> Result<(), RepositoryError> {
        debug!("Storing dental record in database: id={}", record.id);

        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;
                conn.execute(
                    "INSERT INTO dental_records (id, patient_id, chart, remarks, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        &record.id,
                        &record.patient_id,
                        &record.chart,
                        &record.remarks,
                        &record.created_at,
                        &record.updated_at,
                    ],
                )?;
                Ok(())
            },
        }
    }

    /// Get a dental record by id
    pub async fn get_dental_record(pool: &DatabasePool, id: &str) -> Result<Option<DentalRecord>, RepositoryError> {
        debug!("Getting dental record from database: id={}", id);

        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;
                let record = conn.query_row(
                    "SELECT id, patient_id, chart, remarks, created_at, updated_at
                     FROM dental_records WHERE id = ?1",
                    [id],
                    dental_record_from_row,
                ).optional()?;
                Ok(record)
            },
        }
    }

    /// Replace the chart of a dental record
    pub async fn update_dental_chart(
        pool: &DatabasePool,
        id: &str,
        chart: &str,
        updated_at: &str,
    ) -> Result<Option<DentalRecord>, RepositoryError> {
        debug!("Updating dental chart in database: id={}", id);

        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;
                let updated = conn.execute(
                    "UPDATE dental_records SET chart = ?1, updated_at = ?2 WHERE id = ?3",
                    params![chart, updated_at, id],
                )?;
                if updated == 0 {
                    return Ok(None);
                }

                let record = conn.query_row(
                    "SELECT id, patient_id, chart, remarks, created_at, updated_at
                     FROM dental_records WHERE id = ?1",
                    [id],
                    dental_record_from_row,
                )?;
                Ok(Some(record))
            },
        }
    }
}

fn form_from_row(row: &Row<'_>) -> rusqlite::Result<BpFormRecord> {
    Ok(BpFormRecord {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        status: row.get(2)?,
        created_at: row.get(3)?,
        readings: Vec::new(),
    })
}

fn readings_for_form(conn: &Connection, form_id: &str) -> Result<Vec<BpReadingRecord>, RepositoryError> {
    let mut stmt = conn.prepare(
        "SELECT id, form_id, date, time, blood_pressure, remarks, has_signature
         FROM bp_readings WHERE form_id = ?1 ORDER BY date ASC, time ASC"
    )?;

    let readings = stmt
        .query_map([form_id], |row| {
            Ok(BpReadingRecord {
                id: row.get(0)?,
                form_id: row.get(1)?,
                date: row.get(2)?,
                time: row.get(3)?,
                blood_pressure: row.get(4)?,
                remarks: row.get(5)?,
                has_signature: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(readings)
}

fn dental_record_from_row(row: &Row<'_>) -> rusqlite::Result<DentalRecord> {
    Ok(DentalRecord {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        chart: row.get(2)?,
        remarks: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}
