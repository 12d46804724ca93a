//! SQLite-based store implementation

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use intake_util::{ApplicationId, IntakeError, Modality, SessionId, SlotId};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::{
    ApplicantProfile, ApplicationRecord, ApplicationStatus, SlotRecord, SlotSnapshot,
    SlotTransition, Store, StoreError, StoreResult,
};

/// SQLite-based store.
///
/// All access goes through one connection behind a mutex; `mutate_slot`
/// keeps the guard across its read-transition-write, which is the per-slot
/// mutual exclusion the reservation engine relies on.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute_batch(
            r#"
            -- Interview slots
            CREATE TABLE IF NOT EXISTS slots (
                id TEXT PRIMARY KEY,
                date TEXT NOT NULL,
                time TEXT NOT NULL,
                modality TEXT NOT NULL,
                booked INTEGER NOT NULL DEFAULT 0,
                booked_by TEXT,
                held_by TEXT,
                reserved_by TEXT,
                reserved_at TEXT
            );

            -- Applications
            CREATE TABLE IF NOT EXISTS applications (
                id TEXT PRIMARY KEY,
                full_name TEXT NOT NULL,
                phone TEXT NOT NULL,
                email TEXT NOT NULL,
                age TEXT NOT NULL,
                job_position TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                selected_slots TEXT NOT NULL,
                confirmed_slot TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                expires_at TEXT NOT NULL
            );

            -- Indexes
            CREATE INDEX IF NOT EXISTS idx_slots_schedule ON slots(date, time);
            CREATE INDEX IF NOT EXISTS idx_slots_booked ON slots(booked);
            CREATE INDEX IF NOT EXISTS idx_applications_status ON applications(status);
            CREATE INDEX IF NOT EXISTS idx_applications_created ON applications(created_at);
            "#,
        )?;

        debug!("Store schema initialized");
        Ok(())
    }

    fn row_to_slot(row: &Row<'_>) -> rusqlite::Result<SlotRecord> {
        let id: String = row.get(0)?;
        let date_str: String = row.get(1)?;
        let time_str: String = row.get(2)?;
        let modality_str: String = row.get(3)?;
        let booked: bool = row.get(4)?;
        let booked_by: Option<String> = row.get(5)?;
        let held_by: Option<String> = row.get(6)?;
        let reserved_by: Option<String> = row.get(7)?;
        let reserved_at: Option<String> = row.get(8)?;

        let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?;
        let time = NaiveTime::parse_from_str(&time_str, "%H:%M").map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?;
        let modality: Modality = modality_str.parse().map_err(|e: String| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, e.into())
        })?;

        Ok(SlotRecord {
            id: SlotId::new(id),
            date,
            time,
            modality,
            booked,
            booked_by: booked_by.map(ApplicationId::new),
            held_by: held_by.map(ApplicationId::new),
            reserved_by: reserved_by.map(SessionId::new),
            reserved_at: reserved_at.as_deref().and_then(parse_timestamp),
        })
    }

    fn query_slot(conn: &Connection, id: &SlotId) -> StoreResult<Option<SlotRecord>> {
        let slot = conn
            .query_row(
                "SELECT id, date, time, modality, booked, booked_by, held_by, reserved_by, reserved_at
                 FROM slots WHERE id = ?",
                [id.as_str()],
                Self::row_to_slot,
            )
            .optional()?;
        Ok(slot)
    }

    fn write_slot_state(conn: &Connection, record: &SlotRecord) -> StoreResult<()> {
        conn.execute(
            "UPDATE slots
             SET booked = ?, booked_by = ?, held_by = ?, reserved_by = ?, reserved_at = ?
             WHERE id = ?",
            params![
                record.booked,
                record.booked_by.as_ref().map(|a| a.as_str()),
                record.held_by.as_ref().map(|a| a.as_str()),
                record.reserved_by.as_ref().map(|s| s.as_str()),
                record.reserved_at.map(|t| t.to_rfc3339()),
                record.id.as_str(),
            ],
        )?;
        Ok(())
    }

    fn row_to_application(row: &Row<'_>) -> rusqlite::Result<ApplicationRecord> {
        let id: String = row.get(0)?;
        let full_name: String = row.get(1)?;
        let phone: String = row.get(2)?;
        let email: String = row.get(3)?;
        let age: String = row.get(4)?;
        let job_position: String = row.get(5)?;
        let status_str: String = row.get(6)?;
        let selected_json: String = row.get(7)?;
        let confirmed_json: Option<String> = row.get(8)?;
        let created_at: String = row.get(9)?;
        let updated_at: String = row.get(10)?;
        let expires_at: String = row.get(11)?;

        let status: ApplicationStatus = status_str.parse().map_err(|e: String| {
            rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, e.into())
        })?;
        let selected_slots: Vec<SlotId> =
            serde_json::from_str(&selected_json).unwrap_or_default();
        let confirmed_slot: Option<SlotSnapshot> = confirmed_json
            .as_deref()
            .and_then(|s| serde_json::from_str(s).ok());

        Ok(ApplicationRecord {
            id: ApplicationId::new(id),
            profile: ApplicantProfile {
                full_name,
                phone,
                email,
                age,
                job_position,
            },
            status,
            selected_slots,
            confirmed_slot,
            created_at: parse_timestamp(&created_at).unwrap_or_else(Utc::now),
            updated_at: parse_timestamp(&updated_at).unwrap_or_else(Utc::now),
            expires_at: parse_timestamp(&expires_at).unwrap_or_else(Utc::now),
        })
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

impl Store for SqliteStore {
    fn create_slot(&self, record: &SlotRecord) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO slots (id, date, time, modality, booked, booked_by, held_by, reserved_by, reserved_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                record.id.as_str(),
                record.date.format("%Y-%m-%d").to_string(),
                record.time.format("%H:%M").to_string(),
                record.modality.as_str(),
                record.booked,
                record.booked_by.as_ref().map(|a| a.as_str()),
                record.held_by.as_ref().map(|a| a.as_str()),
                record.reserved_by.as_ref().map(|s| s.as_str()),
                record.reserved_at.map(|t| t.to_rfc3339()),
            ],
        )?;

        debug!(slot_id = %record.id, "Slot created");
        Ok(())
    }

    fn get_slot(&self, id: &SlotId) -> StoreResult<Option<SlotRecord>> {
        let conn = self.conn.lock().unwrap();
        Self::query_slot(&conn, id)
    }

    fn list_slots(&self) -> StoreResult<Vec<SlotRecord>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT id, date, time, modality, booked, booked_by, held_by, reserved_by, reserved_at
             FROM slots ORDER BY date, time",
        )?;

        let rows = stmt.query_map([], Self::row_to_slot)?;
        let mut slots = Vec::new();
        for row in rows {
            slots.push(row?);
        }

        Ok(slots)
    }

    fn delete_slot(&self, id: &SlotId) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();
        let changes = conn.execute("DELETE FROM slots WHERE id = ?", [id.as_str()])?;
        Ok(changes > 0)
    }

    fn slot_count(&self) -> StoreResult<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM slots", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn mutate_slot(
        &self,
        id: &SlotId,
        transition: SlotTransition<'_>,
    ) -> Result<SlotRecord, IntakeError> {
        let conn = self.conn.lock().unwrap();

        let mut record = Self::query_slot(&conn, id)
            .map_err(IntakeError::from)?
            .ok_or_else(|| IntakeError::SlotNotFound(id.clone()))?;

        transition(&mut record)?;

        Self::write_slot_state(&conn, &record).map_err(IntakeError::from)?;
        Ok(record)
    }

    fn clear_expired_reservations(&self, cutoff: DateTime<Utc>) -> StoreResult<usize> {
        let conn = self.conn.lock().unwrap();

        // rfc3339 UTC timestamps compare correctly as text
        let changes = conn.execute(
            "UPDATE slots SET reserved_by = NULL, reserved_at = NULL
             WHERE reserved_at IS NOT NULL AND reserved_at <= ? AND booked = 0",
            [cutoff.to_rfc3339()],
        )?;

        if changes > 0 {
            debug!(cleared = changes, "Expired reservations cleared");
        }
        Ok(changes)
    }

    fn release_session_reservations(&self, session: &SessionId) -> StoreResult<usize> {
        let conn = self.conn.lock().unwrap();

        let changes = conn.execute(
            "UPDATE slots SET reserved_by = NULL, reserved_at = NULL WHERE reserved_by = ?",
            [session.as_str()],
        )?;

        Ok(changes)
    }

    fn release_holds(
        &self,
        applicant: &ApplicationId,
        keep: Option<&SlotId>,
    ) -> StoreResult<usize> {
        let conn = self.conn.lock().unwrap();

        let changes = match keep {
            Some(keep) => conn.execute(
                "UPDATE slots SET held_by = NULL WHERE held_by = ? AND id != ?",
                params![applicant.as_str(), keep.as_str()],
            )?,
            None => conn.execute(
                "UPDATE slots SET held_by = NULL WHERE held_by = ?",
                [applicant.as_str()],
            )?,
        };

        Ok(changes)
    }

    fn release_application_claims(&self, applicant: &ApplicationId) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "UPDATE slots SET held_by = NULL WHERE held_by = ?",
            [applicant.as_str()],
        )?;
        conn.execute(
            "UPDATE slots SET booked = 0, booked_by = NULL WHERE booked_by = ?",
            [applicant.as_str()],
        )?;

        Ok(())
    }

    fn create_application(&self, record: &ApplicationRecord) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let selected_json = serde_json::to_string(&record.selected_slots)?;
        let confirmed_json = record
            .confirmed_slot
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        conn.execute(
            "INSERT INTO applications
             (id, full_name, phone, email, age, job_position, status,
              selected_slots, confirmed_slot, created_at, updated_at, expires_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                record.id.as_str(),
                record.profile.full_name,
                record.profile.phone,
                record.profile.email,
                record.profile.age,
                record.profile.job_position,
                record.status.as_str(),
                selected_json,
                confirmed_json,
                record.created_at.to_rfc3339(),
                record.updated_at.to_rfc3339(),
                record.expires_at.to_rfc3339(),
            ],
        )?;

        debug!(application_id = %record.id, "Application created");
        Ok(())
    }

    fn get_application(&self, id: &ApplicationId) -> StoreResult<Option<ApplicationRecord>> {
        let conn = self.conn.lock().unwrap();

        let record = conn
            .query_row(
                "SELECT id, full_name, phone, email, age, job_position, status,
                        selected_slots, confirmed_slot, created_at, updated_at, expires_at
                 FROM applications WHERE id = ?",
                [id.as_str()],
                Self::row_to_application,
            )
            .optional()?;

        Ok(record)
    }

    fn list_applications(&self) -> StoreResult<Vec<ApplicationRecord>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT id, full_name, phone, email, age, job_position, status,
                    selected_slots, confirmed_slot, created_at, updated_at, expires_at
             FROM applications ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map([], Self::row_to_application)?;
        let mut applications = Vec::new();
        for row in rows {
            applications.push(row?);
        }

        Ok(applications)
    }

    fn set_application_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();

        let changes = conn.execute(
            "UPDATE applications SET status = ?, updated_at = ? WHERE id = ?",
            params![status.as_str(), updated_at.to_rfc3339(), id.as_str()],
        )?;

        Ok(changes > 0)
    }

    fn set_confirmed_slot(
        &self,
        id: &ApplicationId,
        snapshot: &SlotSnapshot,
        status: ApplicationStatus,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();
        let snapshot_json = serde_json::to_string(snapshot)?;

        let changes = conn.execute(
            "UPDATE applications SET confirmed_slot = ?, status = ?, updated_at = ? WHERE id = ?",
            params![
                snapshot_json,
                status.as_str(),
                updated_at.to_rfc3339(),
                id.as_str()
            ],
        )?;

        Ok(changes > 0)
    }

    fn clear_confirmed_slot(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();

        let changes = conn.execute(
            "UPDATE applications SET confirmed_slot = NULL, status = ?, updated_at = ? WHERE id = ?",
            params![status.as_str(), updated_at.to_rfc3339(), id.as_str()],
        )?;

        Ok(changes > 0)
    }

    fn delete_application(&self, id: &ApplicationId) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();
        let changes = conn.execute("DELETE FROM applications WHERE id = ?", [id.as_str()])?;
        Ok(changes > 0)
    }

    fn is_healthy(&self) -> bool {
        match self.conn.lock() {
            Ok(conn) => conn.query_row("SELECT 1", [], |_| Ok(())).is_ok(),
            Err(_) => {
                warn!("Store lock poisoned");
                false
            }
        }
    }
}
