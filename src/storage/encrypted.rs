//! SQLite-backed request store. The `name` column is AES-GCM encrypted with a key
//! derived from a configured secret; everything else is stored in the clear so
//! the features stay queryable.

use super::{PersistenceSink, StoredRequest};
use crate::errors::StoreError;
use crate::features::EngineeredFeatures;
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{TimeZone, Utc};
use rand::RngCore;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS user_requests (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    request_id TEXT NOT NULL,
    user_id TEXT,
    name_enc TEXT,
    created_at INTEGER NOT NULL,
    work_hours REAL NOT NULL,
    screen_time_hours REAL NOT NULL,
    meetings_count INTEGER NOT NULL,
    breaks_taken INTEGER NOT NULL,
    after_hours_work INTEGER NOT NULL,
    sleep_hours REAL NOT NULL,
    task_completion_rate REAL NOT NULL,
    is_weekday INTEGER NOT NULL,
    work_intensity_ratio REAL,
    meeting_burden REAL,
    break_adequacy REAL,
    sleep_deficit REAL,
    recovery_index REAL,
    fatigue_risk REAL,
    workload_pressure REAL,
    task_efficiency REAL,
    work_life_balance_score REAL,
    screen_time_per_meeting REAL,
    work_hours_productivity REAL,
    health_risk_score REAL,
    after_hours_work_hours_est REAL,
    high_workload_flag INTEGER,
    poor_recovery_flag INTEGER
);
CREATE INDEX IF NOT EXISTS idx_user_requests_created ON user_requests(created_at);
"#;

const SELECT_COLUMNS: &str = "request_id, user_id, name_enc, created_at, \
    work_hours, screen_time_hours, meetings_count, breaks_taken, after_hours_work, \
    sleep_hours, task_completion_rate, is_weekday, work_intensity_ratio, meeting_burden, \
    break_adequacy, sleep_deficit, recovery_index, fatigue_risk, workload_pressure, \
    task_efficiency, work_life_balance_score, screen_time_per_meeting, \
    work_hours_productivity, health_risk_score, after_hours_work_hours_est, \
    high_workload_flag, poor_recovery_flag";

fn derive_key(seed: &[u8]) -> [u8; KEY_LEN] {
    use ring::digest;
    let mut out = [0u8; KEY_LEN];
    let h = digest::digest(&digest::SHA256, seed);
    out[..h.as_ref().len().min(KEY_LEN)].copy_from_slice(h.as_ref());
    out
}

fn encrypt(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<String, StoreError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| StoreError::Encrypt)?;
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);
    let ciphertext = cipher
        .encrypt((&nonce).into(), plaintext)
        .map_err(|_| StoreError::Encrypt)?;
    let mut out = nonce.to_vec();
    out.extend(ciphertext);
    Ok(BASE64.encode(&out))
}

fn decrypt(key: &[u8; KEY_LEN], encoded: &str) -> Result<Vec<u8>, StoreError> {
    let raw = BASE64.decode(encoded).map_err(|e| StoreError::Decrypt {
        reason: e.to_string(),
    })?;
    if raw.len() < NONCE_LEN {
        return Err(StoreError::Decrypt {
            reason: "payload too short".to_string(),
        });
    }
    let (nonce, ct) = raw.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| StoreError::Decrypt {
        reason: e.to_string(),
    })?;
    cipher.decrypt(nonce.into(), ct).map_err(|_| StoreError::Decrypt {
        reason: "authentication failed".to_string(),
    })
}

/// Columns read back before the name is decrypted.
struct RawRow {
    request_id: String,
    user_id: Option<String>,
    name_enc: Option<String>,
    created_at: i64,
    features: EngineeredFeatures,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        request_id: row.get(0)?,
        user_id: row.get(1)?,
        name_enc: row.get(2)?,
        created_at: row.get(3)?,
        features: EngineeredFeatures {
            work_hours: row.get(4)?,
            screen_time_hours: row.get(5)?,
            meetings_count: row.get(6)?,
            breaks_taken: row.get(7)?,
            after_hours_work: row.get(8)?,
            sleep_hours: row.get(9)?,
            task_completion_rate: row.get(10)?,
            is_weekday: row.get(11)?,
            work_intensity_ratio: row.get(12)?,
            meeting_burden: row.get(13)?,
            break_adequacy: row.get(14)?,
            sleep_deficit: row.get(15)?,
            recovery_index: row.get(16)?,
            fatigue_risk: row.get(17)?,
            workload_pressure: row.get(18)?,
            task_efficiency: row.get(19)?,
            work_life_balance_score: row.get(20)?,
            screen_time_per_meeting: row.get(21)?,
            work_hours_productivity: row.get(22)?,
            health_risk_score: row.get(23)?,
            after_hours_work_hours_est: row.get(24)?,
            high_workload_flag: row.get(25)?,
            poor_recovery_flag: row.get(26)?,
        },
    })
}

pub struct RequestStore {
    conn: Mutex<Connection>,
    key: [u8; KEY_LEN],
}

impl RequestStore {
    /// Open or create DB at path. Key is derived from `secret`.
    pub fn open(path: &Path, secret: &[u8]) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            key: derive_key(secret),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Insert one request; returns the row id.
    pub fn insert(&self, record: &StoredRequest) -> Result<i64, StoreError> {
        let name_enc = record
            .name
            .as_deref()
            .map(|n| encrypt(&self.key, n.as_bytes()))
            .transpose()?;
        let f = &record.features;
        let conn = self.conn();
        conn.execute(
            "INSERT INTO user_requests (request_id, user_id, name_enc, created_at, \
             work_hours, screen_time_hours, meetings_count, breaks_taken, after_hours_work, \
             sleep_hours, task_completion_rate, is_weekday, work_intensity_ratio, meeting_burden, \
             break_adequacy, sleep_deficit, recovery_index, fatigue_risk, workload_pressure, \
             task_efficiency, work_life_balance_score, screen_time_per_meeting, \
             work_hours_productivity, health_risk_score, after_hours_work_hours_est, \
             high_workload_flag, poor_recovery_flag) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, \
             ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27)",
            params![
                record.request_id,
                record.user_id,
                name_enc,
                record.created_at.timestamp_millis(),
                f.work_hours,
                f.screen_time_hours,
                f.meetings_count,
                f.breaks_taken,
                f.after_hours_work,
                f.sleep_hours,
                f.task_completion_rate,
                f.is_weekday,
                f.work_intensity_ratio,
                f.meeting_burden,
                f.break_adequacy,
                f.sleep_deficit,
                f.recovery_index,
                f.fatigue_risk,
                f.workload_pressure,
                f.task_efficiency,
                f.work_life_balance_score,
                f.screen_time_per_meeting,
                f.work_hours_productivity,
                f.health_risk_score,
                f.after_hours_work_hours_est,
                f.high_workload_flag,
                f.poor_recovery_flag,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Read a request by its request id (name decrypted).
    pub fn get(&self, request_id: &str) -> Result<Option<StoredRequest>, StoreError> {
        let raw = {
            let conn = self.conn();
            let sql = format!("SELECT {SELECT_COLUMNS} FROM user_requests WHERE request_id = ?1");
            let raw = conn.query_row(&sql, params![request_id], read_row).optional()?;
            raw
        };
        raw.map(|r| self.decode(r)).transpose()
    }

    /// Most recent requests first.
    pub fn recent(&self, limit: usize) -> Result<Vec<StoredRequest>, StoreError> {
        let rows = {
            let conn = self.conn();
            let sql = format!(
                "SELECT {SELECT_COLUMNS} FROM user_requests ORDER BY created_at DESC, id DESC LIMIT ?1"
            );
            let mut stmt = conn.prepare(&sql)?;
            let limit = i64::try_from(limit).unwrap_or(i64::MAX);
            let rows = stmt
                .query_map(params![limit], read_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };
        rows.into_iter().map(|r| self.decode(r)).collect()
    }

    pub fn count(&self) -> Result<u64, StoreError> {
        let n: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM user_requests", [], |row| row.get(0))?;
        Ok(u64::try_from(n).unwrap_or(0))
    }

    /// Retention: delete requests created before the given epoch millis
    pub fn prune_before(&self, ts_millis: i64) -> Result<u64, StoreError> {
        let n = self
            .conn()
            .execute("DELETE FROM user_requests WHERE created_at < ?1", params![ts_millis])?;
        Ok(n as u64)
    }

    fn decode(&self, raw: RawRow) -> Result<StoredRequest, StoreError> {
        let name = match raw.name_enc {
            Some(enc) => {
                let plain = decrypt(&self.key, &enc)?;
                Some(String::from_utf8(plain).map_err(|e| StoreError::Decrypt {
                    reason: e.to_string(),
                })?)
            }
            None => None,
        };
        let created_at = Utc
            .timestamp_millis_opt(raw.created_at)
            .single()
            .unwrap_or_default();
        Ok(StoredRequest {
            request_id: raw.request_id,
            user_id: raw.user_id,
            name,
            created_at,
            features: raw.features,
        })
    }
}

impl PersistenceSink for RequestStore {
    fn store(&self, record: &StoredRequest) -> Result<i64, StoreError> {
        self.insert(record)
    }
}
