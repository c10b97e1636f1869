// Trust store: the set of known CT logs, indexed by log ID
//
// The store is built once from an externally supplied list (the list's own
// authenticity is the supplier's problem) and is read-only afterwards, so
// concurrent readers need no locking. Multiple independent stores can
// coexist in one process, which is how tests inject mock logs.

use crate::error::CtError;
use crate::model::LogId;
use crate::Result;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Lifecycle state of a CT log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogState {
    /// Submitted but still being evaluated
    Pending,
    /// Accepting submissions, gaining client trust
    Qualified,
    /// Accepting submissions and widely trusted
    Usable,
    /// No longer accepting submissions; existing SCTs remain valid
    #[serde(rename = "readonly")]
    ReadOnly,
    /// No longer trusted; SCTs issued before retirement may still count
    Retired,
    /// Never trusted
    Rejected,
}

impl LogState {
    /// True when SCTs from a log in this state can count towards a
    /// certificate's CT evidence
    pub fn is_qualifying(&self) -> bool {
        matches!(
            self,
            LogState::Qualified | LogState::Usable | LogState::ReadOnly
        )
    }
}

/// One known CT log: identity, key, operator and acceptance window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogInfo {
    pub id: LogId,
    /// SubjectPublicKeyInfo DER of the log's signing key
    pub public_key: Vec<u8>,
    pub operator: String,
    /// Base URL of the log's ct/v1 API, when known
    pub url: Option<String>,
    pub state: LogState,
    /// SCT timestamps before this instant are outside the log's shard
    pub valid_start_inclusive: Option<DateTime<Utc>>,
    /// SCT timestamps at or after this instant are outside the log's shard
    pub valid_end_exclusive: Option<DateTime<Utc>>,
}

impl LogInfo {
    /// Build a LogInfo, deriving the ID as SHA-256 of the public key
    pub fn new(public_key: Vec<u8>, operator: impl Into<String>, state: LogState) -> Self {
        let id = LogId(Sha256::digest(&public_key).into());
        Self {
            id,
            public_key,
            operator: operator.into(),
            url: None,
            state,
            valid_start_inclusive: None,
            valid_end_exclusive: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_validity_window(
        mut self,
        start_inclusive: Option<DateTime<Utc>>,
        end_exclusive: Option<DateTime<Utc>>,
    ) -> Self {
        self.valid_start_inclusive = start_inclusive;
        self.valid_end_exclusive = end_exclusive;
        self
    }

    /// True when an SCT issued at `timestamp_ms` falls inside the log's
    /// accepted window
    pub fn accepts_timestamp(&self, timestamp_ms: u64) -> bool {
        let millis = timestamp_ms as i64;
        if let Some(start) = self.valid_start_inclusive {
            if millis < start.timestamp_millis() {
                return false;
            }
        }
        if let Some(end) = self.valid_end_exclusive {
            if millis >= end.timestamp_millis() {
                return false;
            }
        }
        true
    }
}

/// Externally supplied log-list record, before validation/indexing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    /// Base64 of the 32-byte log ID; recomputed from the key when absent
    #[serde(default)]
    pub log_id: Option<String>,
    /// Base64 SubjectPublicKeyInfo DER
    pub public_key: String,
    pub operator: String,
    #[serde(default)]
    pub url: Option<String>,
    pub state: LogState,
    #[serde(default)]
    pub valid_start_inclusive: Option<DateTime<Utc>>,
    #[serde(default)]
    pub valid_end_exclusive: Option<DateTime<Utc>>,
}

/// Immutable mapping from log ID to log metadata
#[derive(Debug, Clone, Default)]
pub struct LogStore {
    logs: HashMap<LogId, LogInfo>,
}

impl LogStore {
    /// Index a list of logs; duplicate IDs are rejected
    pub fn from_logs(logs: Vec<LogInfo>) -> Result<Self> {
        let mut map = HashMap::with_capacity(logs.len());
        for log in logs {
            if map.insert(log.id, log).is_some() {
                return Err(CtError::internal("Duplicate log ID in trust store"));
            }
        }
        Ok(Self { logs: map })
    }

    /// Validate and index externally supplied records. A supplied log_id
    /// must match the SHA-256 of the supplied key.
    pub fn from_records(records: &[LogRecord]) -> Result<Self> {
        let mut logs = Vec::with_capacity(records.len());
        for record in records {
            let public_key = BASE64.decode(&record.public_key).map_err(|_| {
                CtError::encoding(format!(
                    "Bad log list entry for operator {}: the public_key is invalid.",
                    record.operator
                ))
            })?;
            let mut info = LogInfo::new(public_key, record.operator.clone(), record.state)
                .with_validity_window(record.valid_start_inclusive, record.valid_end_exclusive);
            if let Some(url) = &record.url {
                info = info.clone().with_url(url.clone());
            }

            if let Some(declared) = &record.log_id {
                let declared_bytes = BASE64.decode(declared).map_err(|_| {
                    CtError::encoding(format!(
                        "Bad log list entry for operator {}: the log_id is invalid.",
                        record.operator
                    ))
                })?;
                let declared_id = LogId::from_bytes(&declared_bytes)?;
                if declared_id != info.id {
                    return Err(CtError::internal(format!(
                        "Log ID for operator {} does not match SHA-256 of its public key",
                        record.operator
                    )));
                }
            }
            logs.push(info);
        }
        Self::from_logs(logs)
    }

    pub fn find(&self, id: &LogId) -> Option<&LogInfo> {
        self.logs.get(id)
    }

    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }
}
