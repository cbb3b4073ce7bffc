//! Creation and modification provenance shared by every persisted record.
//!
//! Records embed an [`AuditInfo`] value instead of inheriting audit columns.
//! The columns themselves are stamped by the entities' `before_save` hooks and
//! by the service layer, never by the record.

use chrono::{DateTime, Utc};
use sea_orm::ActiveValue;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Who created a record and who touched it last, and when.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditInfo {
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub last_modified_at: Option<DateTime<Utc>>,
    pub last_modified_by: Option<String>,
}

impl AuditInfo {
    /// Provenance of a record that has just been created and never modified.
    pub fn created(at: DateTime<Utc>, by: Option<String>) -> Self {
        Self {
            created_at: at,
            created_by: by,
            last_modified_at: None,
            last_modified_by: None,
        }
    }

    /// The most recent point in time the record was written.
    pub fn last_touched_at(&self) -> DateTime<Utc> {
        self.last_modified_at.unwrap_or(self.created_at)
    }
}

/// Uniform access to audit metadata across audited records.
pub trait Auditable {
    fn audit_info(&self) -> AuditInfo;
}

/// Stamps the audit columns of an active model that is about to be saved.
///
/// On insert the creation timestamp is set and modification fields are cleared.
/// On update the modification timestamp is refreshed and any write to the
/// creation columns is dropped, so creation provenance can never change.
pub(crate) fn stamp(
    created_at: &mut ActiveValue<DateTime<Utc>>,
    created_by: &mut ActiveValue<Option<String>>,
    last_modified_at: &mut ActiveValue<Option<DateTime<Utc>>>,
    last_modified_by: &mut ActiveValue<Option<String>>,
    insert: bool,
) {
    let now = Utc::now();
    trace!(insert, %now, "Stamping audit columns");
    if insert {
        *created_at = ActiveValue::Set(now);
        if created_by.is_not_set() {
            *created_by = ActiveValue::Set(None);
        }
        *last_modified_at = ActiveValue::Set(None);
        *last_modified_by = ActiveValue::Set(None);
    } else {
        if created_at.is_set() {
            *created_at = ActiveValue::NotSet;
        }
        if created_by.is_set() {
            *created_by = ActiveValue::NotSet;
        }
        *last_modified_at = ActiveValue::Set(Some(now));
    }
}
