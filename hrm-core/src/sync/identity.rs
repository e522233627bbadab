//! Natural keys used to address mirrored documents
//!
//! The remote document id of an entity is its local natural key, verbatim,
//! so resending the same entity overwrites instead of duplicating.

use crate::config::{EMPLOYEES_COLLECTION, REPORTS_COLLECTION};
use crate::database::{DailyCaderReport, Employee};
use serde::Serialize;

/// Kinds of entities mirrored by natural key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Employee,
    DailyCaderReport,
}

impl EntityKind {
    /// Remote collection holding documents of this kind
    pub fn collection(self) -> &'static str {
        match self {
            EntityKind::Employee => EMPLOYEES_COLLECTION,
            EntityKind::DailyCaderReport => REPORTS_COLLECTION,
        }
    }
}

/// An entity that can be mirrored as one whole document
pub trait SyncEntity: Serialize {
    const KIND: EntityKind;

    /// Remote document id; pure and stable across restarts
    fn remote_key(&self) -> &str;
}

impl SyncEntity for Employee {
    const KIND: EntityKind = EntityKind::Employee;

    fn remote_key(&self) -> &str {
        &self.epf_number
    }
}

impl SyncEntity for DailyCaderReport {
    const KIND: EntityKind = EntityKind::DailyCaderReport;

    fn remote_key(&self) -> &str {
        &self.report_date
    }
}

/// Free-function form of [`SyncEntity::remote_key`]
pub fn remote_key_for<T: SyncEntity>(entity: &T) -> &str {
    entity.remote_key()
}
