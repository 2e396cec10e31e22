//! Record lifecycle operations over an injected store
//!
//! Global invariants enforced:
//! - Every stored record has passed validation
//! - An id is assigned once, on creation, and never reused
//! - Updates supersede the stored record; `created_at` survives

use crate::error::NotFound;
use crate::record::{generate_id, EvaluationRecord, RecordDraft, RecordSummary};
use crate::store::RecordStore;
use anyhow::Result;
use chrono::{DateTime, Utc};

/// Attempts at drawing an unused id before giving up
const ID_ATTEMPTS: usize = 8;

/// Validate a draft, assign a fresh id and store the new record
pub fn create_record(
    store: &mut dyn RecordStore,
    draft: &RecordDraft,
    now: DateTime<Utc>,
) -> Result<EvaluationRecord> {
    let mut record = EvaluationRecord::create(draft, now)?;
    let mut attempts = 1;
    while store.get(&record.id)?.is_some() {
        if attempts == ID_ATTEMPTS {
            anyhow::bail!("could not allocate an unused IPERC id");
        }
        log::debug!("id {} already taken, drawing another", record.id);
        record.id = generate_id(now);
        attempts += 1;
    }

    store.put(&record)?;
    log::info!(
        "created {} ({} rows, {} / {})",
        record.id,
        record.rows.len(),
        record.company,
        record.process
    );
    Ok(record)
}

/// Replace the header and rows of an existing record
///
/// Fails with [`NotFound`] when `id` is not stored.
pub fn update_record(
    store: &mut dyn RecordStore,
    id: &str,
    draft: &RecordDraft,
    now: DateTime<Utc>,
) -> Result<EvaluationRecord> {
    let current = load_record(store, id)?;
    let revised = current.revise(draft, now)?;
    store.put(&revised)?;
    log::info!("updated {} ({} rows)", revised.id, revised.rows.len());
    Ok(revised)
}

/// Fetch one record, failing with [`NotFound`] when absent
pub fn load_record(store: &dyn RecordStore, id: &str) -> Result<EvaluationRecord> {
    match store.get(id)? {
        Some(record) => Ok(record),
        None => Err(NotFound { id: id.to_string() }.into()),
    }
}

/// Summaries of stored records ordered by id
pub fn list_summaries(store: &dyn RecordStore, limit: usize) -> Result<Vec<RecordSummary>> {
    Ok(store
        .list(Some(limit))?
        .iter()
        .map(EvaluationRecord::summary)
        .collect())
}

/// Records with at least one row assigned to `name` (trimmed, case-insensitive)
pub fn find_by_responsible(store: &dyn RecordStore, name: &str) -> Result<Vec<EvaluationRecord>> {
    Ok(store
        .list(None)?
        .into_iter()
        .filter(|record| record.has_responsible(name))
        .collect())
}
