//! Outbox applier: renders each change record as a submission request on disk.
//!
//! One file per record at `<outbox>/<resource>/<id>.json`. The request holds
//! everything a reviewer needs to file the edit: form URL, field values,
//! reason text and the source path behind every value.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use catsync_recon::{Applier, ApplyError, ChangeRecord, FieldValue, ResourceType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub resource: ResourceType,
    pub id: u64,
    pub name: String,
    pub edit_url: String,
    pub fields: BTreeMap<String, FieldValue>,
    pub details: String,
    pub evidence: BTreeMap<String, String>,
}

impl SubmissionRequest {
    pub fn render(edit_base: &str, resource: ResourceType, record: &ChangeRecord) -> Self {
        let edit_url = format!(
            "{}?resource={}&request_action=edit&id_reference={}",
            edit_base, resource, record.id
        );
        let details = format!(
            "[AUTOMATED UPDATE] Updated Fields: {} - Data Source: {}",
            record.changed_fields().join(", "),
            record.source_link
        );

        Self {
            resource,
            id: record.id,
            name: record.name.clone(),
            edit_url,
            fields: record.changes.clone(),
            details,
            evidence: record.field_provenance.clone(),
        }
    }
}

pub struct OutboxApplier {
    dir: PathBuf,
    edit_base: String,
}

impl OutboxApplier {
    pub fn new(dir: impl Into<PathBuf>, edit_base: &str) -> Self {
        Self {
            dir: dir.into(),
            edit_base: edit_base.to_string(),
        }
    }

    pub fn path_for(&self, resource: ResourceType, id: u64) -> PathBuf {
        self.dir.join(resource.as_str()).join(format!("{id}.json"))
    }

    fn write(&self, path: &Path, request: &SubmissionRequest) -> Result<(), ApplyError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(request)?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl Applier for OutboxApplier {
    fn apply(
        &mut self,
        resource: ResourceType,
        record: &ChangeRecord,
        dry_run: bool,
    ) -> Result<bool, ApplyError> {
        if !record.is_pending() {
            warn!(%resource, id = record.id, status = %record.status, "record is not pending");
            return Ok(false);
        }

        if record.changes.is_empty() {
            info!(%resource, id = record.id, "no changes, nothing to submit");
            return Ok(true);
        }

        let request = SubmissionRequest::render(&self.edit_base, resource, record);
        let path = self.path_for(resource, record.id);

        if dry_run {
            info!(
                %resource,
                id = record.id,
                edit_url = %request.edit_url,
                details = %request.details,
                "dry run, submission not written"
            );
            return Ok(true);
        }

        self.write(&path, &request)?;
        info!(%resource, id = record.id, file = %path.display(), "submission written");
        Ok(true)
    }
}
