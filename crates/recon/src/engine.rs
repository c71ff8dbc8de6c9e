use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::mapping::ValidatedMapping;
use crate::model::{resolve_path, SourceRecord, TargetRecord};
use crate::queue::{ChangeRecord, PartialEntity, UpdateQueue, UpdateStatus};

/// Counters for one diff pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    pub targets: usize,
    /// Matched and divergent: a pending record was written.
    pub matched: usize,
    pub up_to_date: usize,
    pub no_source_match: usize,
    pub skipped_finalized: usize,
}

/// Join map over source records. The first record with a given name wins.
pub fn index_by_name<S: SourceRecord>(sources: &[S]) -> BTreeMap<&str, &S> {
    let mut index = BTreeMap::new();
    for source in sources {
        let Some(name) = source.name().filter(|n| !n.is_empty()) else {
            continue;
        };
        if index.contains_key(name) {
            debug!(name, link = source.link(), "duplicate source name ignored");
            continue;
        }
        index.insert(name, source);
    }
    index
}

/// Fields whose mapped source value should overwrite the target's, plus the
/// source path each came from.
pub fn diff_record<S: SourceRecord, T: TargetRecord>(
    source: &S,
    target: &T,
    mapping: &ValidatedMapping<S, T>,
) -> (PartialEntity, BTreeMap<String, String>) {
    let mut changes = PartialEntity::new();
    let mut provenance = BTreeMap::new();

    for entry in mapping.entries() {
        let path = entry.source_path();
        let Some(mut value) = resolve_path(source, path) else {
            continue;
        };

        if let Some(transform) = entry.transform {
            value = match transform.apply(value) {
                Ok(v) => v,
                Err(e) => {
                    warn!(
                        id = target.id(),
                        field = %entry.target,
                        path,
                        error = %e,
                        "transform failed, field skipped"
                    );
                    continue;
                }
            };
        }

        // A zero from the wiki means "not known yet", never "zero".
        if value.is_zero() {
            continue;
        }

        if target
            .value(&entry.target)
            .is_some_and(|current| current.same_as(&value))
        {
            continue;
        }

        changes.insert(entry.target.clone(), value);
        provenance.insert(entry.target.clone(), path.to_string());
    }

    (changes, provenance)
}

/// Diff every target against its same-named source and queue the divergent ones.
///
/// Submitted and failed records are left alone; pending ones are recomputed
/// and overwritten. Records for targets absent from `targets` are retained.
pub fn prepare_updates<S: SourceRecord, T: TargetRecord>(
    queue: &mut UpdateQueue,
    sources: &BTreeMap<&str, &S>,
    targets: &[T],
    mapping: &ValidatedMapping<S, T>,
) -> MatchSummary {
    let mut summary = MatchSummary {
        targets: targets.len(),
        ..MatchSummary::default()
    };

    for target in targets {
        let id = target.id();
        if queue.is_finalized(id) {
            summary.skipped_finalized += 1;
            continue;
        }

        let Some(source) = target.name().and_then(|name| sources.get(name)) else {
            summary.no_source_match += 1;
            continue;
        };

        let (changes, field_provenance) = diff_record(*source, target, mapping);
        if changes.is_empty() {
            summary.up_to_date += 1;
            continue;
        }

        debug!(id, name = target.name(), fields = changes.len(), "divergence queued");
        queue.insert(ChangeRecord {
            id,
            name: target.name().unwrap_or_default().to_string(),
            source_link: source.link().to_string(),
            status: UpdateStatus::Pending,
            field_provenance,
            changes,
        });
        summary.matched += 1;
    }

    info!(
        targets = summary.targets,
        matched = summary.matched,
        up_to_date = summary.up_to_date,
        no_source_match = summary.no_source_match,
        skipped_finalized = summary.skipped_finalized,
        "diff pass complete"
    );

    summary
}
