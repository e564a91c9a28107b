use std::collections::HashSet;

use crate::{
    dal::establishment_db::RecordStore,
    domain::{
        record::{DedupKey, Record, StoredRecord},
        search::{MergeMode, SearchRequest},
    },
    error::MonitorError,
};

use super::monitor::ResultSet;

#[derive(Debug, Clone, PartialEq)]
pub struct Merged {
    /// Everything the query now has, existing records first in store order.
    pub final_batch: Vec<StoredRecord>,
    /// The part of `final_batch` that is not stored yet.
    pub to_persist: Vec<StoredRecord>,
    pub replace_existing: bool,
    pub new_count: usize,
    pub existing_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    ConfirmationRequired { existing_count: usize },
    Completed(Merged),
}

/// Combines a freshly collected batch with what is stored for the same query.
/// Records are the same establishment when name and address match; the first
/// one seen stays.
pub fn reconcile(
    existing: Vec<StoredRecord>,
    incoming: Vec<Record>,
    mode: MergeMode,
) -> Reconciliation {
    match mode {
        MergeMode::New if !existing.is_empty() => Reconciliation::ConfirmationRequired {
            existing_count: existing.len(),
        },
        MergeMode::New | MergeMode::Merge => Reconciliation::Completed(merge(existing, incoming)),
        MergeMode::Overwrite => {
            let final_batch: Vec<StoredRecord> =
                incoming.into_iter().map(StoredRecord::fresh).collect();
            Reconciliation::Completed(Merged {
                to_persist: final_batch.clone(),
                replace_existing: true,
                new_count: final_batch.len(),
                existing_count: 0,
                final_batch,
            })
        }
    }
}

fn merge(existing: Vec<StoredRecord>, incoming: Vec<Record>) -> Merged {
    let existing_count = existing.len();
    let mut seen: HashSet<DedupKey> = HashSet::new();
    let mut final_batch: Vec<StoredRecord> = existing
        .into_iter()
        .filter(|stored| seen.insert(stored.record.dedup_key()))
        .collect();

    let to_persist: Vec<StoredRecord> = incoming
        .into_iter()
        .filter(|record| seen.insert(record.dedup_key()))
        .map(StoredRecord::fresh)
        .collect();

    final_batch.extend(to_persist.iter().cloned());

    Merged {
        new_count: to_persist.len(),
        existing_count,
        final_batch,
        to_persist,
        replace_existing: false,
    }
}

/// `Some(existing_count)` when a `new` search would clobber stored data.
pub async fn pending_confirmation<S: RecordStore>(
    store: &S,
    request: &SearchRequest,
) -> Result<Option<usize>, sqlx::Error> {
    if request.mode != MergeMode::New {
        return Ok(None);
    }
    let existing = store.find(&request.key()).await?;
    Ok(match existing.len() {
        0 => None,
        n => Some(n),
    })
}

/// Reconciles against the store, persists the outcome and returns the view to
/// publish, cut to the requested number of results.
pub async fn reconcile_and_store<S: RecordStore>(
    store: &S,
    request: &SearchRequest,
    incoming: Vec<Record>,
) -> Result<ResultSet, MonitorError> {
    let key = request.key();
    let existing = store.find(&key).await?;

    let merged = match reconcile(existing, incoming, request.mode) {
        Reconciliation::ConfirmationRequired { existing_count } => {
            return Err(MonitorError::ConfirmationRequired { existing_count })
        }
        Reconciliation::Completed(merged) => merged,
    };

    store
        .save(
            &key,
            request.source,
            &merged.to_persist,
            merged.replace_existing,
        )
        .await?;
    log::info!(
        "Reconciled \"{}\" ({:?}): {} new, {} existing, {} total",
        request.query(),
        request.mode,
        merged.new_count,
        merged.existing_count,
        merged.final_batch.len()
    );

    Ok(ResultSet {
        search_params: Some(request.clone()),
        total_found: merged.final_batch.len(),
        new_count: merged.new_count,
        existing_count: merged.existing_count,
        results: merged
            .final_batch
            .into_iter()
            .take(request.max_results)
            .map(|stored| stored.record)
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::{pending_confirmation, reconcile, reconcile_and_store, Reconciliation};
    use crate::{
        dal::establishment_db::memory::MemoryStore,
        domain::{
            record::{Record, StoredRecord},
            search::{MergeMode, SearchRequest, Source},
        },
        error::MonitorError,
    };

    fn at(name: &str, address: &str) -> Record {
        let mut record = Record::named(name);
        record.address = Some(address.to_string());
        record
    }

    fn request(mode: MergeMode, max_results: usize) -> SearchRequest {
        SearchRequest {
            establishment_type: "padarias".to_string(),
            region: "Campo Grande".to_string(),
            max_results,
            source: Source::GoogleMaps,
            mode,
        }
    }

    fn completed(reconciliation: Reconciliation) -> super::Merged {
        match reconciliation {
            Reconciliation::Completed(merged) => merged,
            other => panic!("expected a completed reconciliation, got {:?}", other),
        }
    }

    #[test]
    fn merge_keeps_existing_instance() {
        let mut stored_a = at("A", "X");
        stored_a.phone = Some("1111".to_string());
        let existing = StoredRecord::fresh(stored_a);
        let mut incoming_a = at("A", "X");
        incoming_a.phone = Some("2222".to_string());

        let merged = completed(reconcile(
            vec![existing.clone()],
            vec![incoming_a, at("B", "Y")],
            MergeMode::Merge,
        ));

        assert_eq!(merged.final_batch.len(), 2);
        assert_eq!(merged.new_count, 1);
        assert_eq!(merged.existing_count, 1);
        assert_eq!(merged.final_batch[0], existing);
        assert_eq!(merged.final_batch[1].record.name, "B");
        assert_eq!(merged.to_persist.len(), 1);
        assert!(!merged.replace_existing);
    }

    #[test]
    fn merge_treats_missing_address_as_part_of_key() {
        let merged = completed(reconcile(
            vec![StoredRecord::fresh(Record::named("A"))],
            vec![Record::named("A"), at("A", "X"), at("A", "X")],
            MergeMode::Merge,
        ));

        assert_eq!(merged.new_count, 1);
        assert_eq!(merged.final_batch.len(), 2);
    }

    #[test]
    fn merge_collapses_duplicate_stored_keys() {
        let stored = completed(reconcile(
            vec![],
            vec![Record::failed(), Record::failed(), at("A", "X")],
            MergeMode::Overwrite,
        ))
        .final_batch;
        let first_failed = stored[0].clone();

        let merged = completed(reconcile(
            stored,
            vec![Record::failed(), at("B", "Y")],
            MergeMode::Merge,
        ));

        let names: Vec<&str> = merged
            .final_batch
            .iter()
            .map(|s| s.record.name.as_str())
            .collect();
        assert_eq!(names, ["Erro na Coleta", "A", "B"]);
        assert_eq!(merged.final_batch[0], first_failed);
        assert_eq!(merged.existing_count, 3);
        assert_eq!(merged.new_count, 1);
    }

    #[test]
    fn new_with_existing_asks_for_confirmation() {
        let existing = vec![StoredRecord::fresh(at("A", "X"))];

        assert_eq!(
            reconcile(existing, vec![at("B", "Y")], MergeMode::New),
            Reconciliation::ConfirmationRequired { existing_count: 1 }
        );
    }

    #[test]
    fn new_on_empty_store_dedups_like_merge() {
        let merged = completed(reconcile(
            vec![],
            vec![at("A", "X"), at("A", "X"), at("B", "Y")],
            MergeMode::New,
        ));

        assert_eq!(merged.new_count, 2);
        assert_eq!(merged.existing_count, 0);
    }

    #[test]
    fn overwrite_returns_incoming_exactly() {
        let incoming = vec![at("A", "X"), at("A", "X"), Record::failed()];

        let merged = completed(reconcile(
            vec![StoredRecord::fresh(at("Z", "W"))],
            incoming.clone(),
            MergeMode::Overwrite,
        ));

        let records: Vec<Record> = merged.final_batch.into_iter().map(|s| s.record).collect();
        assert_eq!(records, incoming);
        assert!(merged.replace_existing);
        assert_eq!(merged.new_count, 3);
    }

    #[test]
    fn reconcile_is_deterministic() {
        let existing = vec![StoredRecord::fresh(at("A", "X"))];
        let incoming = vec![at("C", "1"), at("A", "X"), at("B", "2")];

        let names = |m: super::Merged| -> Vec<String> {
            m.final_batch.into_iter().map(|s| s.record.name).collect()
        };
        let first = names(completed(reconcile(
            existing.clone(),
            incoming.clone(),
            MergeMode::Merge,
        )));
        let second = names(completed(reconcile(existing, incoming, MergeMode::Merge)));

        assert_eq!(first, ["A", "C", "B"]);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn confirmation_leaves_store_untouched() {
        let req = request(MergeMode::New, 20);
        let existing = StoredRecord::fresh(at("A", "X"));
        let store = MemoryStore::seeded(req.key(), vec![existing.clone()]);

        assert_eq!(pending_confirmation(&store, &req).await.unwrap(), Some(1));

        let result = reconcile_and_store(&store, &req, vec![at("B", "Y")]).await;

        assert!(matches!(
            result,
            Err(MonitorError::ConfirmationRequired { existing_count: 1 })
        ));
        assert_eq!(store.stored(&req.key()), vec![existing]);
        assert_eq!(*store.saves.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn merge_persists_only_new_and_truncates_view() {
        let req = request(MergeMode::Merge, 2);
        let store = MemoryStore::seeded(req.key(), vec![StoredRecord::fresh(at("A", "X"))]);

        let view = reconcile_and_store(&store, &req, vec![at("B", "Y"), at("C", "Z")])
            .await
            .unwrap();

        assert_eq!(view.results.len(), 2);
        assert_eq!(view.total_found, 3);
        assert_eq!(view.new_count, 2);
        assert_eq!(view.existing_count, 1);
        assert_eq!(store.stored(&req.key()).len(), 3);
    }

    #[tokio::test]
    async fn overwrite_replaces_stored_batch() {
        let req = request(MergeMode::Overwrite, 20);
        let store = MemoryStore::seeded(req.key(), vec![StoredRecord::fresh(at("A", "X"))]);

        assert_eq!(pending_confirmation(&store, &req).await.unwrap(), None);
        reconcile_and_store(&store, &req, vec![at("B", "Y")])
            .await
            .unwrap();

        let stored = store.stored(&req.key());
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].record.name, "B");
    }
}
