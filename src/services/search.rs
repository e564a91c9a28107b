use crate::{
    dal::establishment_db::RecordStore, domain::search::SearchRequest, error::MonitorError,
};

use super::{
    monitor::{Monitor, ResultSet},
    reconciler::reconcile_and_store,
};

/// Background half of a search: the caller has already claimed the monitor
/// with `try_begin`. The outcome always lands in the monitor's state.
pub async fn run_search<S: RecordStore>(monitor: &Monitor, store: &S, request: SearchRequest) {
    match execute(monitor, store, &request).await {
        Ok(results) => {
            log::info!(
                "Search \"{}\" finished with {} results",
                request.query(),
                results.results.len()
            );
            monitor.complete(results);
        }
        Err(e) => {
            log::error!("Search \"{}\" failed: {}", request.query(), e);
            monitor.fail(&e);
        }
    }
}

async fn execute<S: RecordStore>(
    monitor: &Monitor,
    store: &S,
    request: &SearchRequest,
) -> Result<ResultSet, MonitorError> {
    let incoming = monitor.run(request).await?;
    reconcile_and_store(store, request, incoming).await
}
