use std::io::Write;

use crate::{
    domain::{
        progress::ProgressEvent,
        record::{Columns, Record},
    },
    error::ScrapeError,
};

use super::{
    enumerator::enumerate,
    extractor::extract_record,
    surface::{maps, pause, MapsSurface, Pacing},
};

/// Writes one progress line and flushes so the monitor sees it right away.
/// A closed pipe only costs us progress reporting, never the batch.
fn emit<W: Write>(out: &mut W, event: ProgressEvent) {
    if let Err(e) = writeln!(out, "{}", event).and_then(|_| out.flush()) {
        log::warn!("Could not write progress line '{}': {:?}", event, e);
    }
}

/// Opens each listing in turn and extracts its fields.
///
/// A listing whose name never shows up is skipped without a row. Any other
/// failure produces an error row, so later listings keep their positions.
pub async fn collect<S: MapsSurface, W: Write>(
    surface: &S,
    listings: &[S::Listing],
    pacing: &Pacing,
    out: &mut W,
) -> Columns {
    let total = listings.len() as u32;
    let mut columns = Columns::default();

    emit(out, ProgressEvent::TotalFound(total));

    for (i, listing) in listings.iter().enumerate() {
        let current = i as u32 + 1;
        emit(out, ProgressEvent::Collecting { current, total });

        match collect_one(surface, listing, pacing).await {
            Ok(Some(record)) => columns.push(record),
            Ok(None) => {
                log::warn!(
                    "Listing {} took too long to load its details, skipping",
                    current
                );
            }
            Err(e) => {
                log::error!("Error collecting listing {}: {}", current, e);
                columns.push_failed();
            }
        }

        pause(pacing.between_listings()).await;
    }

    columns
}

/// `Ok(None)` when the detail pane timed out.
async fn collect_one<S: MapsSurface>(
    surface: &S,
    listing: &S::Listing,
    pacing: &Pacing,
) -> Result<Option<Record>, ScrapeError> {
    surface.open(listing).await?;

    if !surface.wait_for(&maps::NAME, pacing.detail_timeout).await? {
        return Ok(None);
    }
    pause(pacing.detail_settle).await;

    extract_record(surface).await.map(Some)
}

/// Enumerates then collects. Only an empty result list is fatal.
pub async fn run_extraction<S: MapsSurface, W: Write>(
    surface: &S,
    query: &str,
    target: usize,
    pacing: &Pacing,
    out: &mut W,
) -> Result<Columns, ScrapeError> {
    let enumeration = enumerate(surface, query, target, pacing).await?;
    log::info!(
        "Enumeration stopped ({:?}), collecting {} listings",
        enumeration.stop,
        enumeration.listings.len()
    );

    Ok(collect(surface, &enumeration.listings, pacing, out).await)
}

#[cfg(test)]
mod tests {
    use super::{collect, run_extraction};
    use crate::{
        domain::record::COLLECTION_ERROR,
        services::surface::{
            maps,
            scripted::{instant, Pane, ScriptedSurface},
        },
    };

    fn named(name: &str) -> Pane {
        Pane::default()
            .text(maps::NAME.primary, name)
            .text(maps::ADDRESS.primary, &format!("Rua {}", name))
    }

    #[tokio::test]
    async fn timeout_skips_without_partial_row() {
        let surface =
            ScriptedSurface::with_panes(vec![named("Um"), Pane::stalled(), named("Três")]);
        let mut out = vec![];

        let columns = collect(&surface, &[0, 1, 2], &instant(), &mut out).await;

        assert!(columns.is_aligned());
        assert_eq!(columns.len(), 2);
        assert_eq!(columns.names(), ["Um", "Três"]);

        let lines = String::from_utf8(out).unwrap();
        assert_eq!(
            lines.lines().collect::<Vec<_>>(),
            vec![
                "Total Found: 3",
                "Coletando dados do estabelecimento 1/3...",
                "Coletando dados do estabelecimento 2/3...",
                "Coletando dados do estabelecimento 3/3...",
            ]
        );
    }

    #[tokio::test]
    async fn errors_produce_sentinel_rows_in_place() {
        let surface =
            ScriptedSurface::with_panes(vec![named("Um"), Pane::broken(), named("Três")]);
        let mut out = vec![];

        let columns = collect(&surface, &[0, 1, 2], &instant(), &mut out).await;

        assert!(columns.is_aligned());
        let records = columns.into_records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].name, COLLECTION_ERROR);
        assert_eq!(records[1].address, None);
        assert_eq!(records[2].address.as_deref(), Some("Rua Três"));
    }

    #[tokio::test]
    async fn run_extraction_fails_without_listings() {
        let surface = ScriptedSurface::new(vec![], vec![0]);
        let mut out = vec![];

        let result = run_extraction(&surface, "lojas", 5, &instant(), &mut out).await;

        assert!(result.is_err());
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn run_extraction_collects_up_to_target() {
        let panes = (0..6).map(|i| named(&format!("Loja {}", i))).collect();
        let surface = ScriptedSurface::new(panes, vec![2, 4, 6]);
        let mut out = vec![];

        let columns = run_extraction(&surface, "lojas", 5, &instant(), &mut out)
            .await
            .unwrap();

        assert_eq!(columns.len(), 5);
        assert!(String::from_utf8(out).unwrap().starts_with("Total Found: 5\n"));
    }
}
