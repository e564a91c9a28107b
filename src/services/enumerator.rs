use crate::error::ScrapeError;

use super::surface::{pause, MapsSurface, Pacing};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    TargetReached,
    NoGrowth,
    AttemptsExhausted,
}

pub struct Enumeration<L> {
    pub listings: Vec<L>,
    pub stop: StopReason,
}

/// Scrolls the result list until `target` listings are rendered, the list
/// stops growing, or the scroll attempts run out, then returns at most
/// `target` listings in render order.
pub async fn enumerate<S: MapsSurface>(
    surface: &S,
    query: &str,
    target: usize,
    pacing: &Pacing,
) -> Result<Enumeration<S::Listing>, ScrapeError> {
    if !surface.wait_for_listings(pacing.listings_timeout).await? {
        log::error!(
            "Could not find results for \"{}\" within {:?}",
            query,
            pacing.listings_timeout
        );
        return Err(ScrapeError::NoListings {
            query: query.to_string(),
            timeout_secs: pacing.listings_timeout.as_secs(),
        });
    }
    log::info!("Search results found, scrolling");

    let mut previously_counted = 0;
    let mut attempts = 0;
    let stop = loop {
        if attempts >= pacing.max_scroll_attempts {
            log::info!("Maximum scroll attempts reached");
            break StopReason::AttemptsExhausted;
        }

        surface.scroll_listings().await?;
        pause(pacing.scroll_pause).await;

        let current = surface.listing_count().await?;
        log::info!("Listings rendered so far: {}", current);

        if current >= target {
            log::info!("Requested number of results ({}) reached", target);
            break StopReason::TargetReached;
        }
        if current == previously_counted {
            log::info!("No more results after scrolling. Total: {}", current);
            break StopReason::NoGrowth;
        }
        previously_counted = current;
        attempts += 1;
    };

    let mut listings = surface.listings().await?;
    listings.truncate(target);
    log::info!("Total listings to collect: {}", listings.len());

    Ok(Enumeration { listings, stop })
}
