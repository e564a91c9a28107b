use std::time::Duration;

use rand::Rng;

use crate::error::ScrapeError;

/// An XPath to try first and an optional one to fall back on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locator {
    pub primary: &'static str,
    pub fallback: Option<&'static str>,
}

impl Locator {
    pub const fn new(primary: &'static str) -> Self {
        Locator {
            primary,
            fallback: None,
        }
    }

    pub const fn with_fallback(primary: &'static str, fallback: &'static str) -> Self {
        Locator {
            primary,
            fallback: Some(fallback),
        }
    }

    pub fn xpaths(&self) -> impl Iterator<Item = &'static str> {
        std::iter::once(self.primary).chain(self.fallback)
    }

    /// Single XPath matching either alternative.
    pub fn union(&self) -> String {
        self.xpaths().collect::<Vec<_>>().join(" | ")
    }
}

pub mod maps {
    use super::Locator;

    pub const LISTING: &str = r#"//a[contains(@href, "https://www.google.com/maps/place")]"#;

    pub const NAME: Locator = Locator::with_fallback(
        r#"//h1[contains(@class, "DUwDvf")]"#,
        r#"//div[contains(@class, "fontHeadlineLarge")]/span[contains(@class, "fontHeadlineLarge")]"#,
    );
    pub const CATEGORY: Locator = Locator::new(r#"//button[contains(@jsaction, "category")]"#);
    pub const ADDRESS: Locator = Locator::with_fallback(
        r#"//button[@data-item-id="address"]//div[contains(@class, "fontBodyMedium")]"#,
        r#"//button[@data-item-id="address"]"#,
    );
    pub const PHONE: Locator = Locator::with_fallback(
        r#"//button[contains(@data-item-id, "phone:tel:")]//div[contains(@class, "fontBodyMedium")]"#,
        r#"//button[contains(@data-item-id, "phone:tel:")]"#,
    );
    pub const WEBSITE: Locator = Locator::with_fallback(
        r#"//a[@data-item-id="authority"]//div[contains(@class, "fontBodyMedium")]"#,
        r#"//a[@data-item-id="authority"]"#,
    );
    pub const OPENING_HOURS: Locator = Locator::with_fallback(
        r#"//button[contains(@data-item-id, "oh")]"#,
        r#"//div[contains(@aria-label, "Horário")]"#,
    );
    pub const INTRODUCTION: Locator =
        Locator::new(r#"//div[contains(@class, "WeS02d")]//div[contains(@class, "PYvSYb")]"#);

    /// Combined "4,5 (1.234)" block. The count fallback reads the nested span's aria-label.
    pub const REVIEWS: &str = r#"//div[contains(@class, "F7nice")]"#;
    pub const REVIEW_COUNT_LABEL: &str = r#"//div[contains(@class, "F7nice")]//span[@aria-label]"#;

    /// Every match of both alternatives is scanned for service keywords.
    pub const SERVICE_INFO: Locator = Locator::with_fallback(
        r#"//div[contains(@class, "LTs0Rc")]"#,
        r#"//div[contains(@class, "iP2t7d")]"#,
    );
}

/// Bounded waits and pauses for one extraction run.
#[derive(Debug, Clone)]
pub struct Pacing {
    pub listings_timeout: Duration,
    pub detail_timeout: Duration,
    pub max_scroll_attempts: u32,
    pub settle: Duration,
    pub scroll_pause: Duration,
    pub detail_settle: Duration,
    pub listing_gap: Duration,
    pub listing_jitter: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Pacing {
            listings_timeout: Duration::from_secs(30),
            detail_timeout: Duration::from_secs(15),
            max_scroll_attempts: 15,
            settle: Duration::from_secs(2),
            scroll_pause: Duration::from_secs(2),
            detail_settle: Duration::from_millis(1500),
            listing_gap: Duration::from_millis(500),
            listing_jitter: Duration::from_millis(250),
        }
    }
}

impl Pacing {
    pub fn between_listings(&self) -> Duration {
        let jitter_ms = self.listing_jitter.as_millis() as u64;
        match jitter_ms {
            0 => self.listing_gap,
            _ => {
                let jitter = rand::thread_rng().gen_range(0..=jitter_ms);
                self.listing_gap + Duration::from_millis(jitter)
            }
        }
    }
}

pub async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

/// The rendered search page: a scrollable result list plus the detail pane of
/// whichever listing was opened last.
#[allow(async_fn_in_trait)]
pub trait MapsSurface {
    type Listing;

    /// `Ok(false)` when nothing rendered within `timeout`.
    async fn wait_for_listings(&self, timeout: Duration) -> Result<bool, ScrapeError>;
    async fn scroll_listings(&self) -> Result<(), ScrapeError>;
    async fn listing_count(&self) -> Result<usize, ScrapeError>;
    /// Rendered listings in render order.
    async fn listings(&self) -> Result<Vec<Self::Listing>, ScrapeError>;
    async fn open(&self, listing: &Self::Listing) -> Result<(), ScrapeError>;
    /// `Ok(false)` when `locator` did not materialize within `timeout`.
    async fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<bool, ScrapeError>;
    async fn first_text(&self, xpath: &str) -> Result<Option<String>, ScrapeError>;
    async fn all_texts(&self, xpath: &str) -> Result<Vec<String>, ScrapeError>;
    async fn first_attribute(&self, xpath: &str, name: &str)
        -> Result<Option<String>, ScrapeError>;
}
