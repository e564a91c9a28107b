use crate::{
    domain::record::{Flag, Record, NAME_NOT_FOUND, NOT_AVAILABLE},
    error::ScrapeError,
};

use super::surface::{maps, Locator, MapsSurface};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Portuguese,
    English,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    StoreShopping,
    InStorePickup,
    Delivery,
}

/// Lowercase keywords that switch a service flag on when found in an info block.
pub const SERVICE_KEYWORDS: &[(&str, Language, Service)] = &[
    ("compra", Language::Portuguese, Service::StoreShopping),
    ("shop", Language::English, Service::StoreShopping),
    ("retira", Language::Portuguese, Service::InStorePickup),
    ("pickup", Language::English, Service::InStorePickup),
    ("entrega", Language::Portuguese, Service::Delivery),
    ("delivery", Language::English, Service::Delivery),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceFlags {
    pub store_shopping: Flag,
    pub in_store_pickup: Flag,
    pub delivery: Flag,
}

/// Flags start at `No` and flip to `Yes` independently of each other.
pub fn scan_service_flags<S: AsRef<str>>(blocks: &[S]) -> ServiceFlags {
    let mut flags = ServiceFlags {
        store_shopping: Flag::No,
        in_store_pickup: Flag::No,
        delivery: Flag::No,
    };

    for block in blocks {
        let text = block.as_ref().to_lowercase();
        for (keyword, language, service) in SERVICE_KEYWORDS {
            if !text.contains(keyword) {
                continue;
            }
            log::debug!("{:?} keyword '{}' matched {:?}", language, keyword, service);
            match service {
                Service::StoreShopping => flags.store_shopping = Flag::Yes,
                Service::InStorePickup => flags.in_store_pickup = Flag::Yes,
                Service::Delivery => flags.delivery = Flag::Yes,
            }
        }
    }

    flags
}

/// Parses a decimal that may use a comma as separator ("4,5").
pub fn parse_rating(token: &str) -> Option<f64> {
    token
        .trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
}

/// Parses a review count such as "(1.234)", "1,234" or "87".
pub fn parse_count(token: &str) -> Option<u32> {
    let digits: String = token
        .trim()
        .trim_matches(|c| c == '(' || c == ')')
        .chars()
        .filter(|c| *c != ',' && *c != '.')
        .collect();
    digits.parse().ok()
}

/// Splits the combined rating block ("4,5 (1.234)") into its two halves.
pub fn parse_review_summary(text: &str) -> (Option<f64>, Option<u32>) {
    let mut parts = text.split_whitespace();
    let average = parts.next().and_then(parse_rating);
    let count = parts.next().and_then(parse_count);
    (average, count)
}

/// First non-blank text found through the locator's primary then fallback XPath.
/// Never fails: lookup errors are logged and treated as absent.
pub async fn extract<S: MapsSurface>(surface: &S, locator: &Locator) -> Option<String> {
    for xpath in locator.xpaths() {
        match surface.first_text(xpath).await {
            Ok(Some(text)) if !text.trim().is_empty() && text.trim() != NOT_AVAILABLE => {
                return Some(text.trim().to_string());
            }
            Ok(_) => {}
            Err(e) => log::error!("Error extracting data for xpath {}: {:?}", xpath, e),
        }
    }
    None
}

pub async fn extract_reviews<S: MapsSurface>(surface: &S) -> (Option<f64>, Option<u32>) {
    let summary = match surface.first_text(maps::REVIEWS).await {
        Ok(Some(text)) => text,
        Ok(None) => return (None, None),
        Err(e) => {
            log::error!("Error extracting review summary: {:?}", e);
            return (None, None);
        }
    };

    let (average, count) = parse_review_summary(&summary);
    if count.is_some() {
        return (average, count);
    }

    let count = match surface
        .first_attribute(maps::REVIEW_COUNT_LABEL, "aria-label")
        .await
    {
        Ok(Some(label)) => label.split_whitespace().next().and_then(parse_count),
        Ok(None) => None,
        Err(e) => {
            log::error!("Error extracting review count label: {:?}", e);
            None
        }
    };
    (average, count)
}

/// Reads the service info blocks. Unlike single fields, a failure here aborts
/// the whole listing.
pub async fn extract_service_flags<S: MapsSurface>(
    surface: &S,
) -> Result<ServiceFlags, ScrapeError> {
    let mut blocks = vec![];
    for xpath in maps::SERVICE_INFO.xpaths() {
        blocks.extend(surface.all_texts(xpath).await?);
    }
    Ok(scan_service_flags(&blocks))
}

/// Extracts every field of the listing whose detail pane is currently open.
pub async fn extract_record<S: MapsSurface>(surface: &S) -> Result<Record, ScrapeError> {
    let name = extract(surface, &maps::NAME)
        .await
        .unwrap_or_else(|| NAME_NOT_FOUND.to_string());
    let category = extract(surface, &maps::CATEGORY).await;
    let address = extract(surface, &maps::ADDRESS).await;
    let phone = extract(surface, &maps::PHONE).await;
    let website = extract(surface, &maps::WEBSITE).await;
    let (average_rating, review_count) = extract_reviews(surface).await;
    let flags = extract_service_flags(surface).await?;
    let opening_hours = extract(surface, &maps::OPENING_HOURS).await;
    let introduction = extract(surface, &maps::INTRODUCTION).await;

    Ok(Record {
        name,
        category,
        address,
        phone,
        website,
        opening_hours,
        average_rating,
        review_count,
        introduction,
        store_shopping: flags.store_shopping,
        in_store_pickup: flags.in_store_pickup,
        delivery: flags.delivery,
    })
}
