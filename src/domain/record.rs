use itertools::izip;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const NOT_AVAILABLE: &str = "N/A";
pub const COLLECTION_ERROR: &str = "Erro na Coleta";
pub const NAME_NOT_FOUND: &str = "Nome não encontrado";

/// Yes/no/unknown answer for a service attribute. Serialized as a nullable bool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum Flag {
    Yes,
    No,
    #[default]
    Unknown,
}

impl From<bool> for Flag {
    fn from(value: bool) -> Self {
        match value {
            true => Flag::Yes,
            false => Flag::No,
        }
    }
}

impl From<Option<bool>> for Flag {
    fn from(value: Option<bool>) -> Self {
        value.map(Flag::from).unwrap_or(Flag::Unknown)
    }
}

impl From<Flag> for Option<bool> {
    fn from(value: Flag) -> Self {
        match value {
            Flag::Yes => Some(true),
            Flag::No => Some(false),
            Flag::Unknown => None,
        }
    }
}

/// One establishment as extracted from a listing's detail pane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    #[serde(rename = "type")]
    pub category: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub opening_hours: Option<String>,
    pub average_rating: Option<f64>,
    pub review_count: Option<u32>,
    pub introduction: Option<String>,
    pub store_shopping: Flag,
    pub in_store_pickup: Flag,
    pub delivery: Flag,
}

impl Record {
    pub fn named(name: impl Into<String>) -> Self {
        Record {
            name: name.into(),
            category: None,
            address: None,
            phone: None,
            website: None,
            opening_hours: None,
            average_rating: None,
            review_count: None,
            introduction: None,
            store_shopping: Flag::Unknown,
            in_store_pickup: Flag::Unknown,
            delivery: Flag::Unknown,
        }
    }

    /// Row standing in for a listing whose extraction blew up.
    pub fn failed() -> Self {
        Record::named(COLLECTION_ERROR)
    }

    pub fn dedup_key(&self) -> DedupKey {
        DedupKey {
            name: self.name.clone(),
            address: self.address.clone(),
        }
    }
}

/// Two records with the same key are the same establishment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub name: String,
    pub address: Option<String>,
}

/// A record that lives in the store under a persisted identity.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: Uuid,
    pub record: Record,
}

impl StoredRecord {
    pub fn fresh(record: Record) -> Self {
        StoredRecord {
            id: Uuid::new_v4(),
            record,
        }
    }
}

/// Parallel per-field lists for one batch, index-aligned to listing order.
/// Rows only go in whole, so every list always has the same length.
#[derive(Debug, Default)]
pub struct Columns {
    names: Vec<String>,
    categories: Vec<Option<String>>,
    addresses: Vec<Option<String>>,
    phones: Vec<Option<String>>,
    websites: Vec<Option<String>>,
    opening_hours: Vec<Option<String>>,
    average_ratings: Vec<Option<f64>>,
    review_counts: Vec<Option<u32>>,
    introductions: Vec<Option<String>>,
    store_shopping: Vec<Flag>,
    in_store_pickup: Vec<Flag>,
    delivery: Vec<Flag>,
}

impl Columns {
    pub fn push(&mut self, record: Record) {
        self.names.push(record.name);
        self.categories.push(record.category);
        self.addresses.push(record.address);
        self.phones.push(record.phone);
        self.websites.push(record.website);
        self.opening_hours.push(record.opening_hours);
        self.average_ratings.push(record.average_rating);
        self.review_counts.push(record.review_count);
        self.introductions.push(record.introduction);
        self.store_shopping.push(record.store_shopping);
        self.in_store_pickup.push(record.in_store_pickup);
        self.delivery.push(record.delivery);
    }

    pub fn push_failed(&mut self) {
        self.push(Record::failed());
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn is_aligned(&self) -> bool {
        let n = self.names.len();
        [
            self.categories.len(),
            self.addresses.len(),
            self.phones.len(),
            self.websites.len(),
            self.opening_hours.len(),
            self.average_ratings.len(),
            self.review_counts.len(),
            self.introductions.len(),
            self.store_shopping.len(),
            self.in_store_pickup.len(),
            self.delivery.len(),
        ]
        .iter()
        .all(|len| *len == n)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn into_records(self) -> Vec<Record> {
        izip!(
            self.names,
            self.categories,
            self.addresses,
            self.phones,
            self.websites,
            self.opening_hours,
            self.average_ratings,
            self.review_counts,
            self.introductions,
            self.store_shopping,
            self.in_store_pickup,
            self.delivery
        )
        .map(
            |(
                name,
                category,
                address,
                phone,
                website,
                opening_hours,
                average_rating,
                review_count,
                introduction,
                store_shopping,
                in_store_pickup,
                delivery,
            )| Record {
                name,
                category,
                address,
                phone,
                website,
                opening_hours,
                average_rating,
                review_count,
                introduction,
                store_shopping,
                in_store_pickup,
                delivery,
            },
        )
        .collect()
    }
}
