use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{
    record::{Flag, Record, StoredRecord},
    search::{QueryKey, Source},
};

/// Persisted batches, one per (type, region) query.
#[allow(async_fn_in_trait)]
pub trait RecordStore {
    /// Stored records for `key`, in insertion order.
    async fn find(&self, key: &QueryKey) -> Result<Vec<StoredRecord>, sqlx::Error>;

    /// Adds `records` under `key`, first dropping whatever was stored when
    /// `replace_existing` is set. Either all of it happens or none of it.
    async fn save(
        &self,
        key: &QueryKey,
        source: Source,
        records: &[StoredRecord],
        replace_existing: bool,
    ) -> Result<(), sqlx::Error>;
}

#[derive(sqlx::FromRow)]
struct EstablishmentRow {
    id: Uuid,
    name: String,
    category: Option<String>,
    address: Option<String>,
    phone: Option<String>,
    website: Option<String>,
    opening_hours: Option<String>,
    average_rating: Option<f64>,
    review_count: Option<i64>,
    introduction: Option<String>,
    store_shopping: Option<bool>,
    in_store_pickup: Option<bool>,
    delivery: Option<bool>,
}

impl From<EstablishmentRow> for StoredRecord {
    fn from(row: EstablishmentRow) -> Self {
        StoredRecord {
            id: row.id,
            record: Record {
                name: row.name,
                category: row.category,
                address: row.address,
                phone: row.phone,
                website: row.website,
                opening_hours: row.opening_hours,
                average_rating: row.average_rating,
                review_count: row.review_count.and_then(|c| u32::try_from(c).ok()),
                introduction: row.introduction,
                store_shopping: Flag::from(row.store_shopping),
                in_store_pickup: Flag::from(row.in_store_pickup),
                delivery: Flag::from(row.delivery),
            },
        }
    }
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }
}

impl RecordStore for PgStore {
    async fn find(&self, key: &QueryKey) -> Result<Vec<StoredRecord>, sqlx::Error> {
        let rows = sqlx::query_as::<_, EstablishmentRow>(
            r"
            select
                id, name, category, address, phone, website, opening_hours,
                average_rating, review_count, introduction,
                store_shopping, in_store_pickup, delivery
            from
                establishment
            where
                kind = $1 and region = $2
            order by seq
            ",
        )
        .bind(&key.kind)
        .bind(&key.region)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(StoredRecord::from).collect())
    }

    async fn save(
        &self,
        key: &QueryKey,
        source: Source,
        records: &[StoredRecord],
        replace_existing: bool,
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        if replace_existing {
            let deleted = sqlx::query(r"delete from establishment where kind = $1 and region = $2")
                .bind(&key.kind)
                .bind(&key.region)
                .execute(&mut *tx)
                .await?;
            log::info!(
                "Removed {} stored establishments for {} / {}",
                deleted.rows_affected(),
                key.kind,
                key.region
            );
        }

        for stored in records {
            let r = &stored.record;
            sqlx::query(
                r"
                insert into establishment
                    (id, kind, region, source, name, category, address, phone, website,
                    opening_hours, average_rating, review_count, introduction,
                    store_shopping, in_store_pickup, delivery)
                values
                    ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
                ",
            )
            .bind(stored.id)
            .bind(&key.kind)
            .bind(&key.region)
            .bind(source.id())
            .bind(&r.name)
            .bind(&r.category)
            .bind(&r.address)
            .bind(&r.phone)
            .bind(&r.website)
            .bind(&r.opening_hours)
            .bind(r.average_rating)
            .bind(r.review_count.map(i64::from))
            .bind(&r.introduction)
            .bind(Option::<bool>::from(r.store_shopping))
            .bind(Option::<bool>::from(r.in_store_pickup))
            .bind(Option::<bool>::from(r.delivery))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await
    }
}


#[cfg(test)]
mod tests {
    use super::EstablishmentRow;
    use crate::domain::record::{Flag, StoredRecord};

    #[test]
    fn row_maps_nullable_columns() {
        let row = EstablishmentRow {
            id: uuid::Uuid::new_v4(),
            name: "Empório Sabor".to_string(),
            category: None,
            address: Some("Rua Bahia, 80".to_string()),
            phone: None,
            website: None,
            opening_hours: None,
            average_rating: Some(4.4),
            review_count: Some(-1),
            introduction: None,
            store_shopping: Some(true),
            in_store_pickup: Some(false),
            delivery: None,
        };

        let stored = StoredRecord::from(row);

        assert_eq!(stored.record.review_count, None);
        assert_eq!(stored.record.store_shopping, Flag::Yes);
        assert_eq!(stored.record.in_store_pickup, Flag::No);
        assert_eq!(stored.record.delivery, Flag::Unknown);
    }

    #[test]
    fn row_keeps_large_review_counts() {
        let row = EstablishmentRow {
            id: uuid::Uuid::new_v4(),
            name: "Shopping Campo Grande".to_string(),
            category: None,
            address: None,
            phone: None,
            website: None,
            opening_hours: None,
            average_rating: None,
            review_count: Some(i64::from(u32::MAX)),
            introduction: None,
            store_shopping: None,
            in_store_pickup: None,
            delivery: None,
        };

        assert_eq!(StoredRecord::from(row).record.review_count, Some(u32::MAX));
    }
}
