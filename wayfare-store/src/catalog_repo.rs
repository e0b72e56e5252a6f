use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::map_sqlx;
use wayfare_catalog::{PackageRepository, TourPackage, TourRepository, TourSummary};
use wayfare_core::StoreError;

pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PackageRow {
    id: Uuid,
    tour_id: Uuid,
    name: String,
    adult_price: Decimal,
    child_price: Decimal,
    infant_price: Decimal,
    currency: String,
    language: String,
    capacity: i32,
}

impl From<PackageRow> for TourPackage {
    fn from(row: PackageRow) -> Self {
        TourPackage {
            id: row.id,
            tour_id: row.tour_id,
            name: row.name,
            adult_price: row.adult_price,
            child_price: row.child_price,
            infant_price: row.infant_price,
            currency: row.currency,
            language: row.language,
            capacity: row.capacity,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TourSummaryRow {
    id: Uuid,
    title: String,
}

#[async_trait]
impl PackageRepository for PgCatalogRepository {
    async fn find(&self, id: Uuid) -> Result<Option<TourPackage>, StoreError> {
        let row = sqlx::query_as::<_, PackageRow>(
            r#"
            SELECT id, tour_id, name, adult_price, child_price, infant_price,
                   currency, language, capacity
            FROM tour_packages
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(row.map(TourPackage::from))
    }
}

#[async_trait]
impl TourRepository for PgCatalogRepository {
    async fn find_summary(&self, id: Uuid) -> Result<Option<TourSummary>, StoreError> {
        let row = sqlx::query_as::<_, TourSummaryRow>("SELECT id, title FROM tours WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;

        Ok(row.map(|r| TourSummary {
            id: r.id,
            title: r.title,
        }))
    }
}
