use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::database::map_sqlx;
use wayfare_booking::{
    Booking, BookingDetail, BookingFilter, BookingRepository, BookingStats, BookingStatus,
    BookingUpdate, CustomerSummary,
};
use wayfare_catalog::{PackageSummary, TourSummary};
use wayfare_core::StoreError;

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    reference: String,
    customer_id: Uuid,
    tour_id: Uuid,
    package_id: Uuid,
    adults: i32,
    children: i32,
    infants: i32,
    tour_date: NaiveDate,
    total_amount: Decimal,
    currency: String,
    contact_email: String,
    contact_phone: Option<String>,
    status: String,
    voucher_path: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BookingRow {
    fn into_booking(self) -> Result<Booking, StoreError> {
        let status = BookingStatus::parse(&self.status)
            .ok_or_else(|| StoreError::Storage(format!("unknown booking status {}", self.status)))?;
        Ok(Booking {
            id: self.id,
            reference: self.reference,
            customer_id: self.customer_id,
            tour_id: self.tour_id,
            package_id: self.package_id,
            adults: self.adults,
            children: self.children,
            infants: self.infants,
            tour_date: self.tour_date,
            total: self.total_amount,
            currency: self.currency,
            contact_email: self.contact_email,
            contact_phone: self.contact_phone,
            status,
            voucher_path: self.voucher_path,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct BookingDetailRow {
    #[sqlx(flatten)]
    booking: BookingRow,
    tour_title: String,
    package_name: String,
    package_language: String,
    customer_name: String,
    customer_email: String,
}

impl BookingDetailRow {
    fn into_detail(self) -> Result<BookingDetail, StoreError> {
        let booking = self.booking.into_booking()?;
        let tour = TourSummary {
            id: booking.tour_id,
            title: self.tour_title,
        };
        let package = PackageSummary {
            id: booking.package_id,
            name: self.package_name,
            language: self.package_language,
        };
        let customer = CustomerSummary {
            id: booking.customer_id,
            name: self.customer_name,
            email: self.customer_email,
        };
        Ok(BookingDetail {
            booking,
            tour,
            package,
            customer,
        })
    }
}

const DETAIL_COLUMNS: &str = r#"
    b.id, b.reference, b.customer_id, b.tour_id, b.package_id,
    b.adults, b.children, b.infants, b.tour_date, b.total_amount, b.currency,
    b.contact_email, b.contact_phone, b.status, b.voucher_path,
    b.created_at, b.updated_at,
    t.title AS tour_title,
    p.name AS package_name, p.language AS package_language,
    u.name AS customer_name, u.email AS customer_email
"#;

const DETAIL_JOINS: &str = r#"
    FROM bookings b
    JOIN tours t ON t.id = b.tour_id
    JOIN tour_packages p ON p.id = b.package_id
    JOIN users u ON u.id = b.customer_id
"#;

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn insert(&self, booking: &Booking) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, reference, customer_id, tour_id, package_id,
                adults, children, infants, tour_date, total_amount, currency,
                contact_email, contact_phone, status, voucher_path, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(booking.id)
        .bind(&booking.reference)
        .bind(booking.customer_id)
        .bind(booking.tour_id)
        .bind(booking.package_id)
        .bind(booking.adults)
        .bind(booking.children)
        .bind(booking.infants)
        .bind(booking.tour_date)
        .bind(booking.total)
        .bind(&booking.currency)
        .bind(&booking.contact_email)
        .bind(&booking.contact_phone)
        .bind(booking.status.as_str())
        .bind(&booking.voucher_path)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        let row = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT id, reference, customer_id, tour_id, package_id,
                   adults, children, infants, tour_date, total_amount, currency,
                   contact_email, contact_phone, status, voucher_path, created_at, updated_at
            FROM bookings
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        row.map(BookingRow::into_booking).transpose()
    }

    async fn find_detail(&self, id: Uuid) -> Result<Option<BookingDetail>, StoreError> {
        let sql = format!("SELECT {DETAIL_COLUMNS} {DETAIL_JOINS} WHERE b.id = $1");
        let row = sqlx::query_as::<_, BookingDetailRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;

        row.map(BookingDetailRow::into_detail).transpose()
    }

    async fn list(&self, filter: &BookingFilter) -> Result<Vec<BookingDetail>, StoreError> {
        let sql = format!(
            r#"
            SELECT {DETAIL_COLUMNS} {DETAIL_JOINS}
            WHERE ($1::uuid IS NULL OR b.customer_id = $1)
              AND ($2::uuid IS NULL OR b.tour_id = $2)
              AND ($3::text IS NULL OR b.status = $3)
            ORDER BY b.created_at DESC
            "#
        );
        let rows = sqlx::query_as::<_, BookingDetailRow>(&sql)
            .bind(filter.customer_id)
            .bind(filter.tour_id)
            .bind(filter.status.map(|s| s.as_str().to_string()))
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;

        rows.into_iter().map(BookingDetailRow::into_detail).collect()
    }

    async fn update_status(&self, id: Uuid, status: BookingStatus) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE bookings SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn update_fields(&self, id: Uuid, update: &BookingUpdate) -> Result<Booking, StoreError> {
        let row = sqlx::query_as::<_, BookingRow>(
            r#"
            UPDATE bookings SET
                adults = COALESCE($2, adults),
                children = COALESCE($3, children),
                infants = COALESCE($4, infants),
                tour_date = COALESCE($5, tour_date),
                contact_email = COALESCE($6, contact_email),
                contact_phone = COALESCE($7, contact_phone),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, reference, customer_id, tour_id, package_id,
                      adults, children, infants, tour_date, total_amount, currency,
                      contact_email, contact_phone, status, voucher_path, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(update.adults)
        .bind(update.children)
        .bind(update.infants)
        .bind(update.tour_date)
        .bind(&update.contact_email)
        .bind(&update.contact_phone)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        row.ok_or(StoreError::NotFound)?.into_booking()
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn stats(&self) -> Result<BookingStats, StoreError> {
        let rows = sqlx::query("SELECT status, COUNT(*) AS count FROM bookings GROUP BY status")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;

        let mut stats = BookingStats {
            total: 0,
            pending: 0,
            confirmed: 0,
            cancelled: 0,
        };
        for row in rows {
            let status: String = row.get("status");
            let count: i64 = row.get("count");
            stats.total += count;
            match BookingStatus::parse(&status) {
                Some(BookingStatus::Pending) => stats.pending = count,
                Some(BookingStatus::Confirmed) => stats.confirmed = count,
                Some(BookingStatus::Cancelled) => stats.cancelled = count,
                None => {}
            }
        }
        Ok(stats)
    }

    async fn set_voucher_path(&self, id: Uuid, path: &str) -> Result<Option<String>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        let previous: Option<Option<String>> =
            sqlx::query_scalar("SELECT voucher_path FROM bookings WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(map_sqlx)?;
        let previous = previous.ok_or(StoreError::NotFound)?;

        sqlx::query("UPDATE bookings SET voucher_path = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(path)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;

        tx.commit().await.map_err(map_sqlx)?;
        Ok(previous)
    }
}
