use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{query, PgPool, Row};
use uuid::Uuid;

use crate::middleware::error_handling::{AppError, Result};
use crate::models::inquiry::{
    CreateInquiryRequest, Inquiry, InquiryAggregate, InquiryItem, InquiryStatus,
};

#[derive(Debug, Clone, Default)]
pub struct InquiryFilter {
    pub user_id: Option<Uuid>,
    pub status: Option<InquiryStatus>,
    pub search: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub limit: i64,
    pub offset: i64,
}

/// Persistence port for the inquiry aggregate. The domain service only talks
/// to this trait, so it can be exercised against an in-memory store in tests.
#[allow(async_fn_in_trait)]
pub trait InquiryStore {
    /// Persists the inquiry and its items atomically; both succeed or neither
    /// is stored.
    async fn insert(
        &self,
        user_id: Uuid,
        request: &CreateInquiryRequest,
        total_estimated_amount: Decimal,
    ) -> Result<InquiryAggregate>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<InquiryAggregate>>;

    /// Returns `None` when the inquiry no longer exists.
    async fn update_status(
        &self,
        id: Uuid,
        status: InquiryStatus,
    ) -> Result<Option<InquiryAggregate>>;

    /// Filtered page ordered by created_at descending.
    async fn list(&self, filter: &InquiryFilter) -> Result<Vec<InquiryAggregate>>;

    async fn count(&self, filter: &InquiryFilter) -> Result<i64>;
}

pub struct PgInquiryRepository {
    pool: PgPool,
}

const INQUIRY_COLUMNS: &str = "id, user_id, customer_name, customer_email, customer_phone, \
     status, notes, delivery_address, preferred_delivery_date, total_estimated_amount, \
     created_at, updated_at";

const ITEM_COLUMNS: &str = "id, inquiry_id, product_id, product_name, product_category, \
     quantity, unit_price, total_price, notes";

impl PgInquiryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn inquiry_from_row(row: &PgRow) -> Result<Inquiry> {
        let status: String = row.try_get("status")?;
        let status = status
            .parse::<InquiryStatus>()
            .map_err(|e| AppError::Internal(anyhow::Error::new(e)))?;

        Ok(Inquiry {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            customer_name: row.try_get("customer_name")?,
            customer_email: row.try_get("customer_email")?,
            customer_phone: row.try_get("customer_phone")?,
            status,
            notes: row.try_get("notes")?,
            delivery_address: row.try_get("delivery_address")?,
            preferred_delivery_date: row.try_get("preferred_delivery_date")?,
            total_estimated_amount: row.try_get("total_estimated_amount")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn item_from_row(row: &PgRow) -> Result<InquiryItem> {
        Ok(InquiryItem {
            id: row.try_get("id")?,
            inquiry_id: row.try_get("inquiry_id")?,
            product_id: row.try_get("product_id")?,
            product_name: row.try_get("product_name")?,
            product_category: row.try_get("product_category")?,
            quantity: row.try_get("quantity")?,
            unit_price: row.try_get("unit_price")?,
            total_price: row.try_get("total_price")?,
            notes: row.try_get("notes")?,
        })
    }

    async fn items_for_inquiry(&self, inquiry_id: Uuid) -> Result<Vec<InquiryItem>> {
        let rows = query(&format!(
            "SELECT {} FROM inquiry_items WHERE inquiry_id = $1 ORDER BY id",
            ITEM_COLUMNS
        ))
        .bind(inquiry_id)
        .fetch_all(&self.pool)
        .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            items.push(Self::item_from_row(row)?);
        }
        Ok(items)
    }

    /// Appends the filter's WHERE clauses and binds in a fixed order.
    fn filter_clauses(filter: &InquiryFilter, sql: &mut String) -> usize {
        let mut n = 0;
        if filter.user_id.is_some() {
            n += 1;
            sql.push_str(&format!(" AND user_id = ${}", n));
        }
        if filter.status.is_some() {
            n += 1;
            sql.push_str(&format!(" AND status = ${}", n));
        }
        if filter.search.is_some() {
            n += 1;
            sql.push_str(&format!(
                " AND (customer_name ILIKE ${0} OR customer_email ILIKE ${0})",
                n
            ));
        }
        if filter.created_from.is_some() {
            n += 1;
            sql.push_str(&format!(" AND created_at >= ${}", n));
        }
        if filter.created_to.is_some() {
            n += 1;
            sql.push_str(&format!(" AND created_at <= ${}", n));
        }
        n
    }

    fn bind_filter<'q>(
        filter: &'q InquiryFilter,
        mut q: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    ) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
        if let Some(user_id) = filter.user_id {
            q = q.bind(user_id);
        }
        if let Some(status) = filter.status {
            q = q.bind(status.as_str());
        }
        if let Some(ref search) = filter.search {
            q = q.bind(format!("%{}%", search));
        }
        if let Some(created_from) = filter.created_from {
            q = q.bind(created_from);
        }
        if let Some(created_to) = filter.created_to {
            q = q.bind(created_to);
        }
        q
    }
}

impl InquiryStore for PgInquiryRepository {
    async fn insert(
        &self,
        user_id: Uuid,
        request: &CreateInquiryRequest,
        total_estimated_amount: Decimal,
    ) -> Result<InquiryAggregate> {
        let mut tx = self.pool.begin().await?;

        let row = query(&format!(
            r#"
            INSERT INTO inquiries (
                user_id, customer_name, customer_email, customer_phone,
                status, notes, delivery_address, preferred_delivery_date,
                total_estimated_amount
            )
            VALUES ($1, $2, $3, $4, 'pending', $5, $6, $7, $8)
            RETURNING {}
            "#,
            INQUIRY_COLUMNS
        ))
        .bind(user_id)
        .bind(request.customer_name.trim())
        .bind(request.customer_email.trim())
        .bind(&request.customer_phone)
        .bind(&request.notes)
        .bind(&request.delivery_address)
        .bind(request.preferred_delivery_date)
        .bind(total_estimated_amount)
        .fetch_one(&mut *tx)
        .await?;

        let inquiry = Self::inquiry_from_row(&row)?;

        let mut items = Vec::with_capacity(request.items.len());
        for item in &request.items {
            // Snapshot the derived line total so the stored row is
            // self-contained even if only unit_price was supplied.
            let total_price = item
                .total_price
                .or_else(|| item.unit_price.map(|p| Decimal::from(item.quantity) * p));

            let row = query(&format!(
                r#"
                INSERT INTO inquiry_items (
                    inquiry_id, product_id, product_name, product_category,
                    quantity, unit_price, total_price, notes
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING {}
                "#,
                ITEM_COLUMNS
            ))
            .bind(inquiry.id)
            .bind(&item.product_id)
            .bind(&item.product_name)
            .bind(&item.product_category)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(total_price)
            .bind(&item.notes)
            .fetch_one(&mut *tx)
            .await?;

            items.push(Self::item_from_row(&row)?);
        }

        tx.commit().await?;

        Ok(InquiryAggregate { inquiry, items })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<InquiryAggregate>> {
        let row = query(&format!(
            "SELECT {} FROM inquiries WHERE id = $1",
            INQUIRY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let inquiry = Self::inquiry_from_row(&row)?;
                let items = self.items_for_inquiry(inquiry.id).await?;
                Ok(Some(InquiryAggregate { inquiry, items }))
            }
            None => Ok(None),
        }
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: InquiryStatus,
    ) -> Result<Option<InquiryAggregate>> {
        let row = query(&format!(
            r#"
            UPDATE inquiries
            SET status = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING {}
            "#,
            INQUIRY_COLUMNS
        ))
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let inquiry = Self::inquiry_from_row(&row)?;
                let items = self.items_for_inquiry(inquiry.id).await?;
                Ok(Some(InquiryAggregate { inquiry, items }))
            }
            None => Ok(None),
        }
    }

    async fn list(&self, filter: &InquiryFilter) -> Result<Vec<InquiryAggregate>> {
        let mut sql = format!("SELECT {} FROM inquiries WHERE TRUE", INQUIRY_COLUMNS);
        let n = Self::filter_clauses(filter, &mut sql);
        sql.push_str(&format!(
            " ORDER BY created_at DESC LIMIT ${} OFFSET ${}",
            n + 1,
            n + 2
        ));

        let q = Self::bind_filter(filter, query(&sql))
            .bind(filter.limit)
            .bind(filter.offset);
        let rows = q.fetch_all(&self.pool).await?;

        let mut aggregates = Vec::with_capacity(rows.len());
        for row in &rows {
            let inquiry = Self::inquiry_from_row(row)?;
            let items = self.items_for_inquiry(inquiry.id).await?;
            aggregates.push(InquiryAggregate { inquiry, items });
        }
        Ok(aggregates)
    }

    async fn count(&self, filter: &InquiryFilter) -> Result<i64> {
        let mut sql = "SELECT COUNT(*) AS total FROM inquiries WHERE TRUE".to_string();
        Self::filter_clauses(filter, &mut sql);

        let row = Self::bind_filter(filter, query(&sql))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("total")?)
    }
}
