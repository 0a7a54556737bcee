//! Order repository: the multi-entity write path of the API.
//!
//! Placing an order persists the order row and one line-item row per cart
//! entry inside a single transaction. The total is computed from the
//! referenced products' prices as read within that same transaction, so a
//! concurrent price change cannot split an order between old and new
//! prices, and a failure at any step leaves nothing behind.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bramble_core::{Money, MoneyError, OrderId, OrderItemId, ProductId, UserId};

use super::RepositoryError;
use super::products::ProductWithCategoryRow;
use crate::models::{
    CartEntry, CreateOrderInput, Order, OrderDetail, OrderItemDetail, OrderSummary, OrderUser,
};

/// Internal row type for order queries, line-item ids aggregated in
/// submission order.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    line_item_ids: Vec<i32>,
    shipping_address1: String,
    shipping_address2: String,
    city: String,
    zip: String,
    country: String,
    phone: String,
    status: String,
    total_price: Money,
    user_id: Option<UserId>,
    ordered_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            line_item_ids: row.line_item_ids.into_iter().map(OrderItemId::new).collect(),
            shipping_address1: row.shipping_address1,
            shipping_address2: row.shipping_address2,
            city: row.city,
            zip: row.zip,
            country: row.country,
            phone: row.phone,
            status: row.status,
            total_price: row.total_price,
            user_id: row.user_id,
            ordered_at: row.ordered_at,
        }
    }
}

/// Order row joined with the ordering user's display name.
#[derive(Debug, sqlx::FromRow)]
struct OrderSummaryRow {
    #[sqlx(flatten)]
    order: OrderRow,
    user_name: Option<String>,
}

/// Line item joined with its product and the product's category.
#[derive(Debug, sqlx::FromRow)]
struct OrderItemDetailRow {
    item_id: OrderItemId,
    order_id: OrderId,
    quantity: i32,
    #[sqlx(flatten)]
    product: ProductWithCategoryRow,
}

const ORDER_COLUMNS: &str = r"
    o.id,
    COALESCE(i.item_ids, '{}') AS line_item_ids,
    o.shipping_address1, o.shipping_address2, o.city, o.zip, o.country,
    o.phone, o.status, o.total_price, o.user_id, o.ordered_at
";

const ORDER_ITEM_IDS_JOIN: &str = r"
    LEFT JOIN LATERAL (
        SELECT array_agg(oi.id ORDER BY oi.position) AS item_ids
        FROM order_items oi
        WHERE oi.order_id = o.id
    ) i ON TRUE
";

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Persist an order and its line items in one transaction.
    ///
    /// Prices are resolved inside the transaction and the computed total is
    /// a snapshot: later product price changes never touch it. Stock counts
    /// are not decremented here; inventory is tracked elsewhere.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a cart entry references a
    /// product that does not exist (the caller reports this as a validation
    /// failure). Returns `RepositoryError::Database` for other failures; in
    /// every error case the transaction is rolled back and nothing is
    /// persisted.
    pub async fn create(&self, input: &CreateOrderInput) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Resolve unit prices within the transaction.
        let product_ids: Vec<i32> = input
            .order_items
            .iter()
            .map(|entry| entry.product_id.as_i32())
            .collect();

        let price_rows: Vec<(ProductId, Money)> = sqlx::query_as(
            r"
            SELECT id, price FROM products WHERE id = ANY($1)
            ",
        )
        .bind(&product_ids)
        .fetch_all(&mut *tx)
        .await?;

        let prices: HashMap<ProductId, Money> = price_rows.into_iter().collect();

        let total = order_total(&input.order_items, &prices).map_err(|e| match e {
            PricingError::UnknownProduct(id) => {
                RepositoryError::Conflict(format!("cart references unknown product {id}"))
            }
            PricingError::Money(err) => RepositoryError::DataCorruption(err.to_string()),
        })?;

        let (order_id, ordered_at): (OrderId, DateTime<Utc>) = sqlx::query_as(
            r"
            INSERT INTO orders
                (shipping_address1, shipping_address2, city, zip, country, phone,
                 status, total_price, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, ordered_at
            ",
        )
        .bind(&input.shipping_address1)
        .bind(&input.shipping_address2)
        .bind(&input.city)
        .bind(&input.zip)
        .bind(&input.country)
        .bind(&input.phone)
        .bind(&input.status)
        .bind(total)
        .bind(input.user_id)
        .fetch_one(&mut *tx)
        .await?;

        // One line-item row per cart entry, position = submission index.
        let mut line_item_ids = Vec::with_capacity(input.order_items.len());
        for (position, entry) in input.order_items.iter().enumerate() {
            let (item_id,): (OrderItemId,) = sqlx::query_as(
                r"
                INSERT INTO order_items (order_id, product_id, quantity, position)
                VALUES ($1, $2, $3, $4)
                RETURNING id
                ",
            )
            .bind(order_id)
            .bind(entry.product_id)
            .bind(entry.quantity)
            .bind(i32::try_from(position).map_err(|_| {
                RepositoryError::Conflict("cart has too many entries".to_owned())
            })?)
            .fetch_one(&mut *tx)
            .await?;

            line_item_ids.push(item_id);
        }

        tx.commit().await?;

        Ok(Order {
            id: order_id,
            line_item_ids,
            shipping_address1: input.shipping_address1.clone(),
            shipping_address2: input.shipping_address2.clone(),
            city: input.city.clone(),
            zip: input.zip.clone(),
            country: input.country.clone(),
            phone: input.phone.clone(),
            status: input.status.clone(),
            total_price: total,
            user_id: input.user_id,
            ordered_at,
        })
    }

    /// List all orders, most recent first, with the ordering user's display
    /// name resolved. Equal timestamps tie-break on id so the listing is
    /// deterministic.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<OrderSummary>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {ORDER_COLUMNS}, u.name AS user_name
            FROM orders o
            {ORDER_ITEM_IDS_JOIN}
            LEFT JOIN users u ON u.id = o.user_id
            ORDER BY o.ordered_at DESC, o.id DESC
            "
        );

        let rows = sqlx::query_as::<_, OrderSummaryRow>(&sql)
            .fetch_all(self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| OrderSummary {
                order: row.order.into(),
                user_name: row.user_name,
            })
            .collect())
    }

    /// Get one order fully expanded: line items carry their product, each
    /// product carries its category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<OrderDetail>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {ORDER_COLUMNS}, u.name AS user_name
            FROM orders o
            {ORDER_ITEM_IDS_JOIN}
            LEFT JOIN users u ON u.id = o.user_id
            WHERE o.id = $1
            "
        );

        let row = sqlx::query_as::<_, OrderSummaryRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut items = self.fetch_items(&[id]).await?;
        let items = items.remove(&id).unwrap_or_default();

        Ok(Some(into_detail(row, items)))
    }

    /// List one user's orders, most recent first, with the same expansion
    /// as [`OrderRepository::get`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn by_user(&self, user_id: UserId) -> Result<Vec<OrderDetail>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {ORDER_COLUMNS}, u.name AS user_name
            FROM orders o
            {ORDER_ITEM_IDS_JOIN}
            LEFT JOIN users u ON u.id = o.user_id
            WHERE o.user_id = $1
            ORDER BY o.ordered_at DESC, o.id DESC
            "
        );

        let rows = sqlx::query_as::<_, OrderSummaryRow>(&sql)
            .bind(user_id)
            .fetch_all(self.pool)
            .await?;

        let order_ids: Vec<OrderId> = rows.iter().map(|r| r.order.id).collect();
        let mut items = self.fetch_items(&order_ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let order_items = items.remove(&row.order.id).unwrap_or_default();
                into_detail(row, order_items)
            })
            .collect())
    }

    /// Replace only the status of an order; all other fields are untouched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: &str,
    ) -> Result<Order, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE orders SET status = $2 WHERE id = $1
            ",
        )
        .bind(id)
        .bind(status)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        let sql = format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM orders o
            {ORDER_ITEM_IDS_JOIN}
            WHERE o.id = $1
            "
        );

        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete an order and every line item it owns, in one transaction.
    /// Line items never outlive their order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn delete(&self, id: OrderId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            DELETE FROM order_items WHERE order_id = $1
            ",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query(
            r"
            DELETE FROM orders WHERE id = $1
            ",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Nothing to delete; roll the item deletion back too.
            tx.rollback().await?;
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }

    /// Sum of `total_price` across all orders. Zero orders reports 0, not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn total_sales(&self) -> Result<Money, RepositoryError> {
        let (total,): (Money,) = sqlx::query_as(
            r"
            SELECT COALESCE(SUM(total_price), 0) FROM orders
            ",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(total)
    }

    /// Count all orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as(
            r"
            SELECT COUNT(*) FROM orders
            ",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// Fetch expanded line items for a set of orders, grouped by order and
    /// ordered by submission position.
    async fn fetch_items(
        &self,
        order_ids: &[OrderId],
    ) -> Result<HashMap<OrderId, Vec<OrderItemDetail>>, RepositoryError> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let ids: Vec<i32> = order_ids.iter().map(|id| id.as_i32()).collect();

        let rows = sqlx::query_as::<_, OrderItemDetailRow>(
            r"
            SELECT oi.id AS item_id, oi.order_id, oi.quantity,
                   p.id, p.name, p.description, p.rich_description, p.image_url,
                   p.gallery_image_urls, p.brand, p.price, p.category_id,
                   p.count_in_stock, p.rating, p.num_reviews, p.is_featured, p.created_at,
                   c.name AS category_name, c.color AS category_color, c.icon AS category_icon
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            JOIN categories c ON c.id = p.category_id
            WHERE oi.order_id = ANY($1)
            ORDER BY oi.order_id, oi.position
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<OrderId, Vec<OrderItemDetail>> = HashMap::new();
        for row in rows {
            grouped
                .entry(row.order_id)
                .or_default()
                .push(OrderItemDetail {
                    id: row.item_id,
                    quantity: row.quantity,
                    product: row.product.into(),
                });
        }

        Ok(grouped)
    }
}

fn into_detail(row: OrderSummaryRow, line_items: Vec<OrderItemDetail>) -> OrderDetail {
    let user = match (row.order.user_id, row.user_name) {
        (Some(id), Some(name)) => Some(OrderUser { id, name }),
        _ => None,
    };

    OrderDetail {
        id: row.order.id,
        line_items,
        shipping_address1: row.order.shipping_address1,
        shipping_address2: row.order.shipping_address2,
        city: row.order.city,
        zip: row.order.zip,
        country: row.order.country,
        phone: row.order.phone,
        status: row.order.status,
        total_price: row.order.total_price,
        user,
        ordered_at: row.order.ordered_at,
    }
}

// =============================================================================
// Pricing
// =============================================================================

/// Errors from aggregating a cart into a total.
#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    /// A cart entry references a product with no known price.
    #[error("unknown product {0}")]
    UnknownProduct(ProductId),
    /// Decimal arithmetic failed.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Compute an order total: Σ quantity × unit price, exact decimal
/// arithmetic, empty accumulator 0. Summation order is irrelevant but the
/// cart order is preserved for the caller's line items.
pub fn order_total(
    entries: &[CartEntry],
    prices: &HashMap<ProductId, Money>,
) -> Result<Money, PricingError> {
    let mut total = Money::ZERO;
    for entry in entries {
        let unit = prices
            .get(&entry.product_id)
            .ok_or(PricingError::UnknownProduct(entry.product_id))?;
        let quantity = u32::try_from(entry.quantity)
            .map_err(|_| PricingError::Money(MoneyError::Overflow))?;
        total += unit.times(quantity)?;
    }
    Ok(total)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn entry(product: i32, quantity: i32) -> CartEntry {
        CartEntry {
            product_id: ProductId::new(product),
            quantity,
        }
    }

    fn cents(c: i64) -> Money {
        Money::from_cents(c).unwrap()
    }

    #[test]
    fn test_order_total_exact() {
        // 2 x 10.00 + 1 x 5.00 = 25.00
        let prices = HashMap::from([
            (ProductId::new(1), cents(1000)),
            (ProductId::new(2), cents(500)),
        ]);
        let total = order_total(&[entry(1, 2), entry(2, 1)], &prices).unwrap();
        assert_eq!(total.amount(), Decimal::new(2500, 2));
    }

    #[test]
    fn test_order_total_no_drift_for_cent_inputs() {
        // Many odd-cent line items still sum exactly.
        let prices = HashMap::from([(ProductId::new(1), cents(33))]);
        let entries: Vec<CartEntry> = (0..100).map(|_| entry(1, 3)).collect();
        let total = order_total(&entries, &prices).unwrap();
        assert_eq!(total.amount(), Decimal::new(9900, 2));
    }

    #[test]
    fn test_order_total_empty_cart_is_zero() {
        let total = order_total(&[], &HashMap::new()).unwrap();
        assert_eq!(total, Money::ZERO);
    }

    #[test]
    fn test_order_total_unknown_product() {
        let prices = HashMap::from([(ProductId::new(1), cents(100))]);
        let err = order_total(&[entry(2, 1)], &prices).unwrap_err();
        assert!(matches!(err, PricingError::UnknownProduct(id) if id == ProductId::new(2)));
    }

    #[test]
    fn test_order_total_order_independent() {
        let prices = HashMap::from([
            (ProductId::new(1), cents(199)),
            (ProductId::new(2), cents(250)),
            (ProductId::new(3), cents(1)),
        ]);
        let forward = order_total(&[entry(1, 1), entry(2, 2), entry(3, 3)], &prices).unwrap();
        let reverse = order_total(&[entry(3, 3), entry(2, 2), entry(1, 1)], &prices).unwrap();
        assert_eq!(forward, reverse);
    }
}
