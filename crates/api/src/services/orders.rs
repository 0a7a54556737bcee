//! Order workflow service.
//!
//! The only component that coordinates multiple entities per operation:
//! placing an order validates the submitted cart, then hands the
//! transactional write to the repository; retrieval resolves user names and
//! expands line items through product to category.

use sqlx::PgPool;

use bramble_core::{Money, OrderId, UserId};

use crate::db::{OrderRepository, RepositoryError};
use crate::models::{CreateOrderInput, Order, OrderDetail, OrderSummary};

/// Errors from the order workflow.
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    /// The submitted cart has no entries.
    #[error("cart must contain at least one item")]
    EmptyCart,

    /// A cart entry has a non-positive quantity.
    #[error("line item quantity must be positive (got {0})")]
    InvalidQuantity(i32),

    /// A cart entry references a product that does not exist.
    #[error("{0}")]
    UnknownProduct(String),

    /// Underlying repository failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Order workflow service.
pub struct OrderService<'a> {
    orders: OrderRepository<'a>,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            orders: OrderRepository::new(pool),
        }
    }

    /// Place an order: validate the cart, then persist the order and its
    /// line items atomically. On any failure nothing is persisted.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::EmptyCart` / `OrderError::InvalidQuantity` /
    /// `OrderError::UnknownProduct` for invalid carts, and
    /// `OrderError::Repository` for storage failures.
    pub async fn place(&self, input: &CreateOrderInput) -> Result<Order, OrderError> {
        validate_cart(input)?;

        self.orders.create(input).await.map_err(|e| match e {
            // The repository reports a dangling product reference as a
            // conflict; to the caller it is a bad cart, not a server fault.
            RepositoryError::Conflict(msg) => OrderError::UnknownProduct(msg),
            other => OrderError::Repository(other),
        })
    }

    /// List all orders, most recent first, user names resolved.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if the query fails.
    pub async fn list(&self) -> Result<Vec<OrderSummary>, OrderError> {
        Ok(self.orders.list().await?)
    }

    /// Get one order, fully expanded.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<OrderDetail>, OrderError> {
        Ok(self.orders.get(id).await?)
    }

    /// One user's order history, most recent first, fully expanded.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if the query fails.
    pub async fn by_user(&self, user_id: UserId) -> Result<Vec<OrderDetail>, OrderError> {
        Ok(self.orders.by_user(user_id).await?)
    }

    /// Replace only the status of an order.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository(RepositoryError::NotFound)` if the
    /// order doesn't exist.
    pub async fn update_status(&self, id: OrderId, status: &str) -> Result<Order, OrderError> {
        Ok(self.orders.update_status(id, status).await?)
    }

    /// Delete an order together with every line item it owns.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository(RepositoryError::NotFound)` if the
    /// order doesn't exist.
    pub async fn delete(&self, id: OrderId) -> Result<(), OrderError> {
        Ok(self.orders.delete(id).await?)
    }

    /// Total sales across all orders; 0 when there are none.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if the query fails.
    pub async fn total_sales(&self) -> Result<Money, OrderError> {
        Ok(self.orders.total_sales().await?)
    }

    /// Count of all orders.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if the query fails.
    pub async fn count(&self) -> Result<i64, OrderError> {
        Ok(self.orders.count().await?)
    }
}

/// Reject empty carts and non-positive quantities before touching the
/// database.
fn validate_cart(input: &CreateOrderInput) -> Result<(), OrderError> {
    if input.order_items.is_empty() {
        return Err(OrderError::EmptyCart);
    }
    for entry in &input.order_items {
        if entry.quantity <= 0 {
            return Err(OrderError::InvalidQuantity(entry.quantity));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bramble_core::ProductId;

    use crate::models::CartEntry;

    use super::*;

    fn input(entries: Vec<CartEntry>) -> CreateOrderInput {
        CreateOrderInput {
            order_items: entries,
            shipping_address1: "1 Orchard Lane".to_string(),
            shipping_address2: String::new(),
            city: "Portland".to_string(),
            zip: "97201".to_string(),
            country: "US".to_string(),
            phone: "+1-555-0100".to_string(),
            status: "pending".to_string(),
            user_id: None,
        }
    }

    #[test]
    fn test_validate_cart_rejects_empty() {
        let err = validate_cart(&input(vec![])).unwrap_err();
        assert!(matches!(err, OrderError::EmptyCart));
    }

    #[test]
    fn test_validate_cart_rejects_zero_quantity() {
        let err = validate_cart(&input(vec![CartEntry {
            product_id: ProductId::new(1),
            quantity: 0,
        }]))
        .unwrap_err();
        assert!(matches!(err, OrderError::InvalidQuantity(0)));
    }

    #[test]
    fn test_validate_cart_rejects_negative_quantity() {
        let err = validate_cart(&input(vec![CartEntry {
            product_id: ProductId::new(1),
            quantity: -2,
        }]))
        .unwrap_err();
        assert!(matches!(err, OrderError::InvalidQuantity(-2)));
    }

    #[test]
    fn test_validate_cart_accepts_positive_quantities() {
        let ok = validate_cart(&input(vec![
            CartEntry {
                product_id: ProductId::new(1),
                quantity: 2,
            },
            CartEntry {
                product_id: ProductId::new(2),
                quantity: 1,
            },
        ]));
        assert!(ok.is_ok());
    }
}
