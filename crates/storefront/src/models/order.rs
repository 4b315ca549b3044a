//! Orders placed through checkout.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;

use elegance_core::checkout::Address;
use elegance_core::{
    Money, OrderId, OrderItemId, OrderStatus, PaymentMethod, PaymentStatus, ProductId,
    ShippingMethod, UserId,
};

/// A full order record.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub user_id: Option<UserId>,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub shipping_address: Json<Address>,
    pub billing_address: Option<Json<Address>>,
    pub subtotal: Money,
    pub shipping_cost: Money,
    pub discount_amount: Money,
    pub tax_amount: Money,
    pub total: Money,
    pub shipping_method: ShippingMethod,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub promo_code: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Human-facing order number, e.g. `ORD-000042`.
    #[must_use]
    pub fn number(&self) -> String {
        self.id.number()
    }
}

/// A line in an order, with the product snapshot taken at purchase time.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub product_image: Option<String>,
    pub unit_price: Money,
    pub quantity: i32,
    pub size: Option<String>,
    pub color: Option<String>,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price.times(u32::try_from(self.quantity).unwrap_or(0))
    }
}

/// Order history row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderSummary {
    pub id: OrderId,
    pub status: OrderStatus,
    pub total: Money,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
}

impl OrderSummary {
    #[must_use]
    pub fn number(&self) -> String {
        self.id.number()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total() {
        let item = OrderItem {
            id: OrderItemId::new(1),
            product_id: Some(ProductId::new(3)),
            product_name: "Classic Black Abaya".to_owned(),
            product_image: None,
            unit_price: Money::from_cents(8999),
            quantity: 2,
            size: Some("M".to_owned()),
            color: None,
        };
        assert_eq!(item.line_total(), Money::from_cents(17998));
    }
}
