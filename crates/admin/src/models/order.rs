//! Orders as seen from the back office.

use chrono::{DateTime, Utc};
use sqlx::types::Json;

use elegance_core::checkout::Address;
use elegance_core::{
    Money, OrderId, OrderItemId, OrderStatus, PaymentMethod, PaymentStatus, ProductId,
    ShippingMethod, UserId,
};

/// One row of the orders table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub id: OrderId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub total: Money,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
}

impl OrderRow {
    #[must_use]
    pub fn customer_name(&self) -> String {
        customer_name(&self.first_name, &self.last_name, &self.email)
    }
}

/// A full order record.
#[derive(Debug, Clone, sqlx::FromRow)]
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
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[must_use]
    pub fn customer_name(&self) -> String {
        customer_name(&self.first_name, &self.last_name, &self.email)
    }

    /// Statuses this order may move to next.
    #[must_use]
    pub fn next_statuses(&self) -> Vec<OrderStatus> {
        OrderStatus::ALL
            .iter()
            .copied()
            .filter(|next| self.status.can_transition_to(*next))
            .collect()
    }
}

/// A line in an order, as purchased.
#[derive(Debug, Clone, sqlx::FromRow)]
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

fn customer_name(first: &str, last: &str, email: &str) -> String {
    let name = format!("{} {}", first.trim(), last.trim());
    let name = name.trim();
    if name.is_empty() {
        email.to_owned()
    } else {
        name.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_name_falls_back_to_email() {
        assert_eq!(customer_name("Aisha", "Rahman", "a@x.test"), "Aisha Rahman");
        assert_eq!(customer_name("Aisha", "", "a@x.test"), "Aisha");
        assert_eq!(customer_name(" ", "", "a@x.test"), "a@x.test");
    }

    #[test]
    fn test_line_total() {
        let item = OrderItem {
            id: OrderItemId::new(1),
            product_id: None,
            product_name: "Embroidered Abaya".to_owned(),
            product_image: None,
            unit_price: Money::from_cents(12_950),
            quantity: 3,
            size: None,
            color: Some("Navy Blue".to_owned()),
        };
        assert_eq!(item.line_total(), Money::from_cents(38_850));
    }
}
