//! Customer rows with their order totals.

use chrono::{DateTime, Utc};

use elegance_core::{Money, UserId, UserRole};

/// A registered user with order count and lifetime spend.
///
/// Spend excludes cancelled orders.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CustomerRow {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub order_count: i64,
    pub total_spent: Money,
    pub last_order_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl CustomerRow {
    #[must_use]
    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            "(no name)".to_owned()
        } else {
            name.to_owned()
        }
    }
}
