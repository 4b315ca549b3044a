//! Saved customer addresses.

use serde::{Deserialize, Serialize};

use elegance_core::checkout::Address;
use elegance_core::{AddressId, UserId};

/// An address in a customer's address book.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SavedAddress {
    pub id: AddressId,
    pub user_id: UserId,
    pub label: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub apartment: Option<String>,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub phone: Option<String>,
    pub is_default: bool,
}

impl SavedAddress {
    /// The shipping-address view used on orders and checkout.
    #[must_use]
    pub fn to_address(&self) -> Address {
        Address {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            address: self.address.clone(),
            apartment: self.apartment.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            zip_code: self.zip_code.clone(),
            country: self.country.clone(),
        }
    }
}
