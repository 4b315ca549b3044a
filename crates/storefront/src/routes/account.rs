//! Account route handlers.
//!
//! Every route here requires a signed-in user via [`RequireAuth`].

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::NaiveDate;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use elegance_core::checkout::{AddressInput, DEFAULT_COUNTRY, FieldError};
use elegance_core::{AddressId, Money, OrderId, OrderStatus, Phone};

use crate::db::{
    AddressFields, AddressRepository, OrderHistoryFilter, OrderRepository, ProductRepository,
    RepositoryError, UserRepository, WishlistRepository,
};
use crate::error::{AppError, Result, clear_sentry_user};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{CurrentUser, OrderSummary, SavedAddress};
use crate::services::{AuthService, CartOwner, CartService, CartServiceError};
use crate::state::AppState;
use crate::views::{Layout, OrderItemView, OrderView, ProductCard, redirect_with_error, redirect_with_success};

/// Recent orders shown on the dashboard.
const RECENT_ORDERS: i64 = 5;

/// Phrase the user must type to delete their account.
const DELETE_CONFIRMATION: &str = "DELETE";

// =============================================================================
// View types
// =============================================================================

/// One row of an order list.
#[derive(Debug, Clone)]
pub struct OrderRow {
    pub id: i32,
    pub number: String,
    pub date: String,
    pub status: OrderStatus,
    pub item_count: i64,
    pub total: String,
}

impl From<&OrderSummary> for OrderRow {
    fn from(order: &OrderSummary) -> Self {
        Self {
            id: order.id.as_i32(),
            number: order.number(),
            date: order.created_at.format("%b %-d, %Y").to_string(),
            status: order.status,
            item_count: order.item_count,
            total: order.total.to_string(),
        }
    }
}

/// Saved address display data.
#[derive(Debug, Clone)]
pub struct AddressView {
    pub id: i32,
    pub label: String,
    pub name: String,
    pub one_line: String,
    pub phone: Option<String>,
    pub is_default: bool,
}

impl From<&SavedAddress> for AddressView {
    fn from(saved: &SavedAddress) -> Self {
        let address = saved.to_address();
        Self {
            id: saved.id.as_i32(),
            label: saved.label.clone(),
            name: format!("{} {}", address.first_name, address.last_name),
            one_line: address.one_line(),
            phone: saved.phone.clone(),
            is_default: saved.is_default,
        }
    }
}

/// Loyalty points earned: one per whole $10 spent.
#[must_use]
pub fn loyalty_points(spent: Money) -> i64 {
    use rust_decimal::prelude::ToPrimitive;

    (spent.amount() / rust_decimal::Decimal::TEN)
        .floor()
        .to_i64()
        .unwrap_or(0)
        .max(0)
}

// =============================================================================
// Form and query types
// =============================================================================

/// Order history filters, as submitted by the filter form.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OrderHistoryQuery {
    pub status: String,
    pub from: String,
    pub to: String,
}

impl OrderHistoryQuery {
    /// Parse into a repository filter. Unparseable values are ignored.
    #[must_use]
    pub fn filter(&self) -> OrderHistoryFilter {
        OrderHistoryFilter {
            status: self.status.parse().ok(),
            from: parse_date(&self.from),
            to: parse_date(&self.to),
        }
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Profile form data.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

impl ProfileForm {
    /// Trimmed names and an optional normalized phone number.
    fn validate(&self) -> std::result::Result<(&str, &str, Option<Phone>), Vec<FieldError>> {
        let mut errors = Vec::new();
        let first_name = self.first_name.trim();
        let last_name = self.last_name.trim();
        if first_name.is_empty() {
            errors.push(FieldError::new("first_name", "This field is required"));
        }
        if last_name.is_empty() {
            errors.push(FieldError::new("last_name", "This field is required"));
        }
        let phone = if self.phone.trim().is_empty() {
            None
        } else {
            match Phone::parse(&self.phone) {
                Ok(phone) => Some(phone),
                Err(_) => {
                    errors.push(FieldError::new("phone", "Please enter a valid phone number"));
                    None
                }
            }
        };

        if errors.is_empty() {
            Ok((first_name, last_name, phone))
        } else {
            Err(errors)
        }
    }
}

/// Change password form data.
#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Address form data.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AddressForm {
    pub label: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub apartment: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub phone: String,
    /// Checkbox; present when ticked.
    pub is_default: Option<String>,
}

impl AddressForm {
    /// Prefilled from a saved address, for the edit page.
    fn from_saved(saved: &SavedAddress) -> Self {
        Self {
            label: saved.label.clone(),
            first_name: saved.first_name.clone(),
            last_name: saved.last_name.clone(),
            address: saved.address.clone(),
            apartment: saved.apartment.clone().unwrap_or_default(),
            city: saved.city.clone(),
            state: saved.state.clone(),
            zip_code: saved.zip_code.clone(),
            country: saved.country.clone(),
            phone: saved.phone.clone().unwrap_or_default(),
            is_default: saved.is_default.then(|| "on".to_owned()),
        }
    }

    fn validate(&self) -> std::result::Result<AddressFields, Vec<FieldError>> {
        let mut errors = Vec::new();
        let input = AddressInput {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            address: self.address.clone(),
            apartment: self.apartment.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            zip_code: self.zip_code.clone(),
            country: self.country.clone(),
        };
        let address = input.validate("", &mut errors);

        let phone = if self.phone.trim().is_empty() {
            None
        } else if let Ok(phone) = Phone::parse(&self.phone) {
            Some(phone.as_str().to_owned())
        } else {
            errors.push(FieldError::new("phone", "Please enter a valid phone number"));
            None
        };

        match address {
            Some(address) if errors.is_empty() => {
                let label = self.label.trim();
                Ok(AddressFields {
                    label: if label.is_empty() { "Home".to_owned() } else { label.to_owned() },
                    address,
                    phone,
                    is_default: self.is_default.is_some(),
                })
            }
            _ => Err(errors),
        }
    }
}

/// Account deletion form data.
#[derive(Debug, Deserialize)]
pub struct DeleteAccountForm {
    pub confirmation: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Account dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountIndexTemplate {
    pub layout: Layout,
    pub first_name: String,
    pub email: String,
    pub order_count: i64,
    pub total_spent: String,
    pub wishlist_count: usize,
    pub loyalty_points: i64,
    pub recent_orders: Vec<OrderRow>,
    pub default_address: Option<AddressView>,
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub layout: Layout,
    pub orders: Vec<OrderRow>,
    pub statuses: &'static [OrderStatus],
    pub status: String,
    pub from: String,
    pub to: String,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "account/order.html")]
pub struct OrderDetailTemplate {
    pub layout: Layout,
    pub order: OrderView,
    pub items: Vec<OrderItemView>,
}

/// Profile and password template.
#[derive(Template, WebTemplate)]
#[template(path = "account/profile.html")]
pub struct ProfileTemplate {
    pub layout: Layout,
    pub email: String,
    pub form: ProfileForm,
    pub errors: Vec<FieldError>,
}

impl ProfileTemplate {
    /// First error message for a field.
    #[must_use]
    pub fn error_for(&self, field: &str) -> Option<&str> {
        error_for(&self.errors, field)
    }
}

/// Saved addresses template.
#[derive(Template, WebTemplate)]
#[template(path = "account/addresses.html")]
pub struct AddressesTemplate {
    pub layout: Layout,
    pub addresses: Vec<AddressView>,
}

/// New or edit address template.
#[derive(Template, WebTemplate)]
#[template(path = "account/address_form.html")]
pub struct AddressFormTemplate {
    pub layout: Layout,
    /// `None` when creating.
    pub address_id: Option<i32>,
    pub form: AddressForm,
    pub errors: Vec<FieldError>,
    pub default_country: &'static str,
}

impl AddressFormTemplate {
    /// First error message for a field.
    #[must_use]
    pub fn error_for(&self, field: &str) -> Option<&str> {
        error_for(&self.errors, field)
    }

    /// Form action URL.
    #[must_use]
    pub fn action(&self) -> String {
        self.address_id.map_or_else(
            || "/account/addresses".to_owned(),
            |id| format!("/account/addresses/{id}"),
        )
    }
}

/// Wishlist template.
#[derive(Template, WebTemplate)]
#[template(path = "account/wishlist.html")]
pub struct WishlistTemplate {
    pub layout: Layout,
    pub products: Vec<ProductCard>,
}

fn error_for<'e>(errors: &'e [FieldError], field: &str) -> Option<&'e str> {
    errors
        .iter()
        .find(|e| e.field == field)
        .map(|e| e.message.as_str())
}

// =============================================================================
// Dashboard
// =============================================================================

/// Display the account dashboard.
#[instrument(skip(state, layout, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    layout: Layout,
) -> Result<AccountIndexTemplate> {
    let orders = OrderRepository::new(state.pool());
    let wishlist = WishlistRepository::new(state.pool());
    let addresses = AddressRepository::new(state.pool());

    let ((order_count, spent), recent, saved, default_address) = tokio::try_join!(
        orders.stats_for_user(user.id),
        orders.recent_for_user(user.id, RECENT_ORDERS),
        wishlist.product_ids(user.id),
        addresses.get_default(user.id),
    )?;

    Ok(AccountIndexTemplate {
        layout,
        first_name: user.display_name().to_owned(),
        email: user.email.to_string(),
        order_count,
        total_spent: spent.to_string(),
        wishlist_count: saved.len(),
        loyalty_points: loyalty_points(spent),
        recent_orders: recent.iter().map(OrderRow::from).collect(),
        default_address: default_address.as_ref().map(AddressView::from),
    })
}

// =============================================================================
// Orders
// =============================================================================

/// Display order history.
#[instrument(skip(state, layout, user), fields(user_id = %user.id))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    layout: Layout,
    Query(query): Query<OrderHistoryQuery>,
) -> Result<OrdersTemplate> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id, query.filter())
        .await?;

    Ok(OrdersTemplate {
        layout,
        orders: orders.iter().map(OrderRow::from).collect(),
        statuses: OrderStatus::ALL,
        status: query.status,
        from: query.from,
        to: query.to,
    })
}

/// Display one order.
#[instrument(skip(state, layout, user), fields(user_id = %user.id))]
pub async fn order_detail(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    layout: Layout,
    Path(id): Path<OrderId>,
) -> Result<OrderDetailTemplate> {
    let repo = OrderRepository::new(state.pool());
    let order = repo
        .get_for_user(user.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {id}")))?;
    let items = repo.items(order.id).await?;

    Ok(OrderDetailTemplate {
        layout,
        order: OrderView::from(&order),
        items: items.iter().map(OrderItemView::from).collect(),
    })
}

/// Cancel a pending or processing order.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn cancel_order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Redirect> {
    let path = format!("/account/orders/{id}");
    if OrderRepository::new(state.pool()).cancel(user.id, id).await? {
        tracing::info!(order_id = %id, "Order cancelled by customer");
        Ok(redirect_with_success(&path, "Your order has been cancelled."))
    } else {
        Ok(redirect_with_error(&path, "This order can no longer be cancelled."))
    }
}

/// Add an order's products back to the cart.
///
/// Products that are gone, inactive, or out of stock are skipped.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn reorder(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Redirect> {
    let orders = OrderRepository::new(state.pool());
    let order = orders
        .get_for_user(user.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {id}")))?;
    let items = orders.items(order.id).await?;

    let ids: Vec<_> = items.iter().filter_map(|i| i.product_id).collect();
    let products = ProductRepository::new(state.pool()).get_many(&ids).await?;

    let cart = CartService::new(state.pool(), &session, CartOwner::of(Some(&user)));
    let mut added = 0_usize;
    let mut skipped = 0_usize;
    for item in &items {
        let Some(product) = item
            .product_id
            .and_then(|pid| products.iter().find(|p| p.id == pid))
        else {
            skipped += 1;
            continue;
        };
        match cart
            .add(
                product,
                i64::from(item.quantity),
                item.size.as_deref(),
                item.color.as_deref(),
            )
            .await
        {
            Ok(()) => added += 1,
            Err(CartServiceError::Cart(e)) => {
                tracing::debug!(product_id = %product.id, error = %e, "Skipped reorder line");
                skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    let back = format!("/account/orders/{id}");
    Ok(match (added, skipped) {
        (0, _) => redirect_with_error(&back, "None of these items are available right now."),
        (_, 0) => redirect_with_success("/cart", "Items from your order were added to your cart."),
        _ => redirect_with_success(
            "/cart",
            "Some items were added to your cart. Others are no longer available.",
        ),
    })
}

// =============================================================================
// Profile
// =============================================================================

/// Display the profile page.
#[instrument(skip(state, layout, user), fields(user_id = %user.id))]
pub async fn profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    layout: Layout,
) -> Result<ProfileTemplate> {
    let record = UserRepository::new(state.pool())
        .get_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Account".to_owned()))?;

    Ok(ProfileTemplate {
        layout,
        email: record.email.to_string(),
        form: ProfileForm {
            first_name: record.first_name,
            last_name: record.last_name,
            phone: record.phone.unwrap_or_default(),
        },
        errors: Vec::new(),
    })
}

/// Save profile changes.
#[instrument(skip(state, session, layout, user, form), fields(user_id = %user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    layout: Layout,
    Form(form): Form<ProfileForm>,
) -> Result<Response> {
    let (first_name, last_name, phone) = match form.validate() {
        Ok(valid) => valid,
        Err(errors) => {
            return Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                ProfileTemplate {
                    layout,
                    email: user.email.to_string(),
                    form,
                    errors,
                },
            )
                .into_response());
        }
    };

    let updated = UserRepository::new(state.pool())
        .update_profile(
            user.id,
            first_name,
            last_name,
            phone.as_ref().map(Phone::as_str),
        )
        .await?;

    // Keep the header greeting in sync.
    session
        .insert(
            crate::models::keys::CURRENT_USER,
            CurrentUser {
                first_name: updated.first_name,
                ..user
            },
        )
        .await?;

    Ok(redirect_with_success("/account/profile", "Your profile has been updated.").into_response())
}

/// Change the account password.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<PasswordForm>,
) -> Result<Redirect> {
    match AuthService::new(state.pool())
        .change_password(
            user.id,
            &form.current_password,
            &form.new_password,
            &form.confirm_password,
        )
        .await
    {
        Ok(()) => {
            tracing::info!("Password changed");
            Ok(redirect_with_success("/account/profile", "Your password has been changed."))
        }
        Err(e) if e.is_user_error() => Ok(redirect_with_error("/account/profile", &e.user_message())),
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Addresses
// =============================================================================

/// List saved addresses.
#[instrument(skip(state, layout, user), fields(user_id = %user.id))]
pub async fn addresses(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    layout: Layout,
) -> Result<AddressesTemplate> {
    let saved = AddressRepository::new(state.pool()).list(user.id).await?;
    Ok(AddressesTemplate {
        layout,
        addresses: saved.iter().map(AddressView::from).collect(),
    })
}

/// Display the new address form.
pub async fn new_address(RequireAuth(_user): RequireAuth, layout: Layout) -> AddressFormTemplate {
    AddressFormTemplate {
        layout,
        address_id: None,
        form: AddressForm {
            country: DEFAULT_COUNTRY.to_owned(),
            ..AddressForm::default()
        },
        errors: Vec::new(),
        default_country: DEFAULT_COUNTRY,
    }
}

/// Save a new address. The first address becomes the default.
#[instrument(skip(state, layout, user, form), fields(user_id = %user.id))]
pub async fn create_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    layout: Layout,
    Form(form): Form<AddressForm>,
) -> Result<Response> {
    let fields = match form.validate() {
        Ok(fields) => fields,
        Err(errors) => {
            return Ok(invalid_address(layout, None, form, errors));
        }
    };

    let id = AddressRepository::new(state.pool())
        .create(user.id, &fields)
        .await?;
    tracing::info!(address_id = %id, "Address saved");

    Ok(redirect_with_success("/account/addresses", "Address saved.").into_response())
}

/// Display the edit address form.
#[instrument(skip(state, layout, user), fields(user_id = %user.id))]
pub async fn edit_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    layout: Layout,
    Path(id): Path<AddressId>,
) -> Result<AddressFormTemplate> {
    let saved = AddressRepository::new(state.pool())
        .get(user.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Address {id}")))?;

    Ok(AddressFormTemplate {
        layout,
        address_id: Some(id.as_i32()),
        form: AddressForm::from_saved(&saved),
        errors: Vec::new(),
        default_country: DEFAULT_COUNTRY,
    })
}

/// Save changes to an address.
#[instrument(skip(state, layout, user, form), fields(user_id = %user.id))]
pub async fn update_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    layout: Layout,
    Path(id): Path<AddressId>,
    Form(form): Form<AddressForm>,
) -> Result<Response> {
    let fields = match form.validate() {
        Ok(fields) => fields,
        Err(errors) => {
            return Ok(invalid_address(layout, Some(id), form, errors));
        }
    };

    match AddressRepository::new(state.pool())
        .update(user.id, id, &fields)
        .await
    {
        Ok(()) => Ok(redirect_with_success("/account/addresses", "Address updated.").into_response()),
        Err(RepositoryError::NotFound) => Err(AppError::NotFound(format!("Address {id}"))),
        Err(e) => Err(e.into()),
    }
}

/// Make an address the default.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn set_default_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Redirect> {
    match AddressRepository::new(state.pool())
        .set_default(user.id, id)
        .await
    {
        Ok(()) => Ok(redirect_with_success("/account/addresses", "Default address updated.")),
        Err(RepositoryError::NotFound) => Err(AppError::NotFound(format!("Address {id}"))),
        Err(e) => Err(e.into()),
    }
}

/// Delete an address.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Redirect> {
    match AddressRepository::new(state.pool()).delete(user.id, id).await {
        Ok(()) => Ok(redirect_with_success("/account/addresses", "Address deleted.")),
        Err(RepositoryError::NotFound) => Err(AppError::NotFound(format!("Address {id}"))),
        Err(e) => Err(e.into()),
    }
}

fn invalid_address(
    layout: Layout,
    id: Option<AddressId>,
    form: AddressForm,
    errors: Vec<FieldError>,
) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        AddressFormTemplate {
            layout,
            address_id: id.map(|id| id.as_i32()),
            form,
            errors,
            default_country: DEFAULT_COUNTRY,
        },
    )
        .into_response()
}

// =============================================================================
// Wishlist
// =============================================================================

/// Display saved products.
#[instrument(skip(state, layout, user), fields(user_id = %user.id))]
pub async fn wishlist(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    layout: Layout,
) -> Result<WishlistTemplate> {
    let products = WishlistRepository::new(state.pool())
        .products(user.id)
        .await?;

    Ok(WishlistTemplate {
        layout,
        products: products.iter().map(|p| ProductCard::new(p, true)).collect(),
    })
}

// =============================================================================
// Account deletion
// =============================================================================

/// Delete the account after the user types the confirmation phrase.
#[instrument(skip(state, session, user, form), fields(user_id = %user.id))]
pub async fn delete_account(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<DeleteAccountForm>,
) -> Result<Redirect> {
    if form.confirmation.trim() != DELETE_CONFIRMATION {
        return Ok(redirect_with_error(
            "/account/profile",
            &format!("Type {DELETE_CONFIRMATION} to confirm account deletion."),
        ));
    }

    UserRepository::new(state.pool()).delete(user.id).await?;
    tracing::info!("Account deleted");

    if let Err(e) = session.flush().await {
        tracing::error!("Failed to flush session: {}", e);
    }
    clear_sentry_user();

    Ok(redirect_with_success("/", "Your account has been deleted."))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_loyalty_points_floor() {
        assert_eq!(loyalty_points(Money::ZERO), 0);
        assert_eq!(loyalty_points(Money::from_cents(999)), 0);
        assert_eq!(loyalty_points(Money::from_cents(1_000)), 1);
        assert_eq!(loyalty_points(Money::new(Decimal::new(25_499, 2))), 25);
    }

    #[test]
    fn test_order_history_filter_ignores_garbage() {
        let query = OrderHistoryQuery {
            status: "shipped".to_owned(),
            from: "2025-01-31".to_owned(),
            to: "next tuesday".to_owned(),
        };
        let filter = query.filter();
        assert_eq!(filter.status, Some(OrderStatus::Shipped));
        assert_eq!(filter.from, NaiveDate::from_ymd_opt(2025, 1, 31));
        assert_eq!(filter.to, None);

        let empty = OrderHistoryQuery::default().filter();
        assert_eq!(empty.status, None);
        assert_eq!(empty.from, None);
    }

    #[test]
    fn test_profile_form_requires_names() {
        let form = ProfileForm {
            first_name: "  ".to_owned(),
            last_name: "Rahman".to_owned(),
            phone: "not a phone".to_owned(),
        };
        let errors = form.validate().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, ["first_name", "phone"]);
    }

    #[test]
    fn test_profile_form_trims_and_allows_blank_phone() {
        let form = ProfileForm {
            first_name: " Amira ".to_owned(),
            last_name: "Rahman".to_owned(),
            phone: String::new(),
        };
        let (first, last, phone) = form.validate().unwrap();
        assert_eq!((first, last), ("Amira", "Rahman"));
        assert!(phone.is_none());
    }

    fn address_form() -> AddressForm {
        AddressForm {
            label: String::new(),
            first_name: "Amira".to_owned(),
            last_name: "Rahman".to_owned(),
            address: "12 Cedar Lane".to_owned(),
            apartment: String::new(),
            city: "Dearborn".to_owned(),
            state: "MI".to_owned(),
            zip_code: "48126".to_owned(),
            country: String::new(),
            phone: String::new(),
            is_default: None,
        }
    }

    #[test]
    fn test_address_form_defaults_label_and_country() {
        let fields = address_form().validate().unwrap();
        assert_eq!(fields.label, "Home");
        assert_eq!(fields.address.country, DEFAULT_COUNTRY);
        assert!(!fields.is_default);
        assert_eq!(fields.address.apartment, None);
    }

    #[test]
    fn test_address_form_collects_errors() {
        let form = AddressForm {
            city: String::new(),
            zip_code: " ".to_owned(),
            ..address_form()
        };
        let errors = form.validate().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, ["city", "zip_code"]);
    }

    #[test]
    fn test_error_for_finds_first_match() {
        let errors = vec![
            FieldError::new("phone", "Please enter a valid phone number"),
            FieldError::new("phone", "second"),
        ];
        assert_eq!(error_for(&errors, "phone"), Some("Please enter a valid phone number"));
        assert_eq!(error_for(&errors, "city"), None);
    }
}
