//! Checkout route handlers.
//!
//! Checkout requires a signed-in customer. Prices shown here are a preview;
//! the order is re-priced from current product rows when it is placed.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use elegance_core::checkout::{CheckoutForm, DEFAULT_COUNTRY, FieldError};
use elegance_core::pricing::{self, OrderTotals, PricingConfig};
use elegance_core::{OrderId, PaymentMethod, ShippingMethod};

use super::cart::CartLineView;
use crate::db::{AddressRepository, OrderRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{CurrentUser, PromoCode};
use crate::services::{CartOwner, CheckoutError, CheckoutService};
use crate::state::AppState;
use crate::views::{
    Layout, OrderItemView, OrderView, redirect_with_error, redirect_with_success,
};

// =============================================================================
// View types
// =============================================================================

/// Order totals display data for templates.
#[derive(Debug, Clone)]
pub struct TotalsView {
    pub item_count: u32,
    pub subtotal: String,
    pub shipping: String,
    pub discount: Option<String>,
    pub tax: String,
    pub total: String,
}

impl From<&OrderTotals> for TotalsView {
    fn from(totals: &OrderTotals) -> Self {
        Self {
            item_count: totals.item_count,
            subtotal: totals.subtotal.to_string(),
            shipping: if totals.shipping.is_zero() {
                "Free".to_owned()
            } else {
                totals.shipping.to_string()
            },
            discount: (!totals.discount.is_zero()).then(|| totals.discount.to_string()),
            tax: totals.tax.to_string(),
            total: totals.total.to_string(),
        }
    }
}

/// Applied promo code display data.
#[derive(Debug, Clone)]
pub struct PromoView {
    pub code: String,
    pub description: String,
}

impl From<&PromoCode> for PromoView {
    fn from(promo: &PromoCode) -> Self {
        Self {
            code: promo.code.clone(),
            description: if promo.description.is_empty() {
                promo.rule().describe()
            } else {
                promo.description.clone()
            },
        }
    }
}

/// Shipping method radio option.
#[derive(Debug, Clone)]
pub struct ShippingOption {
    pub value: &'static str,
    pub label: &'static str,
    pub price: String,
    pub selected: bool,
}

fn shipping_options(
    subtotal: elegance_core::Money,
    selected: ShippingMethod,
    pricing: &PricingConfig,
) -> Vec<ShippingOption> {
    [
        ShippingMethod::Standard,
        ShippingMethod::Express,
        ShippingMethod::Overnight,
    ]
    .into_iter()
    .map(|method| {
        let cost = pricing::shipping_cost(subtotal, method, pricing);
        ShippingOption {
            value: method.as_str(),
            label: method.label(),
            price: if cost.is_zero() {
                "Free".to_owned()
            } else {
                cost.to_string()
            },
            selected: method == selected,
        }
    })
    .collect()
}

// =============================================================================
// Templates
// =============================================================================

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub layout: Layout,
    pub form: CheckoutForm,
    pub errors: Vec<FieldError>,
    pub lines: Vec<CartLineView>,
    pub totals: TotalsView,
    pub promo: Option<PromoView>,
    pub shipping_options: Vec<ShippingOption>,
}

impl CheckoutTemplate {
    /// The validation message for a field, if any.
    #[must_use]
    pub fn error_for(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// Whether the card payment option is selected.
    #[must_use]
    pub fn pays_by_card(&self) -> bool {
        self.form.payment_method == PaymentMethod::Card
    }
}

/// Order summary fragment (for HTMX shipping changes).
#[derive(Template, WebTemplate)]
#[template(path = "partials/checkout_summary.html")]
pub struct CheckoutSummaryTemplate {
    pub lines: Vec<CartLineView>,
    pub totals: TotalsView,
    pub promo: Option<PromoView>,
}

/// Order confirmation page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/success.html")]
pub struct CheckoutSuccessTemplate {
    pub layout: Layout,
    pub order: OrderView,
    pub items: Vec<OrderItemView>,
}

// =============================================================================
// Form / query types
// =============================================================================

/// Selected shipping method.
#[derive(Debug, Deserialize)]
pub struct ShippingQuery {
    pub shipping_method: Option<ShippingMethod>,
}

/// Promo code form data.
#[derive(Debug, Deserialize)]
pub struct PromoForm {
    pub code: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the checkout form, prefilled from the profile and default address.
#[instrument(skip(state, session, layout, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    layout: Layout,
    Query(query): Query<ShippingQuery>,
) -> Result<Response> {
    let method = query.shipping_method.unwrap_or_default();
    let pricing = &state.config().store.pricing;
    let checkout =
        CheckoutService::new(state.pool(), &session, CartOwner::User(user.id), pricing);
    let quote = checkout.quote(method).await?;

    if quote.lines.is_empty() {
        return Ok(redirect_with_error("/cart", "Your cart is empty").into_response());
    }

    let mut form = prefilled_form(&state, &user).await?;
    form.shipping_method = method;

    Ok(CheckoutTemplate {
        layout,
        shipping_options: shipping_options(quote.totals.subtotal, method, pricing),
        totals: TotalsView::from(&quote.totals),
        promo: quote.promo.as_ref().map(PromoView::from),
        lines: quote.lines.iter().map(CartLineView::from).collect(),
        form,
        errors: Vec::new(),
    }
    .into_response())
}

async fn prefilled_form(state: &AppState, user: &CurrentUser) -> Result<CheckoutForm> {
    let users = UserRepository::new(state.pool());
    let addresses = AddressRepository::new(state.pool());
    let (profile, address) = tokio::try_join!(
        users.get_by_id(user.id),
        addresses.get_default(user.id),
    )?;

    let mut form = CheckoutForm {
        email: user.email.to_string(),
        country: DEFAULT_COUNTRY.to_owned(),
        billing_same: Some("on".to_owned()),
        billing_country: DEFAULT_COUNTRY.to_owned(),
        ..CheckoutForm::default()
    };
    if let Some(profile) = profile {
        form.first_name = profile.first_name;
        form.last_name = profile.last_name;
        form.phone = profile.phone.unwrap_or_default();
    }
    if let Some(saved) = address {
        let address = saved.to_address();
        form.first_name = address.first_name;
        form.last_name = address.last_name;
        form.address = address.address;
        form.apartment = address.apartment.unwrap_or_default();
        form.city = address.city;
        form.state = address.state;
        form.zip_code = address.zip_code;
        form.country = address.country;
        if let Some(phone) = saved.phone.filter(|p| !p.is_empty()) {
            form.phone = phone;
        }
    }
    Ok(form)
}

/// Order summary for another shipping method (HTMX).
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn summary(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Query(query): Query<ShippingQuery>,
) -> Result<CheckoutSummaryTemplate> {
    let quote = CheckoutService::new(
        state.pool(),
        &session,
        CartOwner::User(user.id),
        &state.config().store.pricing,
    )
    .quote(query.shipping_method.unwrap_or_default())
    .await?;

    Ok(CheckoutSummaryTemplate {
        totals: TotalsView::from(&quote.totals),
        promo: quote.promo.as_ref().map(PromoView::from),
        lines: quote.lines.iter().map(CartLineView::from).collect(),
    })
}

/// Apply a promo code.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn apply_promo(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<PromoForm>,
) -> Result<Redirect> {
    let promo = CheckoutService::new(
        state.pool(),
        &session,
        CartOwner::User(user.id),
        &state.config().store.pricing,
    )
    .apply_promo(&form.code)
    .await?;

    Ok(match promo {
        Some(promo) => {
            tracing::info!(code = %promo.code, "Promo code applied");
            redirect_with_success("/checkout", &format!("Promo code {} applied", promo.code))
        }
        None => redirect_with_error("/checkout", "Invalid or expired promo code"),
    })
}

/// Remove the applied promo code.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn remove_promo(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<Redirect> {
    CheckoutService::new(
        state.pool(),
        &session,
        CartOwner::User(user.id),
        &state.config().store.pricing,
    )
    .remove_promo()
    .await?;
    Ok(Redirect::to("/checkout"))
}

/// Place the order.
///
/// Validation problems re-render the form with every error shown. Stock
/// problems send the customer back to the cart.
#[instrument(skip(state, session, layout, user, form), fields(user_id = %user.id))]
pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    layout: Layout,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let pricing = &state.config().store.pricing;
    let checkout =
        CheckoutService::new(state.pool(), &session, CartOwner::User(user.id), pricing);
    let today = chrono::Utc::now().date_naive();

    let order_id = match checkout.place_order(&form, today).await {
        Ok(id) => id,
        Err(CheckoutError::Invalid(errors)) => {
            let quote = checkout.quote(form.shipping_method).await?;
            let mut form = form;
            // Card details are never echoed back.
            form.card_number.clear();
            form.card_cvv.clear();
            return Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                CheckoutTemplate {
                    layout,
                    shipping_options: shipping_options(
                        quote.totals.subtotal,
                        form.shipping_method,
                        pricing,
                    ),
                    totals: TotalsView::from(&quote.totals),
                    promo: quote.promo.as_ref().map(PromoView::from),
                    lines: quote.lines.iter().map(CartLineView::from).collect(),
                    form,
                    errors,
                },
            )
                .into_response());
        }
        Err(CheckoutError::EmptyCart) => {
            return Ok(redirect_with_error("/cart", "Your cart is empty").into_response());
        }
        Err(e @ CheckoutError::Unavailable(_)) => {
            return Ok(redirect_with_error("/cart", &e.to_string()).into_response());
        }
        Err(e) => return Err(e.into()),
    };

    send_confirmation(&state, order_id).await;
    Ok(Redirect::to(&format!("/checkout/success/{order_id}")).into_response())
}

/// Email the confirmation in the background. Failures are only logged.
async fn send_confirmation(state: &AppState, order_id: OrderId) {
    let Some(email) = state.email().cloned() else {
        return;
    };

    let orders = OrderRepository::new(state.pool());
    let (order, items) = match tokio::try_join!(orders.get(order_id), orders.items(order_id)) {
        Ok((Some(order), items)) => (order, items),
        Ok((None, _)) => return,
        Err(e) => {
            tracing::warn!(order_id = %order_id, error = %e, "Failed to load order for confirmation email");
            return;
        }
    };

    let order_url = state
        .config()
        .absolute_url(&format!("/account/orders/{order_id}"));
    tokio::spawn(async move {
        if let Err(e) = email
            .send_order_confirmation(&order, &items, &order_url)
            .await
        {
            tracing::error!(order_id = %order.id, error = %e, "Failed to send order confirmation");
        }
    });
}

/// Order confirmation page.
#[instrument(skip(state, layout, user), fields(user_id = %user.id))]
pub async fn success(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    layout: Layout,
    Path(id): Path<OrderId>,
) -> Result<CheckoutSuccessTemplate> {
    let orders = OrderRepository::new(state.pool());
    let order = orders
        .get_for_user(user.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {id}")))?;
    let items = orders.items(order.id).await?;

    Ok(CheckoutSuccessTemplate {
        layout,
        order: OrderView::from(&order),
        items: items.iter().map(OrderItemView::from).collect(),
    })
}

#[cfg(test)]
mod tests {
    use elegance_core::Money;

    use super::*;

    #[test]
    fn test_shipping_options_show_free_standard() {
        let pricing = PricingConfig::default();
        let options = shipping_options(Money::from_cents(25_000), ShippingMethod::Express, &pricing);
        assert_eq!(options.len(), 3);
        assert_eq!(options.first().map(|o| o.price.as_str()), Some("Free"));
        assert!(options.iter().any(|o| o.value == "express" && o.selected));
        assert_eq!(
            options.last().map(|o| o.price.clone()),
            Some(pricing.overnight_rate.to_string())
        );
    }

    #[test]
    fn test_shipping_options_charge_below_threshold() {
        let pricing = PricingConfig::default();
        let options = shipping_options(Money::from_cents(5_000), ShippingMethod::Standard, &pricing);
        assert_eq!(options.first().map(|o| o.price.as_str()), Some("$15.00"));
        assert!(options.first().is_some_and(|o| o.selected));
    }

    #[test]
    fn test_totals_view_hides_zero_discount() {
        let view = TotalsView::from(&OrderTotals::default());
        assert_eq!(view.discount, None);
        assert_eq!(view.shipping, "Free");

        let totals = OrderTotals {
            item_count: 2,
            subtotal: Money::from_cents(20_000),
            shipping: Money::from_cents(0),
            discount: Money::from_cents(2_000),
            tax: Money::from_cents(1_440),
            total: Money::from_cents(19_440),
        };
        let view = TotalsView::from(&totals);
        assert_eq!(view.discount.as_deref(), Some("$20.00"));
        assert_eq!(view.total, "$194.40");
    }
}
