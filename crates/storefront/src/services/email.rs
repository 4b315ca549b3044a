//! Transactional email for password resets and order confirmations.
//!
//! Uses SMTP via lettre with Askama templates. When SMTP isn't configured
//! the storefront runs without an `EmailService` and logs links instead.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;
use crate::models::{Order, OrderItem};

#[derive(Template)]
#[template(path = "email/password_reset.html")]
struct PasswordResetHtml<'a> {
    store_name: &'a str,
    name: &'a str,
    reset_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/password_reset.txt")]
struct PasswordResetText<'a> {
    store_name: &'a str,
    name: &'a str,
    reset_url: &'a str,
}

/// One order line as shown in the confirmation email.
pub struct EmailLine {
    pub name: String,
    pub options: String,
    pub quantity: i32,
    pub total: String,
}

#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> {
    store_name: &'a str,
    order_number: &'a str,
    first_name: &'a str,
    lines: &'a [EmailLine],
    subtotal: String,
    shipping: String,
    discount: Option<String>,
    tax: String,
    total: String,
    order_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationText<'a> {
    store_name: &'a str,
    order_number: &'a str,
    first_name: &'a str,
    lines: &'a [EmailLine],
    subtotal: String,
    shipping: String,
    discount: Option<String>,
    tax: String,
    total: String,
    order_url: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    store_name: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig, store_name: &str) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
            store_name: store_name.to_owned(),
        })
    }

    /// Send a password reset link.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_password_reset(
        &self,
        to: &str,
        name: &str,
        reset_url: &str,
    ) -> Result<(), EmailError> {
        let store_name = self.store_name.as_str();
        let html = PasswordResetHtml {
            store_name,
            name,
            reset_url,
        }
        .render()?;
        let text = PasswordResetText {
            store_name,
            name,
            reset_url,
        }
        .render()?;

        let subject = format!("Reset your {store_name} password");
        self.send_multipart_email(to, &subject, &text, &html).await
    }

    /// Send the order confirmation.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_order_confirmation(
        &self,
        order: &Order,
        items: &[OrderItem],
        order_url: &str,
    ) -> Result<(), EmailError> {
        let lines = email_lines(items);
        let order_number = order.number();
        let store_name = self.store_name.as_str();
        let discount = (!order.discount_amount.is_zero()).then(|| order.discount_amount.to_string());

        let html = OrderConfirmationHtml {
            store_name,
            order_number: &order_number,
            first_name: &order.first_name,
            lines: &lines,
            subtotal: order.subtotal.to_string(),
            shipping: order.shipping_cost.to_string(),
            discount: discount.clone(),
            tax: order.tax_amount.to_string(),
            total: order.total.to_string(),
            order_url,
        }
        .render()?;
        let text = OrderConfirmationText {
            store_name,
            order_number: &order_number,
            first_name: &order.first_name,
            lines: &lines,
            subtotal: order.subtotal.to_string(),
            shipping: order.shipping_cost.to_string(),
            discount,
            tax: order.tax_amount.to_string(),
            total: order.total.to_string(),
            order_url,
        }
        .render()?;

        let subject = format!("Your {store_name} order {order_number}");
        self.send_multipart_email(&order.email, &subject, &text, &html)
            .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;
        tracing::info!(to = %to, subject = %subject, "Email sent");
        Ok(())
    }
}

fn email_lines(items: &[OrderItem]) -> Vec<EmailLine> {
    items
        .iter()
        .map(|item| {
            let options = [item.size.as_deref(), item.color.as_deref()]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" / ");
            EmailLine {
                name: item.product_name.clone(),
                options,
                quantity: item.quantity,
                total: item.line_total().to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use elegance_core::{Money, OrderItemId, ProductId};

    #[test]
    fn test_password_reset_text_contains_link() {
        let text = PasswordResetText {
            store_name: "Elegance",
            name: "Layla",
            reset_url: "https://shop.example/auth/reset-password?token=abc",
        }
        .render()
        .unwrap();
        assert!(text.contains("https://shop.example/auth/reset-password?token=abc"));
        assert!(text.contains("Layla"));
    }

    #[test]
    fn test_email_lines_join_options() {
        let items = vec![OrderItem {
            id: OrderItemId::new(1),
            product_id: Some(ProductId::new(1)),
            product_name: "Silk Abaya".to_owned(),
            product_image: None,
            unit_price: Money::from_cents(12000),
            quantity: 2,
            size: Some("L".to_owned()),
            color: Some("Navy Blue".to_owned()),
        }];
        let lines = email_lines(&items);
        assert_eq!(lines[0].options, "L / Navy Blue");
        assert_eq!(lines[0].total, "$240.00");
    }
}
