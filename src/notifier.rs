//! Alert dispatch.
//!
//! Rendering is plain string building so it stays testable without an SMTP
//! server; only [`EmailNotifier::notify`] touches the network. Dispatch
//! failures surface as errors but never abort a monitoring pass.

use async_trait::async_trait;
use lettre::message::{header, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::info;

use crate::config::EmailConfig;
use crate::error::{Result, TrackerError};
use crate::models::PriceDropEvent;

/// Transport-agnostic alert sink. Receives the significant events of one
/// monitoring pass, in detection order.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, events: &[PriceDropEvent]) -> Result<()>;

    /// Address the alert goes to, for the notification log.
    fn recipient(&self) -> &str;
}

pub fn render_subject(event_count: usize) -> String {
    format!("Price Alert - {event_count} products!")
}

pub fn render_html_body(events: &[PriceDropEvent]) -> String {
    let mut html = String::from(
        r#"<html>
<head>
<style>
    body { font-family: Arial, sans-serif; }
    .product { border: 1px solid #ddd; margin: 10px 0; padding: 15px; border-radius: 5px; }
    .price-drop { color: #d32f2f; font-weight: bold; }
    .target-reached { background-color: #e8f5e8; }
    .seller { margin: 5px 0; padding: 8px; background-color: #f5f5f5; border-radius: 3px; }
</style>
</head>
<body>
<h2>Price Alert</h2>
<p>Price drops detected on your tracked products!</p>
"#,
    );

    for event in events {
        let css_class = if event.is_target_reached {
            "target-reached"
        } else {
            ""
        };
        let target_line = if event.is_target_reached {
            "<strong>Target price reached!</strong>"
        } else {
            ""
        };

        html.push_str(&format!(
            r#"<div class="product {css_class}">
<h3>{title}</h3>
<div class="seller">
    <strong>Seller:</strong> {seller}<br>
    <strong>Current Price:</strong> <span class="price-drop">${current:.2}</span><br>
    <strong>Previous Lowest:</strong> ${previous:.2}<br>
    <strong>Drop:</strong> ${drop:.2} ({pct:.1}%)<br>
    {target_line}
</div>
</div>
"#,
            title = event.product_title,
            seller = event.seller,
            current = event.current_price,
            previous = event.previous_min_price,
            drop = event.price_drop,
            pct = event.percentage_drop,
        ));
    }

    html.push_str(
        "<p><small>This email was sent automatically by pricewatch.</small></p>\n</body>\n</html>\n",
    );
    html
}

pub fn render_text_body(events: &[PriceDropEvent]) -> String {
    let mut text = String::from("PRICE ALERT\n\nPrice drops detected on your tracked products!\n\n");

    for event in events {
        text.push_str(&format!("Product: {}\n", event.product_title));
        text.push_str(&format!("Seller: {}\n", event.seller));
        text.push_str(&format!("Current Price: ${:.2}\n", event.current_price));
        text.push_str(&format!("Previous Lowest: ${:.2}\n", event.previous_min_price));
        text.push_str(&format!(
            "Drop: ${:.2} ({:.1}%)\n",
            event.price_drop, event.percentage_drop
        ));
        if event.is_target_reached {
            text.push_str("Target price reached!\n");
        }
        text.push('\n');
    }

    text
}

/// SMTP email alerts via STARTTLS relay.
pub struct EmailNotifier {
    smtp_server: String,
    smtp_port: u16,
    sender: String,
    password: String,
    receiver: String,
}

impl EmailNotifier {
    /// Returns `None` when any credential field is missing; the pipeline
    /// then runs detection without dispatch.
    pub fn from_config(config: &EmailConfig) -> Option<Self> {
        if !config.is_configured() {
            return None;
        }

        Some(Self {
            smtp_server: config.smtp_server.clone(),
            smtp_port: config.smtp_port,
            sender: config.sender_email.clone()?,
            password: config.sender_password.clone()?,
            receiver: config.receiver_email.clone()?,
        })
    }

    fn build_message(&self, events: &[PriceDropEvent]) -> Result<Message> {
        Message::builder()
            .from(
                self.sender
                    .parse()
                    .map_err(|e| TrackerError::Notification(format!("invalid sender: {e}")))?,
            )
            .to(self
                .receiver
                .parse()
                .map_err(|e| TrackerError::Notification(format!("invalid receiver: {e}")))?)
            .subject(render_subject(events.len()))
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(render_text_body(events)),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(render_html_body(events)),
                    ),
            )
            .map_err(|e| TrackerError::Notification(e.to_string()))
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, events: &[PriceDropEvent]) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }

        let message = self.build_message(events)?;

        let mailer = SmtpTransport::starttls_relay(&self.smtp_server)
            .map_err(|e| TrackerError::Notification(e.to_string()))?
            .port(self.smtp_port)
            .credentials(Credentials::new(self.sender.clone(), self.password.clone()))
            .build();

        mailer
            .send(&message)
            .map_err(|e| TrackerError::Notification(e.to_string()))?;

        info!(count = events.len(), to = %self.receiver, "price alert sent");
        Ok(())
    }

    fn recipient(&self) -> &str {
        &self.receiver
    }
}
