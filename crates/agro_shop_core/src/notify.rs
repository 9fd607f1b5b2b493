//! crates/agro_shop_core/src/notify.rs
//!
//! Best-effort outbound mail. Handlers enqueue a `Notification` and move on;
//! a background worker owns delivery and logs failures. Nothing in here can
//! fail a request.

use std::sync::Arc;

use askama::Template;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::Order;
use crate::ports::{NotificationService, PortError, PortResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Welcome,
    PasswordReset,
    OrderPlaced,
    OrderStatusChanged,
}

/// A rendered email ready for a `NotificationService`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

#[derive(Template)]
#[template(
    source = "<h1>Welcome, {{ first_name }}!</h1><p>Thank you for registering.</p>",
    ext = "html"
)]
struct WelcomeHtml<'a> {
    first_name: &'a str,
}

#[derive(Template)]
#[template(
    source = "<h2>Password Reset</h2><p>Click <a href=\"{{ reset_url|safe }}\">here</a> to reset your password. This link is valid for 30 minutes.</p>",
    ext = "html"
)]
struct PasswordResetHtml<'a> {
    reset_url: &'a str,
}

#[derive(Template)]
#[template(
    source = "<h1>Order #{{ order_id }}</h1><p>Thank you for your purchase!</p><p>Total: {{ total }}</p>",
    ext = "html"
)]
struct OrderPlacedHtml<'a> {
    order_id: &'a str,
    total: &'a str,
}

#[derive(Template)]
#[template(source = "<h1>Order #{{ order_id }}</h1><p>Status: {{ status }}</p>", ext = "html")]
struct OrderStatusHtml<'a> {
    order_id: &'a str,
    status: &'a str,
}

fn render(template: &impl Template) -> PortResult<String> {
    template
        .render()
        .map_err(|e| PortError::Unexpected(format!("Mail template failed: {e}")))
}

/// Constructors render the HTML body up front; interpolated values are
/// HTML-escaped, the server-built reset link excepted.
impl Notification {
    pub fn welcome(to: &str, first_name: &str) -> PortResult<Self> {
        Ok(Self {
            kind: NotificationKind::Welcome,
            to: to.to_string(),
            subject: "Welcome to Agro Shop".to_string(),
            html_body: render(&WelcomeHtml { first_name })?,
        })
    }

    pub fn password_reset(to: &str, reset_url: &str) -> PortResult<Self> {
        Ok(Self {
            kind: NotificationKind::PasswordReset,
            to: to.to_string(),
            subject: "Password Reset Request".to_string(),
            html_body: render(&PasswordResetHtml { reset_url })?,
        })
    }

    pub fn order_placed(to: &str, order: &Order) -> PortResult<Self> {
        Ok(Self {
            kind: NotificationKind::OrderPlaced,
            to: to.to_string(),
            subject: "Order Placed".to_string(),
            html_body: render(&OrderPlacedHtml {
                order_id: &order.id.to_string(),
                total: &order.total_price.normalize().to_string(),
            })?,
        })
    }

    pub fn order_status_changed(to: &str, order: &Order) -> PortResult<Self> {
        Ok(Self {
            kind: NotificationKind::OrderStatusChanged,
            to: to.to_string(),
            subject: "Order Status Update".to_string(),
            html_body: render(&OrderStatusHtml {
                order_id: &order.id.to_string(),
                status: &order.status,
            })?,
        })
    }
}

/// Fire-and-forget handle onto the mail worker. Cheap to clone.
#[derive(Clone)]
pub struct NotificationDispatcher {
    tx: mpsc::UnboundedSender<Notification>,
}

impl NotificationDispatcher {
    /// Starts the delivery worker on the current tokio runtime.
    pub fn spawn(service: Arc<dyn NotificationService>) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Notification>();
        let handle = tokio::spawn(async move {
            while let Some(notification) = rx.recv().await {
                match service.send(&notification).await {
                    Ok(()) => debug!(kind = ?notification.kind, to = %notification.to, "Notification delivered"),
                    Err(e) => warn!(
                        kind = ?notification.kind,
                        to = %notification.to,
                        error = %e,
                        "Notification delivery failed"
                    ),
                }
            }
            debug!("Notification worker stopped");
        });
        (Self { tx }, handle)
    }

    /// Queues a rendered message. Never blocks and never fails the caller;
    /// a message that failed to render is logged and dropped.
    pub fn dispatch(&self, rendered: PortResult<Notification>) {
        let notification = match rendered {
            Ok(notification) => notification,
            Err(e) => {
                warn!(error = %e, "Notification could not be rendered; message dropped");
                return;
            }
        };
        if let Err(e) = self.tx.send(notification) {
            warn!(kind = ?e.0.kind, to = %e.0.to, "Notification worker is gone; message dropped");
        }
    }
}
