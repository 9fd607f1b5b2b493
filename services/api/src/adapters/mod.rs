pub mod db;
pub mod mail;
pub mod qr;

pub use db::DbAdapter;
pub use mail::{LogMailer, SmtpMailer};
pub use qr::QrPaymentAdapter;
