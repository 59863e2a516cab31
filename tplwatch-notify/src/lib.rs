//! # tplwatch-notify
//!
//! Renders "new templates" notices with Tera and delivers them to a Telegram
//! chat.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tplwatch_notify::{Notifier, TelegramNotifier};
//! use tplwatch_core::Config;
//!
//! fn announce(config: &Config, items: &[String]) {
//!     if let Ok(notifier) = TelegramNotifier::from_config(config) {
//!         for repo in &config.repositories {
//!             let _ = notifier.new_templates(repo, items);
//!         }
//!     }
//! }
//! ```

pub mod context;
pub mod error;
pub mod render;
pub mod telegram;

pub use error::NotifyError;
pub use render::MessageRenderer;
pub use telegram::{Notifier, TelegramNotifier};
