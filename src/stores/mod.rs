//! Client-side stores
//!
//! - [`notifications`] - transient error/warning/info list with auto-expiry
//! - [`account`] - active account, account list, broker snapshot
//! - [`auth`] - login/logout over the shared `Session`

pub mod account;
pub mod auth;
pub mod notifications;
pub mod types;

pub use account::{AccountState, AccountStore};
pub use auth::AuthStore;
pub use notifications::{
    ExpiryPolicy, Notification, NotificationEvent, NotificationId, NotificationStore, Severity,
};
pub use types::{Account, AccountInfo, AccountType};
