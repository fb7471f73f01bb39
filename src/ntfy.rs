//! Notification delivery module
//!
//! Everything on the ntfy side of the bridge: the payload priority
//! prefix, delivery-URL construction, and the retrying HTTP client.

pub mod client;
pub mod error;
pub mod priority;
pub mod retry;
pub mod url;

pub use client::{DeliveryTarget, NtfyClient};
pub use error::DeliveryError;
pub use priority::parse_priority;
pub use retry::{RetryAction, RetryPolicy};
pub use url::{UrlError, build_url};
