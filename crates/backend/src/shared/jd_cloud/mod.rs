//! Client for the JD Cloud Trade open platform (JOS router API + OAuth).
//!
//! Every call is a signed form POST to `routerjson`:
//!
//! ```rust,ignore
//! let client = Client::new(&config.jd)?;
//! let creds = Credentials::from_account(&account, Utc::now())?;
//! let prices: Vec<SkuPriceEntry> = client
//!     .execute_as(&creds, api::ware::METHOD_SKU_PRICE, &params)
//!     .await?;
//! ```

pub mod api;
pub mod cache;
pub mod client;
pub mod error;
pub mod oauth;
pub mod sign;

pub use cache::ResponseCache;
pub use client::{Client, Credentials};
pub use error::JdError;
pub use oauth::OAuthClient;
