//! HTTP client for the daybook journal backend
//!
//! Implements [`daybook_core::JournalRemote`] and [`daybook_core::AuthRemote`]
//! over the REST endpoints (`/signup`, `/login`, `/days`, `/upload/:day`).
//!
//! # Example
//!
//! ```rust,no_run
//! use daybook_client::{ClientConfig, DaybookClient};
//! use daybook_core::AuthRequest;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = DaybookClient::new(ClientConfig {
//!     base_url: "http://localhost:5000".into(),
//!     ..Default::default()
//! })?;
//!
//! let auth = client
//!     .login(&AuthRequest {
//!         username: "ada".into(),
//!         password: "secret".into(),
//!     })
//!     .await?;
//! println!("token for {}: {}", auth.user.username, auth.token);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod types;

// Re-export main types
pub use client::DaybookClient;
pub use error::{ClientError, Result};
pub use types::ClientConfig;
