//! ProTone Client SDK.
//!
//! This crate provides a client library for applications to interact
//! with the ProTone API.
//!
//! # Example
//!
//! ```no_run
//! use protone_client::{Mode, ProToneClient, RewriteRequest, Tone};
//!
//! # async fn example() -> Result<(), protone_client::ClientError> {
//! let client = ProToneClient::with_token("https://api.protone.app", "session-jwt");
//!
//! let rewrite = client
//!     .rewrite(
//!         &RewriteRequest::new("i need friday off", Mode::Normal, Tone::Professional)
//!             .for_recipient("my manager"),
//!     )
//!     .await?;
//!
//! println!("{}", rewrite.result);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod client;
mod error;
mod types;

pub use client::{ClientOptions, ProToneClient};
pub use error::ClientError;
pub use types::*;

pub use protone_core::{Mode, Tone};
