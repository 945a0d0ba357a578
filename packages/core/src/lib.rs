//! Client library for the 7gogo (755) JSON API.
//!
//! Resolves public talk pages to the `talkId` the API uses, reads talk and
//! user metadata, looks talks up in batches, and pages through a talk's post
//! feed.
//!
//! # Crate layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`client`] | [`ApiClient`]: request dispatch and status handling |
//! | [`request`] | [`ApiPath`], the [`Endpoint`] table and [`Request`] |
//! | [`transport`] | The [`Transport`] seam and the blocking [`HttpTransport`] |
//! | [`response`] | `data` envelope normalisation into [`Response`] |
//! | [`api_error`] | Structured errors from JSON or HTML error bodies |
//! | [`resolve`] | Public page → `talkId` scraping behind [`TalkIdResolver`] |
//! | [`talk`] | [`Talk`] accessor and batch lookup |
//! | [`user`] | [`User`] accessor |
//! | [`feed`] | [`FeedPages`] cursor pagination |
//! | [`config`] | [`ClientConfig`] and its environment overrides |
//!
//! # Quick start
//!
//! ```rust,no_run
//! use nanagogo::{ApiClient, Result, TalkIdResolver};
//!
//! fn main() -> Result<()> {
//!     let client = ApiClient::new()?;
//!
//!     let talk_id = client.resolver().resolve("Xe8jJ0D40_aWkVIvojdMdG==")?;
//!     let talk = client.talk(talk_id);
//!
//!     for page in talk.iter_feed(None, 200) {
//!         for post in page? {
//!             println!("{}", post["post"]["postId"]);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Everything is synchronous: each call blocks until the server answers.

pub mod api_error;
pub mod client;
pub mod config;
pub mod error;
pub mod feed;
pub mod request;
pub mod resolve;
pub mod response;
pub mod talk;
pub mod transport;
pub mod user;

#[cfg(test)]
mod testing;

pub use api_error::ApiError;
pub use client::ApiClient;
pub use config::{ClientConfig, MAX_BATCH_SIZE};
pub use error::{Error, Result};
pub use feed::{post_id, Direction, FeedPages, DEFAULT_PAGE_LIMIT};
pub use request::{ApiPath, Endpoint, Method, Request, Target, NO_PARAMS};
pub use resolve::{extract_talk_id, page_url, PageResolver, TalkIdResolver};
pub use response::{Payload, Record, Response, ResponseMeta};
pub use talk::{BatchInfo, Talk};
pub use transport::{HttpTransport, RawResponse, Transport};
pub use user::User;
