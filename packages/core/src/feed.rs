//! Feed pagination.
//!
//! `GET talks/{id}/posts?limit=N&targetId=C&direction=PREV` returns up to `N`
//! posts at or before post id `C`, newest first. [`FeedPages`] walks a feed
//! by re-issuing that request with the cursor moved past the page it just
//! received:
//!
//! ```text
//! cursor := start, or the talk's lastPostId
//! loop:
//!     page := posts(cursor)
//!     if page is empty: stop
//!     yield page
//!     cursor := min(postId in page) - 1        (PREV)
//!     cursor := max(postId in page) + 1        (NEXT)
//!     if cursor <= 0: stop
//! ```
//!
//! A page whose posts all lie on the far side of the cursor stops the walk
//! without being yielded, so a server that keeps answering with the same page
//! cannot make the iterator loop forever or repeat a page.

use std::fmt;

use serde_json::Value;
use tracing::{debug, warn};

use crate::client::ApiClient;
use crate::error::{Error, Result};
use crate::request::{Endpoint, Request};
use crate::response::{Record, Response};
use crate::talk::last_post_id;
use crate::transport::{HttpTransport, Transport};

/// Default page size for [`FeedPages`].
pub const DEFAULT_PAGE_LIMIT: u32 = 200;

/// Which way a feed is paged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    /// Older posts (decreasing ids).
    #[default]
    Prev,
    /// Newer posts (increasing ids).
    Next,
}

impl Direction {
    /// Wire value of the `direction` parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Prev => "PREV",
            Direction::Next => "NEXT",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `postId` of a feed record, read from `post.postId` or a top-level `postId`.
pub fn post_id(record: &Record) -> Option<i64> {
    record
        .get("post")
        .and_then(Value::as_object)
        .and_then(|post| post.get("postId"))
        .or_else(|| record.get("postId"))
        .and_then(Value::as_i64)
}

/// Fetch a single page of `talk_id`'s feed.
pub(crate) fn fetch_page<T: Transport>(
    client: &ApiClient<T>,
    talk_id: &str,
    cursor: Option<i64>,
    limit: u32,
    direction: Direction,
) -> Result<Response> {
    let request = Request::get(Endpoint::TalkPosts(talk_id))
        .param("limit", limit)
        .param_opt("targetId", cursor)
        .param("direction", direction);
    client.execute(&request)
}

/// Lazy iterator over the pages of a talk's feed.
///
/// Yields `Ok(page)` for each non-empty page. After an `Err` it yields
/// nothing more; [`restart`](FeedPages::restart) rewinds to the first page.
pub struct FeedPages<'a, T = HttpTransport> {
    client: &'a ApiClient<T>,
    talk_id: String,
    limit: u32,
    direction: Direction,
    start: Option<i64>,
    cursor: Option<i64>,
    done: bool,
}

impl<'a, T: Transport> FeedPages<'a, T> {
    /// Walk `talk_id`'s feed from `start`, or from its `lastPostId` when
    /// `start` is `None`.
    pub fn new(
        client: &'a ApiClient<T>,
        talk_id: impl Into<String>,
        start: Option<i64>,
        limit: u32,
        direction: Direction,
    ) -> Self {
        Self {
            client,
            talk_id: talk_id.into(),
            limit,
            direction,
            start,
            cursor: start,
            done: false,
        }
    }

    /// The cursor the next request will use, once known.
    pub fn cursor(&self) -> Option<i64> {
        self.cursor
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Rewind to the starting cursor.
    pub fn restart(&mut self) {
        self.cursor = self.start;
        self.done = false;
    }

    /// Flatten pages into individual records, in page order.
    pub fn records(self) -> impl Iterator<Item = Result<Record>> + 'a
    where
        T: 'a,
    {
        self.flat_map(|page| -> Vec<Result<Record>> {
            match page {
                Ok(records) => records.into_iter().map(Ok).collect(),
                Err(e) => vec![Err(e)],
            }
        })
    }

    fn step(&mut self) -> Result<Option<Vec<Record>>> {
        let cursor = match self.cursor {
            Some(c) => c,
            None => {
                let info = self
                    .client
                    .get(Endpoint::Talk(&self.talk_id), crate::request::NO_PARAMS)?
                    .into_dict()?;
                let c = last_post_id(&info).ok_or_else(|| {
                    Error::Validation(format!("talk {} has no lastPostId", self.talk_id))
                })?;
                self.cursor = Some(c);
                c
            }
        };

        let page = fetch_page(self.client, &self.talk_id, Some(cursor), self.limit, self.direction)?;
        let status = page.meta.status;
        let records = page.into_list()?;
        if records.is_empty() {
            debug!(talk_id = %self.talk_id, cursor, "empty page; feed exhausted");
            self.done = true;
            return Ok(None);
        }

        let ids = records
            .iter()
            .map(|r| post_id(r).ok_or_else(|| Error::malformed(status, "feed record has no postId")))
            .collect::<Result<Vec<i64>>>()?;

        let (edge, next, moved) = match self.direction {
            Direction::Prev => {
                let min = ids.iter().copied().min().unwrap_or(cursor);
                (min, min.checked_sub(1), min <= cursor)
            }
            Direction::Next => {
                let max = ids.iter().copied().max().unwrap_or(cursor);
                (max, max.checked_add(1), max >= cursor)
            }
        };

        if !moved {
            // Every post on this page lies on the far side of the cursor, so
            // it was already yielded or is outside the requested window.
            warn!(
                talk_id = %self.talk_id,
                cursor,
                edge,
                "feed cursor did not advance; stopping"
            );
            self.done = true;
            return Ok(None);
        }

        match next {
            Some(next) => {
                self.cursor = Some(next);
                if next <= 0 {
                    self.done = true;
                }
            }
            // Post id at the edge of the i64 range.
            None => {
                debug!(talk_id = %self.talk_id, edge, "no cursor past this page");
                self.done = true;
            }
        }

        Ok(Some(records))
    }
}

impl<T: Transport> Iterator for FeedPages<'_, T> {
    type Item = Result<Vec<Record>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.step() {
            Ok(Some(page)) => Some(Ok(page)),
            Ok(None) => None,
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<T> fmt::Debug for FeedPages<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedPages")
            .field("talk_id", &self.talk_id)
            .field("limit", &self.limit)
            .field("direction", &self.direction)
            .field("cursor", &self.cursor)
            .field("done", &self.done)
            .finish()
    }
}
