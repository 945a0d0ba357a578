//! Talk accessor and batch talk lookup.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, warn};

use crate::client::ApiClient;
use crate::error::{Error, Result};
use crate::feed::{self, Direction, FeedPages};
use crate::request::{Endpoint, Request, NO_PARAMS};
use crate::response::{Record, Response};
use crate::transport::{HttpTransport, Transport};

/// Read `key` from a talk record, either at the top level or nested under
/// `talk` (the single-talk endpoint wraps the talk next to its `user`).
fn talk_field<'r>(record: &'r Record, key: &str) -> Option<&'r Value> {
    record.get(key).or_else(|| {
        record
            .get("talk")
            .and_then(Value::as_object)
            .and_then(|talk| talk.get(key))
    })
}

/// `talkId` of a talk record.
pub fn talk_id_of(record: &Record) -> Option<&str> {
    talk_field(record, "talkId").and_then(Value::as_str)
}

/// `lastPostId` of a talk record.
pub fn last_post_id(record: &Record) -> Option<i64> {
    talk_field(record, "lastPostId").and_then(Value::as_i64)
}

/// Reduce a `talks/{id}` reply to the bare talk record the batch endpoint
/// returns, and check that it describes `id`.
fn unwrap_talk(id: &str, mut record: Record) -> Result<Record> {
    let talk = match record.remove("talk") {
        Some(Value::Object(talk)) => talk,
        Some(other) => {
            record.insert("talk".into(), other);
            record
        }
        None => record,
    };
    match talk_id_of(&talk) {
        Some(found) if found == id => Ok(talk),
        found => Err(Error::Validation(format!(
            "lookup of talk {id} returned talkId {}",
            found.unwrap_or("<none>")
        ))),
    }
}

/// Result of [`Talk::info_batch`].
#[derive(Debug, Default)]
pub struct BatchInfo {
    /// Bare talk records (`{talkId, name, …}`) keyed by the requested
    /// `talkId`, whichever endpoint they came from.
    pub succeeded: BTreeMap<String, Record>,
    /// Ids that also failed when fetched on their own, with that error.
    pub failed: BTreeMap<String, Error>,
}

/// A talk, addressed by its real `talkId`.
///
/// The talk's info record is fetched on first use and cached on this value
/// until [`flush`](Talk::flush) is called.
#[derive(Debug)]
pub struct Talk<'a, T = HttpTransport> {
    client: &'a ApiClient<T>,
    talk_id: String,
    info: Option<Record>,
}

impl<'a, T: Transport> Talk<'a, T> {
    pub fn new(client: &'a ApiClient<T>, talk_id: impl Into<String>) -> Self {
        Self {
            client,
            talk_id: talk_id.into(),
            info: None,
        }
    }

    /// Build a talk from an info record the caller already holds.
    ///
    /// Fails with [`Error::Validation`] when the record carries no `talkId`.
    pub fn with_info(client: &'a ApiClient<T>, info: Record) -> Result<Self> {
        let talk_id = talk_id_of(&info)
            .ok_or_else(|| Error::Validation("info record has no `talkId`".into()))?
            .to_string();
        Ok(Self {
            client,
            talk_id,
            info: Some(info),
        })
    }

    pub fn talk_id(&self) -> &str {
        &self.talk_id
    }

    /// The talk's info record, fetched from `talks/{id}` on first use.
    pub fn info(&mut self) -> Result<&Record> {
        let info = match self.info.take() {
            Some(info) => info,
            None => self
                .client
                .get(Endpoint::Talk(&self.talk_id), NO_PARAMS)?
                .into_dict()?,
        };
        Ok(self.info.insert(info))
    }

    /// Drop the cached info; the next [`info`](Talk::info) refetches.
    pub fn flush(&mut self) {
        self.info = None;
    }

    /// `user.userId` from the info record.
    pub fn user_id(&mut self) -> Result<String> {
        let info = self.info()?;
        info.get("user")
            .and_then(Value::as_object)
            .and_then(|user| user.get("userId"))
            .and_then(|id| match id {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .ok_or_else(|| Error::Validation("talk info has no `user.userId`".into()))
    }

    /// `lastPostId` from the info record.
    pub fn last_post_id(&mut self) -> Result<i64> {
        let talk_id = self.talk_id.clone();
        last_post_id(self.info()?)
            .ok_or_else(|| Error::Validation(format!("talk {talk_id} has no `lastPostId`")))
    }

    /// One page of posts at or before `cursor` (default: the talk's
    /// `lastPostId`), newest first.
    pub fn feed(&mut self, cursor: Option<i64>, limit: u32) -> Result<Vec<Record>> {
        self.feed_response(cursor, limit, Direction::Prev)?.into_list()
    }

    /// Like [`feed`](Talk::feed) but returns the whole response, metadata
    /// included, and lets the caller pick the direction.
    pub fn feed_response(
        &mut self,
        cursor: Option<i64>,
        limit: u32,
        direction: Direction,
    ) -> Result<Response> {
        let cursor = match cursor {
            Some(c) => c,
            None => self.last_post_id()?,
        };
        feed::fetch_page(self.client, &self.talk_id, Some(cursor), limit, direction)
    }

    /// Page backwards through the whole feed, starting at `start` or at the
    /// talk's `lastPostId`.
    pub fn iter_feed(&self, start: Option<i64>, limit: u32) -> FeedPages<'a, T> {
        self.iter_feed_direction(start, limit, Direction::Prev)
    }

    /// [`iter_feed`](Talk::iter_feed) with an explicit direction.
    pub fn iter_feed_direction(
        &self,
        start: Option<i64>,
        limit: u32,
        direction: Direction,
    ) -> FeedPages<'a, T> {
        // A cached info record saves the paginator a round trip.
        let start = start.or_else(|| self.info.as_ref().and_then(last_post_id));
        FeedPages::new(self.client, self.talk_id.clone(), start, limit, direction)
    }

    /// Look up many talks with `talk/info?talkIds=…`.
    ///
    /// Ids are deduplicated and sent in chunks of
    /// [`ClientConfig::batch_size`](crate::ClientConfig::batch_size) (at most
    /// five), one request per chunk, in order. An id missing from its chunk's
    /// response, or belonging to a chunk whose request failed, is retried on
    /// its own via `talks/{id}` before it is reported as failed.
    pub fn info_batch<S: AsRef<str>>(client: &ApiClient<T>, ids: &[S]) -> BatchInfo {
        let mut unique: Vec<&str> = Vec::with_capacity(ids.len());
        for id in ids {
            let id = id.as_ref();
            if !unique.contains(&id) {
                unique.push(id);
            }
        }

        let mut result = BatchInfo::default();
        for chunk in unique.chunks(client.config().batch_size()) {
            let request = Request::get(Endpoint::TalkInfo).param("talkIds", chunk.join(","));
            let pending: Vec<&str> = match client.execute(&request).and_then(Response::into_list) {
                Ok(records) => {
                    for record in records {
                        let Some(id) = talk_id_of(&record).map(str::to_string) else {
                            continue;
                        };
                        if chunk.contains(&id.as_str()) && !result.succeeded.contains_key(&id) {
                            result.succeeded.insert(id, record);
                        }
                    }
                    chunk
                        .iter()
                        .copied()
                        .filter(|id| !result.succeeded.contains_key(*id))
                        .collect()
                }
                Err(e) => {
                    warn!(chunk = ?chunk, error = %e, "batch lookup failed; retrying ids one by one");
                    chunk.to_vec()
                }
            };

            for id in pending {
                debug!(talk_id = id, "individual lookup");
                match client
                    .get(Endpoint::Talk(id), NO_PARAMS)
                    .and_then(Response::into_dict)
                    .and_then(|record| unwrap_talk(id, record))
                {
                    Ok(record) => {
                        result.succeeded.insert(id.to_string(), record);
                    }
                    Err(e) => {
                        result.failed.insert(id.to_string(), e);
                    }
                }
            }
        }
        result
    }
}
