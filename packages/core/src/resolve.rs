//! Public page → `talkId` resolution.
//!
//! A talk's public page (`http://7gogo.jp/lp/<public id>`) is not addressed
//! by the id the API uses. The page embeds its settings in a script block:
//!
//! ```html
//! <script>
//!   var setting = {talkId: 'MqsG1FLTi-_9GtN76wEuUm==', lang: 'ja'};
//! </script>
//! ```
//!
//! [`extract_talk_id`] finds that block and reads `talkId` from it. The block
//! is a JavaScript object literal, not JSON, so it is parsed as a YAML flow
//! mapping, which accepts unquoted keys and single-quoted strings.
//!
//! This is the only module that scrapes HTML. Callers depend on the
//! [`TalkIdResolver`] trait so another strategy can replace
//! [`PageResolver`] without touching the rest of the client.

use std::sync::LazyLock;

use regex::Regex;
use tracing::info;

use crate::client::ApiClient;
use crate::error::{Error, Result};
use crate::transport::Transport;

/// Resolves a public identifier or page URL to a real `talkId`.
pub trait TalkIdResolver {
    fn resolve(&self, id_or_url: &str) -> Result<String>;
}

/// `setting = {…};`, shortest match, across newlines.
static SETTING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)setting = (\{.*?\});").expect("invalid setting regex"));

/// Expand a bare public id against `template`; anything starting with
/// `http` is already a URL and is returned unchanged.
pub fn page_url(id_or_url: &str, template: &str) -> String {
    if id_or_url.starts_with("http") {
        id_or_url.to_string()
    } else {
        template.replacen("{}", id_or_url, 1)
    }
}

/// Pull the `talkId` out of a public page's HTML.
pub fn extract_talk_id(html: &str) -> Result<String> {
    let block = SETTING_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| Error::Resolution("couldn't find settings block in page".into()))?
        .as_str();

    let setting: serde_yaml::Value = serde_yaml::from_str(block)
        .map_err(|e| Error::Resolution(format!("settings block is not a literal: {e}")))?;

    match setting.get("talkId") {
        Some(serde_yaml::Value::String(id)) if !id.is_empty() => Ok(id.clone()),
        Some(_) => Err(Error::Resolution("`talkId` is not a string".into())),
        None => Err(Error::Resolution("settings block has no `talkId`".into())),
    }
}

/// [`TalkIdResolver`] that downloads the public page and scrapes it.
#[derive(Debug)]
pub struct PageResolver<'a, T> {
    client: &'a ApiClient<T>,
}

impl<'a, T: Transport> PageResolver<'a, T> {
    pub fn new(client: &'a ApiClient<T>) -> Self {
        Self { client }
    }

    /// The page URL that [`resolve`](TalkIdResolver::resolve) will fetch.
    pub fn page_url(&self, id_or_url: &str) -> String {
        page_url(id_or_url, &self.client.config().page_url)
    }
}

impl<T: Transport> TalkIdResolver for PageResolver<'_, T> {
    fn resolve(&self, id_or_url: &str) -> Result<String> {
        let url = self.page_url(id_or_url);
        let html = self.client.fetch_text(&url)?;
        let talk_id = extract_talk_id(&html)?;
        info!(%url, %talk_id, "resolved talkId");
        Ok(talk_id)
    }
}
