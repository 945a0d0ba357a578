//! User accessor.

use serde_json::Value;
use tracing::warn;

use crate::client::ApiClient;
use crate::error::{Error, Result};
use crate::request::{Endpoint, Request, NO_PARAMS};
use crate::response::{Record, Response};
use crate::transport::{HttpTransport, Transport};

/// The API caps `followTalks` pages at this many entries.
pub const FOLLOWING_LIMIT: u32 = 500;

/// A user, addressed by `userId`.
///
/// Like [`Talk`](crate::Talk), the info record is cached per instance until
/// [`flush`](User::flush).
#[derive(Debug)]
pub struct User<'a, T = HttpTransport> {
    client: &'a ApiClient<T>,
    user_id: String,
    info: Option<Record>,
}

impl<'a, T: Transport> User<'a, T> {
    pub fn new(client: &'a ApiClient<T>, user_id: impl Into<String>) -> Self {
        Self {
            client,
            user_id: user_id.into(),
            info: None,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// `users/{id}`, fetched on first use.
    pub fn info(&mut self) -> Result<&Record> {
        let info = match self.info.take() {
            Some(info) => info,
            None => self
                .client
                .get(Endpoint::User(&self.user_id), NO_PARAMS)?
                .into_dict()?,
        };
        Ok(self.info.insert(info))
    }

    pub fn flush(&mut self) {
        self.info = None;
    }

    /// `users/{id}/mainTalk`.
    pub fn main_talk(&self) -> Result<Response> {
        self.client
            .get(Endpoint::UserMainTalk(&self.user_id), NO_PARAMS)
    }

    /// `users/{id}/groupTalks`.
    pub fn group_talks(&self) -> Result<Response> {
        self.client
            .get(Endpoint::UserGroupTalks(&self.user_id), NO_PARAMS)
    }

    /// `users/{id}/ownerTalks`.
    pub fn owner_talks(&self) -> Result<Response> {
        self.client
            .get(Endpoint::UserOwnerTalks(&self.user_id), NO_PARAMS)
    }

    /// Talks this user follows.
    ///
    /// Only the first [`FOLLOWING_LIMIT`] entries are returned; a warning is
    /// logged when the server reports more.
    pub fn following(&self) -> Result<Vec<Record>> {
        let request =
            Request::get(Endpoint::UserFollowTalks(&self.user_id)).param("limit", FOLLOWING_LIMIT);
        let response = self.client.execute(&request)?;
        let status = response.meta.status;
        let data = response.into_dict()?;

        if data.get("nextExisted").is_some_and(is_truthy) {
            warn!(user_id = %self.user_id, "followTalks has more than {FOLLOWING_LIMIT} entries; truncated");
        }

        match data.get("talk") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_object()
                        .cloned()
                        .ok_or_else(|| Error::malformed(status, "`talk` entry is not an object"))
                })
                .collect(),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(_) => Err(Error::malformed(status, "`talk` is not a list")),
        }
    }
}

fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{client, ScriptedTransport};
    use serde_json::json;

    #[test]
    fn info_is_cached_until_flush() {
        let transport = ScriptedTransport::new();
        transport.push_json(200, json!({ "data": { "userId": "u1", "name": "Okada" } }));
        transport.push_json(200, json!({ "data": { "userId": "u1", "name": "Nana" } }));
        let client = client(transport);

        let mut user = client.user("u1");
        assert_eq!(user.info().unwrap()["name"], "Okada");
        assert_eq!(user.info().unwrap()["name"], "Okada");
        user.flush();
        assert_eq!(user.info().unwrap()["name"], "Nana");

        let sent = client.transport().requests();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, "https://7gogo.jp/api/users/u1");
    }

    #[test]
    fn talk_listings_hit_their_endpoints() {
        let transport = ScriptedTransport::new();
        transport.push_json(200, json!({ "data": { "talkId": "main" } }));
        transport.push_json(200, json!({ "data": [] }));
        transport.push_json(200, json!({ "data": [ { "talkId": "owned" } ] }));
        let client = client(transport);

        let user = client.user("u1");
        assert_eq!(user.main_talk().unwrap().as_dict().unwrap()["talkId"], "main");
        assert!(user.group_talks().unwrap().as_list().unwrap().is_empty());
        assert_eq!(user.owner_talks().unwrap().as_list().unwrap().len(), 1);

        let urls: Vec<String> = client
            .transport()
            .requests()
            .into_iter()
            .map(|(url, _)| url)
            .collect();
        assert_eq!(
            urls,
            vec![
                "https://7gogo.jp/api/users/u1/mainTalk",
                "https://7gogo.jp/api/users/u1/groupTalks",
                "https://7gogo.jp/api/users/u1/ownerTalks",
            ]
        );
    }

    #[test]
    fn following_returns_talk_list() {
        let transport = ScriptedTransport::new();
        transport.push_json(
            200,
            json!({ "data": { "talk": [ { "talkId": "a" }, { "talkId": "b" } ], "nextExisted": [] } }),
        );
        let client = client(transport);

        let following = client.user("u1").following().unwrap();
        assert_eq!(following.len(), 2);
        assert_eq!(following[1]["talkId"], "b");
        assert_eq!(
            client.transport().requests()[0].1.param_value("limit"),
            Some("500")
        );
    }

    #[test]
    fn following_tolerates_truncation_flag() {
        let transport = ScriptedTransport::new();
        transport.push_json(
            200,
            json!({ "data": { "talk": [ { "talkId": "a" } ], "nextExisted": true } }),
        );
        let client = client(transport);
        assert_eq!(client.user("u1").following().unwrap().len(), 1);
    }

    #[test]
    fn truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!([])));
        assert!(!is_truthy(&json!(false)));
        assert!(is_truthy(&json!([1])));
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!("x")));
    }
}
