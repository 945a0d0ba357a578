//! Response normalisation.
//!
//! Successful API bodies wrap their payload in a `data` envelope:
//!
//! ```json
//! { "data": [ { "post": { "postId": 42 } }, … ] }
//! { "data": { "talk": { "talkId": "…" }, "user": { … } } }
//! ```
//!
//! [`Response::from_raw`] unwraps that envelope into a [`Payload`] and keeps
//! status, headers and the raw text alongside it in [`ResponseMeta`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::transport::RawResponse;

/// A JSON object as returned by the API.
pub type Record = Map<String, Value>;

/// The unwrapped `data` field.
///
/// Serialises back to exactly the `data` value it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    List(Vec<Record>),
    Dict(Record),
}

/// Transport details kept out of the logical payload, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMeta {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub raw: String,
}

/// A successful, normalised API response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub payload: Payload,
    pub meta: ResponseMeta,
}

impl Response {
    /// Normalise a 2xx response.
    ///
    /// Fails with [`Error::MalformedResponse`] when the body is not JSON, has
    /// no `data` field, or `data` is neither an object nor a list of objects.
    pub fn from_raw(raw: RawResponse) -> Result<Self> {
        let status = raw.status;
        let json: Value = serde_json::from_str(&raw.body)
            .map_err(|e| Error::malformed(status, format!("body is not JSON: {e}")))?;

        let data = match json {
            Value::Object(mut envelope) => envelope
                .remove("data")
                .ok_or_else(|| Error::malformed(status, "missing `data` envelope"))?,
            _ => return Err(Error::malformed(status, "top-level body is not an object")),
        };

        let payload = match data {
            Value::Object(record) => Payload::Dict(record),
            Value::Array(items) => Payload::List(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| match item {
                        Value::Object(record) => Ok(record),
                        _ => Err(Error::malformed(
                            status,
                            format!("`data[{i}]` is not an object"),
                        )),
                    })
                    .collect::<Result<_>>()?,
            ),
            other => {
                return Err(Error::malformed(
                    status,
                    format!("`data` is neither a list nor an object: {other}"),
                ))
            }
        };

        Ok(Self {
            payload,
            meta: ResponseMeta {
                status,
                headers: raw.headers,
                raw: raw.body,
            },
        })
    }

    pub fn as_list(&self) -> Option<&[Record]> {
        match &self.payload {
            Payload::List(records) => Some(records),
            Payload::Dict(_) => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Record> {
        match &self.payload {
            Payload::Dict(record) => Some(record),
            Payload::List(_) => None,
        }
    }

    /// Take the list payload, failing if the server sent an object.
    pub fn into_list(self) -> Result<Vec<Record>> {
        match self.payload {
            Payload::List(records) => Ok(records),
            Payload::Dict(_) => Err(Error::malformed(
                self.meta.status,
                "expected `data` to be a list, got an object",
            )),
        }
    }

    /// Take the object payload, failing if the server sent a list.
    pub fn into_dict(self) -> Result<Record> {
        match self.payload {
            Payload::Dict(record) => Ok(record),
            Payload::List(_) => Err(Error::malformed(
                self.meta.status,
                "expected `data` to be an object, got a list",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(body: &str) -> RawResponse {
        RawResponse {
            status: 200,
            headers: vec![("x-request-id".into(), "abc".into())],
            body: body.into(),
        }
    }

    #[test]
    fn dict_payload_preserves_mapping() {
        let data = json!({ "talkId": "X", "name": "okada-nana", "postCount": 12 });
        let body = json!({ "data": data }).to_string();

        let resp = Response::from_raw(raw(&body)).unwrap();
        let record = resp.as_dict().unwrap();
        assert_eq!(Value::Object(record.clone()), data);
        assert_eq!(serde_json::to_value(&resp.payload).unwrap(), data);
        assert_eq!(record["talkId"], "X");
        assert_eq!(resp.meta.headers[0].1, "abc");
        assert_eq!(resp.meta.raw, body);
    }

    #[test]
    fn list_payload() {
        let body = json!({ "data": [ { "post": { "postId": 2 } }, { "post": { "postId": 1 } } ] })
            .to_string();
        let records = Response::from_raw(raw(&body)).unwrap().into_list().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["post"]["postId"], 1);
    }

    #[test]
    fn non_json_success_is_malformed() {
        let err = Response::from_raw(raw("<html>maintenance</html>")).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse { status: 200, .. }));
    }

    #[test]
    fn missing_or_scalar_data_is_malformed() {
        assert!(matches!(
            Response::from_raw(raw(r#"{"result":1}"#)),
            Err(Error::MalformedResponse { .. })
        ));
        assert!(matches!(
            Response::from_raw(raw(r#"{"data":3}"#)),
            Err(Error::MalformedResponse { .. })
        ));
        assert!(matches!(
            Response::from_raw(raw(r#"{"data":[1,2]}"#)),
            Err(Error::MalformedResponse { .. })
        ));
    }

    #[test]
    fn shape_mismatch_is_malformed() {
        let resp = Response::from_raw(raw(r#"{"data":{"a":1}}"#)).unwrap();
        assert!(resp.as_list().is_none());
        assert!(matches!(
            resp.into_list(),
            Err(Error::MalformedResponse { .. })
        ));
    }
}
