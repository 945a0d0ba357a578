//! The API client.

use serde_json::Value;
use tracing::debug;

use crate::api_error;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::request::{Request, Target};
use crate::resolve::PageResolver;
use crate::response::Response;
use crate::talk::Talk;
use crate::transport::{HttpTransport, RawResponse, Transport};
use crate::user::User;

/// Client for the 7gogo JSON API.
///
/// Owns the [`Transport`] (and with it the pooled HTTP session) and the
/// [`ClientConfig`]. Accessors such as [`Talk`] and [`User`] borrow the
/// client, so one client serves any number of them.
///
/// All calls block until the server answers or the request fails. Nothing is
/// retried.
#[derive(Debug)]
pub struct ApiClient<T = HttpTransport> {
    transport: T,
    config: ClientConfig,
}

impl ApiClient<HttpTransport> {
    /// Client against the public API with default settings.
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Client with a custom configuration.
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self { transport, config })
    }
}

impl<T: Transport> ApiClient<T> {
    /// Client over an arbitrary transport.
    pub fn with_transport(transport: T, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send `request` and normalise the `data` envelope of the reply.
    pub fn execute(&self, request: &Request) -> Result<Response> {
        Response::from_raw(self.send(request)?)
    }

    /// `GET` an API path with stringified query parameters.
    pub fn get<K, V>(
        &self,
        path: impl Into<Target>,
        params: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Response>
    where
        K: Into<String>,
        V: ToString,
    {
        let request = params
            .into_iter()
            .fold(Request::get(path), |req, (k, v)| req.param(k, v));
        self.execute(&request)
    }

    /// `POST` to an API path with query parameters and an optional JSON body.
    pub fn post<K, V>(
        &self,
        path: impl Into<Target>,
        params: impl IntoIterator<Item = (K, V)>,
        body: Option<Value>,
    ) -> Result<Response>
    where
        K: Into<String>,
        V: ToString,
    {
        let mut request = params
            .into_iter()
            .fold(Request::post(path), |req, (k, v)| req.param(k, v));
        request.body = body;
        self.execute(&request)
    }

    /// `GET` a literal URL and return the body text unparsed.
    ///
    /// Used for HTML pages. Non-2xx statuses go through the same error
    /// extraction as API calls.
    pub fn fetch_text(&self, url: &str) -> Result<String> {
        let raw = self.send(&Request::get(Target::Url(url.to_string())))?;
        Ok(raw.body)
    }

    /// Accessor for the talk with the given real `talkId`.
    pub fn talk(&self, talk_id: impl Into<String>) -> Talk<'_, T> {
        Talk::new(self, talk_id)
    }

    /// Accessor for the user with the given `userId`.
    pub fn user(&self, user_id: impl Into<String>) -> User<'_, T> {
        User::new(self, user_id)
    }

    /// Resolver that scrapes public talk pages for their `talkId`.
    pub fn resolver(&self) -> PageResolver<'_, T> {
        PageResolver::new(self)
    }

    fn send(&self, request: &Request) -> Result<RawResponse> {
        let url = request.url(&self.config.api_url);
        debug!(method = %request.method, %url, params = ?request.params, "request");

        let raw = self.transport.send(&url, request)?;
        if !raw.is_success() {
            debug!(status = raw.status, %url, "request failed");
            return Err(api_error::extract(raw.status, &raw.body));
        }
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::request::{Endpoint, Method};
    use crate::testing::{client, ScriptedTransport};
    use serde_json::json;

    #[test]
    fn get_renders_url_and_stringifies_params() {
        let transport = ScriptedTransport::new();
        transport.push_json(200, json!({ "data": { "ok": true } }));
        let client = client(transport);

        let resp = client
            .get(Endpoint::TalkPosts("okada-nana"), [("limit", 30)])
            .unwrap();
        assert_eq!(resp.as_dict().unwrap()["ok"], true);

        let sent = client.transport().requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "https://7gogo.jp/api/talks/okada-nana/posts");
        assert_eq!(sent[0].1.method, Method::Get);
        assert_eq!(sent[0].1.param_value("limit"), Some("30"));
    }

    #[test]
    fn post_carries_body() {
        let transport = ScriptedTransport::new();
        transport.push_json(200, json!({ "data": [] }));
        let client = client(transport);

        client
            .post(Endpoint::TalkInfo, [("talkIds", "a")], Some(json!({ "x": 1 })))
            .unwrap();

        let sent = client.transport().requests();
        assert_eq!(sent[0].1.method, Method::Post);
        assert_eq!(sent[0].1.body, Some(json!({ "x": 1 })));
    }

    #[test]
    fn error_status_is_extracted() {
        let transport = ScriptedTransport::new();
        transport.push_json(
            404,
            json!({ "error": { "code": 40401, "message": "トークが見つかりません" } }),
        );
        let client = client(transport);

        match client.get(Endpoint::Talk("missing"), [("a", "b")]) {
            Err(Error::Api(e)) => {
                assert_eq!(e.status, 404);
                assert_eq!(e.code, 40401);
            }
            other => panic!("expected Error::Api, got {other:?}"),
        }
    }

    #[test]
    fn transport_failure_is_not_retried() {
        let transport = ScriptedTransport::new();
        transport.push_error(Error::Transport {
            status: 599,
            body: "connection reset".into(),
        });
        transport.push_json(200, json!({ "data": {} }));
        let client = client(transport);

        assert!(client.get(Endpoint::Talk("t"), crate::NO_PARAMS).is_err());
        assert_eq!(client.transport().requests().len(), 1);
        assert_eq!(client.transport().remaining(), 1);
    }

    #[test]
    fn fetch_text_returns_body_verbatim() {
        let transport = ScriptedTransport::new();
        transport.push_text(200, "<html>page</html>");
        let client = client(transport);

        let html = client.fetch_text("http://7gogo.jp/lp/abc").unwrap();
        assert_eq!(html, "<html>page</html>");
        assert_eq!(client.transport().requests()[0].0, "http://7gogo.jp/lp/abc");
    }
}
