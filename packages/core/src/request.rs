//! Request construction: API paths, the endpoint table, and [`Request`].

use std::fmt;

use serde_json::Value;

/// HTTP method of a [`Request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

// ---------------------------------------------------------------------------
// ApiPath
// ---------------------------------------------------------------------------

/// An ordered list of path segments below the API root.
///
/// ```
/// use nanagogo::ApiPath;
///
/// let path = ApiPath::root().push("talks").push("okada-nana").push("posts");
/// assert_eq!(path.to_string(), "talks/okada-nana/posts");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiPath {
    segments: Vec<String>,
}

impl ApiPath {
    /// The empty path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Append one segment.
    pub fn push(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Substitute the joined path into `template`'s `{}` placeholder.
    pub fn render(&self, template: &str) -> String {
        template.replacen("{}", &self.segments.join("/"), 1)
    }
}

impl fmt::Display for ApiPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl<S: Into<String>> FromIterator<S> for ApiPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().map(Into::into).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Endpoint
// ---------------------------------------------------------------------------

/// Known API endpoints.
///
/// | Variant | Path |
/// |---------|------|
/// | `User(id)` | `users/{id}` |
/// | `UserMainTalk(id)` | `users/{id}/mainTalk` |
/// | `UserGroupTalks(id)` | `users/{id}/groupTalks` |
/// | `UserOwnerTalks(id)` | `users/{id}/ownerTalks` |
/// | `UserFollowTalks(id)` | `users/{id}/followTalks` |
/// | `Talk(id)` | `talks/{id}` |
/// | `TalkPosts(id)` | `talks/{id}/posts` |
/// | `TalkInfo` | `talk/info` (batch, `?talkIds=a,b,…`) |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint<'a> {
    User(&'a str),
    UserMainTalk(&'a str),
    UserGroupTalks(&'a str),
    UserOwnerTalks(&'a str),
    UserFollowTalks(&'a str),
    Talk(&'a str),
    TalkPosts(&'a str),
    TalkInfo,
}

impl Endpoint<'_> {
    pub fn path(&self) -> ApiPath {
        let root = ApiPath::root();
        match *self {
            Endpoint::User(id) => root.push("users").push(id),
            Endpoint::UserMainTalk(id) => root.push("users").push(id).push("mainTalk"),
            Endpoint::UserGroupTalks(id) => root.push("users").push(id).push("groupTalks"),
            Endpoint::UserOwnerTalks(id) => root.push("users").push(id).push("ownerTalks"),
            Endpoint::UserFollowTalks(id) => root.push("users").push(id).push("followTalks"),
            Endpoint::Talk(id) => root.push("talks").push(id),
            Endpoint::TalkPosts(id) => root.push("talks").push(id).push("posts"),
            Endpoint::TalkInfo => root.push("talk").push("info"),
        }
    }
}

/// Empty parameter list for [`ApiClient::get`](crate::ApiClient::get).
pub const NO_PARAMS: [(&str, &str); 0] = [];

// ---------------------------------------------------------------------------
// Target / Request
// ---------------------------------------------------------------------------

/// Where a request goes: a path under the API template, or a literal URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Api(ApiPath),
    Url(String),
}

impl From<ApiPath> for Target {
    fn from(path: ApiPath) -> Self {
        Target::Api(path)
    }
}

impl From<Endpoint<'_>> for Target {
    fn from(endpoint: Endpoint<'_>) -> Self {
        Target::Api(endpoint.path())
    }
}

/// A single API call. Built fresh for every call and never reused.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub target: Target,
    /// Query parameters, already stringified, in insertion order.
    pub params: Vec<(String, String)>,
    /// Optional JSON body (POST only).
    pub body: Option<Value>,
}

impl Request {
    pub fn new(method: Method, target: impl Into<Target>) -> Self {
        Self {
            method,
            target: target.into(),
            params: Vec::new(),
            body: None,
        }
    }

    pub fn get(target: impl Into<Target>) -> Self {
        Self::new(Method::Get, target)
    }

    pub fn post(target: impl Into<Target>) -> Self {
        Self::new(Method::Post, target)
    }

    /// Add a query parameter. The value is converted to a string here, so
    /// numbers and strings are sent identically.
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    /// Add a query parameter only when `value` is `Some`.
    pub fn param_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.param(key, v),
            None => self,
        }
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Value of the first query parameter named `key`.
    pub fn param_value(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Full URL without query string, given the API URL template.
    pub fn url(&self, api_template: &str) -> String {
        match &self.target {
            Target::Api(path) => path.render(api_template),
            Target::Url(url) => url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::API_URL_TEMPLATE;

    #[test]
    fn endpoint_paths() {
        assert_eq!(Endpoint::Talk("okada-nana").path().to_string(), "talks/okada-nana");
        assert_eq!(
            Endpoint::TalkPosts("okada-nana").path().to_string(),
            "talks/okada-nana/posts"
        );
        assert_eq!(
            Endpoint::UserFollowTalks("u1").path().to_string(),
            "users/u1/followTalks"
        );
        assert_eq!(Endpoint::TalkInfo.path().to_string(), "talk/info");
    }

    #[test]
    fn url_substitutes_template() {
        let req = Request::get(Endpoint::Talk("MqsG1FLTi-_9GtN76wEuUm=="));
        assert_eq!(
            req.url(API_URL_TEMPLATE),
            "https://7gogo.jp/api/talks/MqsG1FLTi-_9GtN76wEuUm=="
        );

        let literal = Request::get(Target::Url("http://7gogo.jp/lp/abc".into()));
        assert_eq!(literal.url(API_URL_TEMPLATE), "http://7gogo.jp/lp/abc");
    }

    #[test]
    fn params_are_stringified_in_order() {
        let req = Request::get(Endpoint::TalkPosts("t"))
            .param("limit", 30)
            .param_opt("targetId", None::<i64>)
            .param("direction", "PREV");
        assert_eq!(
            req.params,
            vec![
                ("limit".to_string(), "30".to_string()),
                ("direction".to_string(), "PREV".to_string()),
            ]
        );
        assert_eq!(req.param_value("limit"), Some("30"));
        assert_eq!(req.param_value("targetId"), None);
    }

    #[test]
    fn path_from_iterator() {
        let path: ApiPath = ["users", "u1", "mainTalk"].into_iter().collect();
        assert_eq!(path, Endpoint::UserMainTalk("u1").path());
    }
}
