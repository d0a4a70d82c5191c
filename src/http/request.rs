use std::fmt;

/// HTTP request methods.
///
/// Represents the HTTP method/verb of a request. These are the verbs the mock
/// server accepts; anything else is rejected with 405 Method Not Allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// POST - Create or submit data
    POST,
    /// PUT - Replace a resource
    PUT,
    /// DELETE - Delete a resource
    DELETE,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// OPTIONS - Describe communication options
    OPTIONS,
    /// PATCH - Partial modification of a resource
    PATCH,
}

/// Represents a parsed HTTP request from a client.
///
/// Contains all information extracted from the HTTP request line and headers.
/// The body field contains any request entity (e.g., for POST/PUT requests).
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// The raw request target as sent by the client (e.g., "/users?page=2")
    pub path: String,
    /// HTTP version (typically "HTTP/1.1")
    pub version: String,
    /// Request headers in the order they were received
    pub headers: Vec<(String, String)>,
    /// Request body for POST/PUT requests
    pub body: Vec<u8>,
}

/// Builder for constructing Request objects.
pub struct RequestBuilder {
    method: Option<Method>,
    path: Option<String>,
    version: Option<String>,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Method {
    /// Parses an HTTP method from a string.
    ///
    /// # Arguments
    ///
    /// * `s` - String representation of the method (case-sensitive, uppercase)
    ///
    /// # Returns
    ///
    /// `Some(Method)` if the string matches a known method, `None` otherwise.
    ///
    /// # Example
    ///
    /// ```
    /// # use httpmocker::http::request::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_str("get"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::GET),
            "POST" => Some(Method::POST),
            "PUT" => Some(Method::PUT),
            "DELETE" => Some(Method::DELETE),
            "HEAD" => Some(Method::HEAD),
            "OPTIONS" => Some(Method::OPTIONS),
            "PATCH" => Some(Method::PATCH),
            _ => None,
        }
    }

    /// The canonical upper-case token, as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::HEAD => "HEAD",
            Method::OPTIONS => "OPTIONS",
            Method::PATCH => "PATCH",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: None,
            path: None,
            version: None,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn build(self) -> Result<Request, &'static str> {
        Ok(Request {
            method: self.method.ok_or("method missing")?,
            path: self.path.ok_or("path missing")?,
            version: self.version.unwrap_or_else(|| "HTTP/1.1".to_string()),
            headers: self.headers,
            body: self.body,
        })
    }
}

impl Request {
    /// Retrieves a header value by name, ignoring ASCII case.
    ///
    /// # Arguments
    ///
    /// * `key` - Header name to look up
    ///
    /// # Returns
    ///
    /// `Some(&str)` with the first matching header value, `None` otherwise.
    pub fn header(&self, key: &str) -> Option<&str> {
        find_header(&self.headers, key)
    }

    /// Determines whether the connection should remain open after the response.
    ///
    /// HTTP/1.1 defaults to keep-alive unless `Connection: close` is sent.
    /// HTTP/1.0 closes unless `Connection: keep-alive` is sent.
    pub fn keep_alive(&self) -> bool {
        match self.header("Connection") {
            Some(v) if v.eq_ignore_ascii_case("close") => false,
            Some(v) if v.eq_ignore_ascii_case("keep-alive") => true,
            _ => self.version != "HTTP/1.0",
        }
    }

    /// The path used for endpoint matching.
    ///
    /// The query string is stripped and an empty path becomes `/`. Absolute-form
    /// targets (`http://host/x`) are reduced to their path. No other
    /// normalization happens: case, trailing slashes and percent-escapes are
    /// left exactly as the client sent them.
    pub fn route_path(&self) -> &str {
        let target = strip_authority(&self.path);
        let path = match target.split_once('?') {
            Some((path, _)) => path,
            None => target,
        };
        if path.is_empty() { "/" } else { path }
    }
}

/// First value for `key` in a header list, ignoring ASCII case.
pub(crate) fn find_header<'a>(headers: &'a [(String, String)], key: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v.as_str())
}

fn strip_authority(target: &str) -> &str {
    let rest = target
        .strip_prefix("http://")
        .or_else(|| target.strip_prefix("https://"));

    match rest {
        Some(rest) => match rest.find(['/', '?']) {
            Some(idx) => &rest[idx..],
            None => "",
        },
        None => target,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(target: &str) -> Request {
        RequestBuilder::new()
            .method(Method::GET)
            .path(target)
            .build()
            .unwrap()
    }

    #[test]
    fn route_path_strips_query() {
        assert_eq!(get("/foo?x=1").route_path(), "/foo");
        assert_eq!(get("/foo?").route_path(), "/foo");
        assert_eq!(get("/foo").route_path(), "/foo");
    }

    #[test]
    fn route_path_defaults_to_root() {
        assert_eq!(get("").route_path(), "/");
        assert_eq!(get("?a=b").route_path(), "/");
    }

    #[test]
    fn route_path_keeps_trailing_slash_and_case() {
        assert_eq!(get("/Foo/").route_path(), "/Foo/");
        assert_eq!(get("/a%20b").route_path(), "/a%20b");
    }

    #[test]
    fn route_path_from_absolute_form() {
        assert_eq!(get("http://localhost:8080/ping?x=1").route_path(), "/ping");
        assert_eq!(get("http://localhost:8080").route_path(), "/");
        assert_eq!(get("http://localhost:8080?x=1").route_path(), "/");
    }

    #[test]
    fn find_header_ignores_case_and_takes_first() {
        let headers = vec![
            ("content-length".to_string(), "2".to_string()),
            ("Content-Length".to_string(), "9".to_string()),
        ];
        assert_eq!(find_header(&headers, "CONTENT-LENGTH"), Some("2"));
        assert_eq!(find_header(&headers, "Transfer-Encoding"), None);
    }

    #[test]
    fn http10_closes_by_default() {
        let req = RequestBuilder::new()
            .method(Method::GET)
            .path("/")
            .version("HTTP/1.0")
            .build()
            .unwrap();
        assert!(!req.keep_alive());
    }
}
