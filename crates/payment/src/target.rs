//! The request under test and the captured responses to it.

use crate::PaymentError;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Method, StatusCode, Url, Version,
};

/// A fully validated request description.
///
/// Built once from user input; every phase re-issues the same request.
#[derive(Debug, Clone)]
pub struct EndpointTarget {
    url: Url,
    method: Method,
    body: Option<String>,
    headers: HeaderMap,
}

impl EndpointTarget {
    /// Validate user input into a target.
    ///
    /// `headers` are `Key: Value` lines; a later line replaces an earlier one
    /// with the same key.
    pub fn new(url: &str, method: &str, body: Option<String>, headers: &[String]) -> Result<Self, PaymentError> {
        let url = Url::parse(url).map_err(|e| PaymentError::InvalidTarget(format!("{url}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(PaymentError::InvalidTarget(format!(
                "unsupported scheme {}",
                url.scheme()
            )));
        }

        let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
            .map_err(|_| PaymentError::InvalidTarget(format!("invalid method {method}")))?;

        let mut map = HeaderMap::new();
        for line in headers {
            let (name, value) = parse_header(line)?;
            map.insert(name, value);
        }

        Ok(Self {
            url,
            method,
            body: body.filter(|b| !b.is_empty()),
            headers: map,
        })
    }

    pub const fn url(&self) -> &Url {
        &self.url
    }

    pub const fn method(&self) -> &Method {
        &self.method
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Start a request for this target on `client`.
    pub fn request(&self, client: &reqwest::Client) -> reqwest::RequestBuilder {
        let builder = client
            .request(self.method.clone(), self.url.clone())
            .headers(self.headers.clone());

        match &self.body {
            Some(body) => builder.body(body.clone()),
            None => builder,
        }
    }
}

/// Parse a `Key: Value` header line.
pub fn parse_header(line: &str) -> Result<(HeaderName, HeaderValue), PaymentError> {
    let (name, value) = line
        .split_once(':')
        .ok_or_else(|| PaymentError::InvalidTarget(format!("header {line:?} is not 'Key: Value'")))?;

    let name = HeaderName::from_bytes(name.trim().as_bytes())
        .map_err(|_| PaymentError::InvalidTarget(format!("invalid header name {:?}", name.trim())))?;
    let value = HeaderValue::from_str(value.trim())
        .map_err(|_| PaymentError::InvalidTarget(format!("invalid value for header {name}")))?;

    Ok((name, value))
}

/// A response read to completion.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub version: Version,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Reply {
    pub async fn read(response: reqwest::Response) -> Result<Self, PaymentError> {
        let status = response.status();
        let version = response.version();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        Ok(Self {
            status,
            version,
            headers,
            body,
        })
    }

    /// Body as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Header value if present and valid ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_from_input() {
        let target = EndpointTarget::new(
            "https://api.example.com/ask",
            "post",
            Some(r#"{"query":"hello"}"#.to_string()),
            &["Content-Type: application/json".to_string(), "X-Trace:  abc ".to_string()],
        )
        .unwrap();

        assert_eq!(*target.method(), Method::POST);
        assert_eq!(target.url().host_str(), Some("api.example.com"));
        assert_eq!(target.body(), Some(r#"{"query":"hello"}"#));
        assert_eq!(target.headers()["content-type"], "application/json");
        assert_eq!(target.headers()["x-trace"], "abc");
    }

    #[test]
    fn test_later_header_replaces_earlier() {
        let target = EndpointTarget::new(
            "http://localhost/",
            "GET",
            None,
            &["Accept: text/plain".to_string(), "accept: application/json".to_string()],
        )
        .unwrap();

        assert_eq!(target.headers().get_all("accept").iter().count(), 1);
        assert_eq!(target.headers()["accept"], "application/json");
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(matches!(
            EndpointTarget::new("not a url", "GET", None, &[]),
            Err(PaymentError::InvalidTarget(_))
        ));
        assert!(matches!(
            EndpointTarget::new("ftp://example.com/file", "GET", None, &[]),
            Err(PaymentError::InvalidTarget(_))
        ));
    }

    #[test]
    fn test_invalid_method_and_header_rejected() {
        assert!(EndpointTarget::new("http://localhost/", "GE T", None, &[]).is_err());
        assert!(EndpointTarget::new("http://localhost/", "GET", None, &["NoColon".to_string()]).is_err());
        assert!(EndpointTarget::new("http://localhost/", "GET", None, &["Bad Name: x".to_string()]).is_err());
    }

    #[test]
    fn test_empty_body_dropped() {
        let target = EndpointTarget::new("http://localhost/", "GET", Some(String::new()), &[]).unwrap();
        assert!(target.body().is_none());
    }
}
