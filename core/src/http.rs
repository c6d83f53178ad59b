//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. `MatzipClient` builds `HttpRequest`
//! values and parses `HttpResponse` values; whoever executes the request (the
//! bundled `UreqTransport` or a caller's own stack) owns the network.
//!
//! File-bearing endpoints carry a `MultipartForm` instead of a JSON string.
//! The form keeps its boundary so the encoded bytes are reproducible.

use uuid::Uuid;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// A file attached to a multipart request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: &str, content_type: &str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            bytes,
        }
    }
}

/// Value of a single multipart field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartValue {
    Text(String),
    File(Upload),
}

/// `multipart/form-data` body. Fields keep insertion order and names may
/// repeat (`images`, `oldUrls`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartForm {
    boundary: String,
    parts: Vec<(String, PartValue)>,
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::with_boundary(&format!("matzip-{}", Uuid::new_v4().simple()))
    }

    pub fn with_boundary(boundary: &str) -> Self {
        Self {
            boundary: boundary.to_string(),
            parts: Vec::new(),
        }
    }

    pub fn text(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.parts.push((name.to_string(), PartValue::Text(value.into())));
        self
    }

    pub fn file(&mut self, name: &str, upload: Upload) -> &mut Self {
        self.parts.push((name.to_string(), PartValue::File(upload)));
        self
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn parts(&self) -> &[(String, PartValue)] {
        &self.parts
    }

    /// Text values of every field named `name`, in insertion order.
    pub fn texts(&self, name: &str) -> Vec<&str> {
        self.parts
            .iter()
            .filter(|(n, _)| n == name)
            .filter_map(|(_, value)| match value {
                PartValue::Text(text) => Some(text.as_str()),
                PartValue::File(_) => None,
            })
            .collect()
    }

    /// Uploads attached under `name`, in insertion order.
    pub fn files(&self, name: &str) -> Vec<&Upload> {
        self.parts
            .iter()
            .filter(|(n, _)| n == name)
            .filter_map(|(_, value)| match value {
                PartValue::File(upload) => Some(upload),
                PartValue::Text(_) => None,
            })
            .collect()
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Encode the form as an RFC 7578 body.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (name, value) in &self.parts {
            out.extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
            match value {
                PartValue::Text(text) => {
                    out.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", escape_quoted(name))
                            .as_bytes(),
                    );
                    out.extend_from_slice(text.as_bytes());
                }
                PartValue::File(upload) => {
                    out.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                            escape_quoted(name),
                            escape_quoted(&upload.file_name),
                            upload.content_type
                        )
                        .as_bytes(),
                    );
                    out.extend_from_slice(&upload.bytes);
                }
            }
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        out
    }
}

fn escape_quoted(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Request payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Json(String),
    Multipart(MultipartForm),
}

impl Body {
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Body::Json(json) => json.as_bytes().to_vec(),
            Body::Multipart(form) => form.encode(),
        }
    }

    pub fn as_json(&self) -> Option<&str> {
        match self {
            Body::Json(json) => Some(json),
            Body::Multipart(_) => None,
        }
    }

    pub fn as_multipart(&self) -> Option<&MultipartForm> {
        match self {
            Body::Multipart(form) => Some(form),
            Body::Json(_) => None,
        }
    }
}

/// An HTTP request described as plain data.
///
/// Built by `MatzipClient::build_*`. `url` is absolute and already carries
/// the query string. Multipart bodies get their `Content-Type` from the form
/// at execution time, mirroring how browsers fill it in for form data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Body>,
}

impl HttpRequest {
    /// First header value matching `name`, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// The URL without its query string.
    pub fn path(&self) -> &str {
        self.url.split('?').next().unwrap_or(&self.url)
    }

    /// The raw query string, if any.
    pub fn query(&self) -> Option<&str> {
        self.url.split_once('?').map(|(_, query)| query)
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}
