//! Buffered response writer.

use crate::Response;
use bytes::BytesMut;
use http::header::HeaderMap;
use http::StatusCode;
use http_body_util::Full;

/// Collects the status, headers and body produced while serving a request.
///
/// Several handlers write into the same writer when decorators are in play,
/// so the body is append-only and the status can be committed exactly once.
/// The first call to [`write`](Self::write) commits `200 OK` if no status was
/// set before.
#[derive(Debug, Default)]
pub struct ResponseWriter {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: BytesMut,
}

impl ResponseWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Commits the response status.
    ///
    /// Only the first call has an effect. Later calls are logged and ignored.
    pub fn write_header(&mut self, status: StatusCode) {
        match self.status {
            Some(current) => {
                tracing::debug!(
                    current = %current,
                    ignored = %status,
                    "superfluous write_header call"
                );
            }
            None => self.status = Some(status),
        }
    }

    /// Appends bytes to the body and returns how many were written.
    pub fn write(&mut self, data: impl AsRef<[u8]>) -> usize {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        let data = data.as_ref();
        self.body.extend_from_slice(data);
        data.len()
    }

    /// Returns the committed status, if any.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Returns the response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the response headers for modification.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Returns the body written so far.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Finishes the response. An untouched writer yields `200 OK` with an empty body.
    #[must_use]
    pub fn into_response(self) -> Response {
        let mut response = http::Response::new(Full::new(self.body.freeze()));
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = self.headers;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::CONTENT_TYPE;
    use http_body_util::BodyExt;

    #[test]
    fn test_write_commits_ok() {
        let mut writer = ResponseWriter::new();
        assert_eq!(writer.status(), None);

        assert_eq!(writer.write("Hello"), 5);
        assert_eq!(writer.status(), Some(StatusCode::OK));
    }

    #[test]
    fn test_write_header_only_once() {
        let mut writer = ResponseWriter::new();
        writer.write_header(StatusCode::CREATED);
        writer.write_header(StatusCode::BAD_REQUEST);

        assert_eq!(writer.status(), Some(StatusCode::CREATED));
    }

    #[test]
    fn test_write_header_after_body_is_ignored() {
        let mut writer = ResponseWriter::new();
        writer.write("World");
        writer.write_header(StatusCode::NOT_FOUND);

        assert_eq!(writer.status(), Some(StatusCode::OK));
    }

    #[test]
    fn test_body_appends() {
        let mut writer = ResponseWriter::new();
        writer.write("Hello ");
        writer.write(b"World");
        writer.write(String::from("!"));

        assert_eq!(writer.body(), b"Hello World!");
    }

    #[tokio::test]
    async fn test_into_response() {
        let mut writer = ResponseWriter::new();
        writer
            .headers_mut()
            .insert(CONTENT_TYPE, "text/plain".parse().unwrap());
        writer.write_header(StatusCode::ACCEPTED);
        writer.write("queued");

        let response = writer.into_response();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"queued");
    }

    #[test]
    fn test_untouched_writer_is_empty_ok() {
        let response = ResponseWriter::new().into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
