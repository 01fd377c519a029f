use bytes::Bytes;
use reqwest::StatusCode;

/// A proxy API response reduced to what checks need: the status code and the
/// raw body.
///
/// The body is only decoded when a check asks about it, and a body that is
/// not valid JSON answers those checks with `None` rather than an error. A
/// misbehaving target must show up as failed checks, never as a crashed
/// agent.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    body: Bytes,
}

impl ApiResponse {
    pub(crate) fn new(status: StatusCode, body: Bytes) -> Self {
        Self { status, body }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn status_is(&self, code: u16) -> bool {
        self.status.as_u16() == code
    }

    pub fn status_in(&self, codes: &[u16]) -> bool {
        codes.contains(&self.status.as_u16())
    }

    /// Look up a top-level field in the JSON body. `None` when the body is
    /// not a JSON object or the field is missing.
    pub fn json_field(&self, name: &str) -> Option<serde_json::Value> {
        serde_json::from_slice::<serde_json::Value>(&self.body)
            .ok()?
            .get(name)
            .cloned()
    }

    pub fn json_field_str(&self, name: &str) -> Option<String> {
        self.json_field(name)?.as_str().map(str::to_string)
    }

    pub fn has_json_field(&self, name: &str) -> bool {
        self.json_field(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> ApiResponse {
        ApiResponse::new(
            StatusCode::from_u16(status).unwrap(),
            Bytes::copy_from_slice(body.as_bytes()),
        )
    }

    #[test]
    fn status_helpers() {
        let accepted = response(202, "{}");

        assert!(accepted.status_is(202));
        assert!(!accepted.status_is(200));
        assert!(accepted.status_in(&[200, 202]));
        assert!(!response(404, "not found").status_in(&[200, 202]));
    }

    #[test]
    fn fields_are_read_from_json_objects() {
        let body = response(200, r#"{"request_id": "req-123", "status": "queued"}"#);

        assert!(body.has_json_field("request_id"));
        assert_eq!(body.json_field_str("request_id").as_deref(), Some("req-123"));
        assert!(!body.has_json_field("missing"));
    }

    #[test]
    fn invalid_json_fails_field_checks_without_panicking() {
        let body = response(200, "<html>502 Bad Gateway</html>");

        assert!(!body.has_json_field("status"));
        assert_eq!(body.json_field_str("status"), None);
    }

    #[test]
    fn non_object_json_has_no_fields() {
        assert!(!response(200, "[1, 2, 3]").has_json_field("status"));
        assert!(!response(200, "\"ok\"").has_json_field("status"));
    }

    #[test]
    fn non_string_fields_are_present_but_not_strings() {
        let body = response(200, r#"{"request_id": 17}"#);

        assert!(body.has_json_field("request_id"));
        assert_eq!(body.json_field_str("request_id"), None);
    }
}
