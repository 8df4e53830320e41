//! Classification of RDAP responses into a tri-state status.
//!
//! Some registries answer HTTP 200 with a minimal or `null` RDAP object for
//! names they do not hold, and only an embedded `errorCode` tells "not found"
//! apart from "found but sparse". A 200 is therefore `registered` unless the
//! body carries `errorCode: 404`.

use crate::types::AvailabilityStatus;
use serde_json::Value;

/// The RDAP `errorCode` meaning "object not found".
const NOT_FOUND: u16 = 404;

/// Outcome of interpreting one HTTP response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interpretation {
    pub status: AvailabilityStatus,
    pub error_code: Option<u16>,
}

impl Interpretation {
    fn new(status: AvailabilityStatus, error_code: Option<u16>) -> Self {
        Self { status, error_code }
    }
}

/// Map an HTTP status and an optional parsed body to a status.
///
/// `body` is `None` when the response had no body or it was not JSON.
/// A literal JSON `null` is a present body.
pub fn interpret(http_status: u16, body: Option<&Value>) -> Interpretation {
    let embedded = body.and_then(embedded_error_code);

    match (http_status, body) {
        (200, Some(_)) => {
            if embedded == Some(NOT_FOUND) {
                Interpretation::new(AvailabilityStatus::Available, Some(NOT_FOUND))
            } else {
                Interpretation::new(AvailabilityStatus::Registered, embedded)
            }
        }
        (NOT_FOUND, _) => Interpretation::new(AvailabilityStatus::Available, Some(NOT_FOUND)),
        _ if embedded == Some(NOT_FOUND) => {
            Interpretation::new(AvailabilityStatus::Available, Some(NOT_FOUND))
        }
        _ => Interpretation::new(AvailabilityStatus::Unknown, embedded),
    }
}

/// Read the `errorCode` member of an RDAP body.
///
/// Accepts a JSON number or a numeric string; anything else is ignored.
pub fn embedded_error_code(body: &Value) -> Option<u16> {
    match body.get("errorCode")? {
        Value::Number(n) => n.as_u64().and_then(|code| u16::try_from(code).ok()),
        Value::String(s) => s.trim().parse::<u16>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ok_with_empty_object_is_registered() {
        let result = interpret(200, Some(&json!({})));
        assert_eq!(result.status, AvailabilityStatus::Registered);
        assert_eq!(result.error_code, None);
    }

    #[test]
    fn test_ok_with_null_body_is_registered() {
        let result = interpret(200, Some(&Value::Null));
        assert_eq!(result.status, AvailabilityStatus::Registered);
    }

    #[test]
    fn test_ok_with_embedded_404_is_available() {
        let result = interpret(200, Some(&json!({"errorCode": 404})));
        assert_eq!(result.status, AvailabilityStatus::Available);
        assert_eq!(result.error_code, Some(404));
    }

    #[test]
    fn test_ok_without_body_is_unknown() {
        let result = interpret(200, None);
        assert_eq!(result.status, AvailabilityStatus::Unknown);
    }

    #[test]
    fn test_not_found_is_available_regardless_of_body() {
        assert_eq!(
            interpret(404, None),
            Interpretation::new(AvailabilityStatus::Available, Some(404))
        );
        assert_eq!(
            interpret(404, Some(&json!({"errorCode": 500}))),
            Interpretation::new(AvailabilityStatus::Available, Some(404))
        );
    }

    #[test]
    fn test_server_error_is_unknown() {
        let result = interpret(500, Some(&json!({})));
        assert_eq!(result.status, AvailabilityStatus::Unknown);
        assert_eq!(result.error_code, None);
    }

    #[test]
    fn test_other_status_with_embedded_404_is_available() {
        let result = interpret(400, Some(&json!({"errorCode": 404, "title": "Not Found"})));
        assert_eq!(result.status, AvailabilityStatus::Available);
        assert_eq!(result.error_code, Some(404));
    }

    #[test]
    fn test_unknown_carries_embedded_code() {
        let result = interpret(429, Some(&json!({"errorCode": 429})));
        assert_eq!(result.status, AvailabilityStatus::Unknown);
        assert_eq!(result.error_code, Some(429));
    }

    #[test]
    fn test_embedded_error_code_forms() {
        assert_eq!(embedded_error_code(&json!({"errorCode": 404})), Some(404));
        assert_eq!(embedded_error_code(&json!({"errorCode": "404"})), Some(404));
        assert_eq!(embedded_error_code(&json!({"errorCode": true})), None);
        assert_eq!(embedded_error_code(&json!({"errorCode": 70000})), None);
        assert_eq!(embedded_error_code(&json!([1, 2, 3])), None);
        assert_eq!(embedded_error_code(&Value::Null), None);
    }
}
