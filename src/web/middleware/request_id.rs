use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use uuid::Uuid;

/// Correlation id of the current request, stored in the request extensions
#[derive(Debug, Clone)]
pub struct CorrelationId(pub String);

/// Reuse the caller's correlation id when it looks sane, otherwise mint one,
/// and echo it back on the response
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let correlation_id = get_or_generate_correlation_id(request.headers());

    request
        .extensions_mut()
        .insert(CorrelationId(correlation_id.clone()));

    tracing::Span::current().record("correlation_id", correlation_id.as_str());

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        response.headers_mut().insert("x-correlation-id", value.clone());
        response.headers_mut().insert("x-request-id", value);
    }

    response
}

fn get_or_generate_correlation_id(headers: &axum::http::HeaderMap) -> String {
    headers
        .get("x-correlation-id")
        .or_else(|| headers.get("x-request-id"))
        .and_then(|value| value.to_str().ok())
        .filter(|id| is_valid_correlation_id(id))
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// UUIDs, or 8 to 64 characters of `[A-Za-z0-9_-]`
fn is_valid_correlation_id(id: &str) -> bool {
    if Uuid::parse_str(id).is_ok() {
        return true;
    }

    (8..=64).contains(&id.len())
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;

    #[test]
    fn test_valid_correlation_id() {
        assert!(is_valid_correlation_id("550e8400-e29b-41d4-a716-446655440000"));
        assert!(is_valid_correlation_id("request_12345"));
    }

    #[test]
    fn test_invalid_correlation_id() {
        assert!(!is_valid_correlation_id(""));
        assert!(!is_valid_correlation_id("short"));
        assert!(!is_valid_correlation_id(&"a".repeat(65)));
        assert!(!is_valid_correlation_id("invalid id!"));
    }

    #[test]
    fn test_existing_correlation_id_is_kept() {
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", "client-req-0001".parse().unwrap());

        assert_eq!(get_or_generate_correlation_id(&headers), "client-req-0001");
    }

    #[test]
    fn test_correlation_id_generated_when_absent() {
        let id = get_or_generate_correlation_id(&HeaderMap::new());
        assert!(Uuid::parse_str(&id).is_ok());
    }
}
