use crate::error::EstateError;

pub fn exit_code_for_error(err: &EstateError) -> i32 {
    match err {
        EstateError::InvalidUrl(_) => 3,
        EstateError::Config(_) => 2,
        EstateError::Auth(_) | EstateError::RefreshFailed(_) => 94,
        EstateError::Api { status, .. } => api_exit_code(*status),
        EstateError::Io(_) => 23,
        EstateError::Json(_) => 26,
        EstateError::NotReady | EstateError::Busy => 75,
        EstateError::Unsupported(_) => 4,
        EstateError::Http(err) => http_exit_code(err),
    }
}

fn http_exit_code(err: &reqwest::Error) -> i32 {
    if err.is_timeout() {
        return 28;
    }
    if err.is_connect() {
        return 7;
    }
    if err.is_decode() {
        return 26;
    }
    if err.is_request() {
        return 2;
    }
    43
}

fn api_exit_code(status: u16) -> i32 {
    match status {
        401 | 403 => 94,
        404 => 22,
        400..=499 => 22,
        _ => 52,
    }
}

#[cfg(test)]
mod tests {
    use super::exit_code_for_error;
    use crate::error::{EstateError, RefreshFailure};

    #[test]
    fn exit_code_maps_invalid_url() {
        let err = EstateError::InvalidUrl("bad".to_string());
        assert_eq!(exit_code_for_error(&err), 3);
    }

    #[test]
    fn exit_code_maps_expired_session() {
        let err = EstateError::RefreshFailed(RefreshFailure::new(Some(500), "down"));
        assert_eq!(exit_code_for_error(&err), 94);
    }

    #[test]
    fn exit_code_maps_api_status() {
        let missing = EstateError::Api {
            status: 404,
            message: "not found".to_string(),
        };
        assert_eq!(exit_code_for_error(&missing), 22);
        let server = EstateError::Api {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert_eq!(exit_code_for_error(&server), 52);
    }
}
