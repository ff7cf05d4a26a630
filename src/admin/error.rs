use reqwest::StatusCode;

/// Errors from the instance's admin endpoints. All of them are fatal for the
/// call; the only retried condition (a not-ready schema reply) never becomes
/// an error.
#[derive(thiserror::Error, Debug)]
pub enum AdminError {
    #[error("request to {path} failed: {source}")]
    Http {
        path: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{path} returned {status}: {body}")]
    Status {
        path: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("failed to decode {path} response: {source}")]
    Decode {
        path: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("schema rejected: {message}")]
    Rejected {
        message: String,
        messages: Vec<String>,
    },

    #[error("{path} did not succeed (code: {code:?}, errors: {errors:?})")]
    Unsuccessful {
        path: &'static str,
        code: Option<String>,
        errors: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_displays_message_verbatim() {
        let err = AdminError::Rejected {
            message: "input:3: Undefined type Foo.".into(),
            messages: vec!["input:3: Undefined type Foo.".into()],
        };
        assert_eq!(err.to_string(), "schema rejected: input:3: Undefined type Foo.");
    }

    #[test]
    fn status_displays_path_and_code() {
        let err = AdminError::Status {
            path: "/alter",
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "boom".into(),
        };
        assert_eq!(err.to_string(), "/alter returned 500 Internal Server Error: boom");
    }

    #[test]
    fn unsuccessful_displays_code() {
        let err = AdminError::Unsuccessful {
            path: "/alter",
            code: Some("Error".into()),
            errors: vec![],
        };
        assert!(err.to_string().contains("Some(\"Error\")"));
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AdminError>();
    }
}
