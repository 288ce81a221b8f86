//! JSON messages pushed over the dashboard's WebSockets.

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ErrorMessage<'a> {
    pub error: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct LogMessage<'a> {
    pub log: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Outcome of a one-shot action.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StatusMessage {
    pub status: Status,
    pub message: String,
}

/// Serializes a message that cannot fail to serialize.
pub(crate) fn to_json<T: serde::Serialize>(message: &T) -> String {
    match serde_json::to_string(message) {
        Ok(json) => json,
        Err(err) => {
            log::error!("failed to serialize message: {err}");
            r#"{"error":"internal serialization error"}"#.to_owned()
        }
    }
}

pub(crate) fn error_json(error: &str) -> String {
    to_json(&ErrorMessage { error })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_shapes() {
        assert_eq!(to_json(&LogMessage { log: "hello\n" }), r#"{"log":"hello\n"}"#);
        assert_eq!(error_json("boom"), r#"{"error":"boom"}"#);
        assert_eq!(
            to_json(&StatusMessage {
                status: Status::Success,
                message: "done".to_owned(),
            }),
            r#"{"status":"success","message":"done"}"#
        );
    }
}
