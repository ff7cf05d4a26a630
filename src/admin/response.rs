use serde::{Deserialize, Deserializer};

/// `data.code` value Dgraph uses for a completed admin operation.
pub const SUCCESS_CODE: &str = "Success";

/// Substring of the error Dgraph returns while it is still initialising.
pub const NOT_READY_MARKER: &str = "not ready";

/// Decoded body of `/admin/schema` and `/alter` replies:
/// `{ "data": { "code", "message" }, "errors": [{ "message" }] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AdminResponse {
    #[serde(default)]
    pub data: Option<ResponseData>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub errors: Vec<ResponseError>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ResponseData {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResponseError {
    #[serde(default)]
    pub message: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<ResponseError>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<ResponseError>>::deserialize(deserializer)?.unwrap_or_default())
}

/// How a schema-install reply drives the retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaReply {
    Success,
    /// Instance still starting; try again.
    NotReady(String),
    /// Any other error list. `message` is the first entry, verbatim.
    Rejected {
        message: String,
        messages: Vec<String>,
    },
    /// Neither a result code nor errors.
    Unrecognized,
}

impl AdminResponse {
    pub fn result_code(&self) -> Option<&str> {
        self.data.as_ref()?.code.as_deref()
    }

    pub fn is_success(&self) -> bool {
        self.result_code() == Some(SUCCESS_CODE)
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.message.clone()).collect()
    }

    /// Classify a schema reply. Success wins over errors; only the first
    /// error message is checked for the not-ready marker.
    pub fn schema_reply(&self) -> SchemaReply {
        if self.is_success() {
            return SchemaReply::Success;
        }

        match self.errors.first() {
            Some(first) if first.message.contains(NOT_READY_MARKER) => {
                SchemaReply::NotReady(first.message.clone())
            }
            Some(first) => SchemaReply::Rejected {
                message: first.message.clone(),
                messages: self.error_messages(),
            },
            None => SchemaReply::Unrecognized,
        }
    }
}
