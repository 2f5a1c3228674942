use crate::validation::{Issue, ValidationErrors};

/// The message shown when a failure has no better description.
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred";

/// The errors that may occur in the client data layer.
///
/// The [Display](std::fmt::Display) text of each variant is the message
/// shown to the user.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ClientError {
    /// The form did not satisfy the schema, so no request was sent.
    #[error("{0}")]
    Invalid(ValidationErrors),

    /// The server responded with a non-success status code.
    ///
    /// `message` describes the operation that failed, e.g. "Error creating
    /// account". `server_error` and `details` hold the `error` and `details`
    /// fields of the response body, when present.
    #[error("{message}")]
    Api {
        /// The HTTP status code of the response.
        status: u16,
        /// The message for the failed operation.
        message: String,
        /// The `error` field of the response body.
        server_error: Option<String>,
        /// The validation issues reported by the server.
        details: Vec<Issue>,
    },

    /// The request could not be built or sent.
    #[error("An unknown error occurred")]
    Transport(String),

    /// The response body could not be read or did not have the expected shape.
    #[error("An unknown error occurred")]
    Decode(String),

    /// A file on the client could not be read or written.
    #[error("{0}")]
    Io(String),
}

impl ClientError {
    /// The HTTP status code for errors reported by the server.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for ClientError {
    fn from(errors: ValidationErrors) -> Self {
        ClientError::Invalid(errors)
    }
}
