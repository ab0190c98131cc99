/// Errors that can occur while configuring or running an action.
///
/// # Examples
///
/// ```rust
/// use oxwatch_notify::ActionError;
///
/// let err = ActionError::InvalidConfig("missing url".to_string());
/// assert!(err.to_string().contains("url"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// Action configuration is missing a required option or has an invalid value.
    #[error("Action: invalid configuration: {0}")]
    InvalidConfig(String),

    /// The action type is not registered.
    #[error("Action: unknown action type '{0}'")]
    UnknownActionType(String),

    /// Triggered before a successful setup.
    #[error("Action: '{0}' is not configured")]
    NotConfigured(String),

    /// An HTTP request to an external endpoint failed.
    #[error("Action: HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The external endpoint returned a non-success response.
    #[error("Action: API error from {service}: status={status}, body={body}")]
    Api {
        service: String,
        status: u16,
        body: String,
    },

    #[error("Action: {0}")]
    Other(String),
}
