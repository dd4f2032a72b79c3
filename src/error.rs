/// Failures surfaced by the studio core.
///
/// `Display` is the text shown to the user in the alert.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StudioError {
    #[error("Please choose a source photo before generating.")]
    MissingPrimaryImage,
    #[error("No API key found. Enter a Gemini API key in the AI settings.")]
    MissingCredential,
    #[error("The API key is not valid. Check it in the AI settings.")]
    InvalidCredential,
    #[error(
        "The model did not return an image. The request may have been blocked by the content safety policy, or the service failed."
    )]
    NoImageInResponse,
    #[error("{0}")]
    TransportFailure(String),
    #[error("Could not fetch destination suggestions: {0}")]
    SuggestionFetchFailure(String),
}

pub const GENERIC_FAILURE_MESSAGE: &str = "Could not process the image.";

impl StudioError {
    pub fn transport(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            StudioError::TransportFailure(GENERIC_FAILURE_MESSAGE.to_string())
        } else {
            StudioError::TransportFailure(message)
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StudioError::MissingPrimaryImage => "missing_primary_image",
            StudioError::MissingCredential => "missing_credential",
            StudioError::InvalidCredential => "invalid_credential",
            StudioError::NoImageInResponse => "no_image_in_response",
            StudioError::TransportFailure(_) => "transport_failure",
            StudioError::SuggestionFetchFailure(_) => "suggestion_fetch_failure",
        }
    }
}

/// Error raised by a provider transport before classification.
#[derive(Debug, Clone, thiserror::Error)]
#[error("provider request failed (status={status:?}): {message}")]
pub struct TransportError {
    pub status: Option<u16>,
    pub message: String,
}

impl TransportError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        TransportError {
            status,
            message: message.into(),
        }
    }
}
