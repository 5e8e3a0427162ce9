//! Error types for granite-mistralrs.

use granite_rag::RagError;
use thiserror::Error;

/// Backend name recorded in converted [`RagError`]s.
pub(crate) const BACKEND: &str = "mistral.rs";

/// Errors that can occur when using mistral.rs models.
#[derive(Debug, Error)]
pub enum MistralRsError {
    /// Model loading failed
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    /// Requested device is not available in this build
    #[error("Device not available: {device}")]
    DeviceNotAvailable { device: String },

    /// Inference failed
    #[error("Inference failed: {0}")]
    Inference(String),

    /// The model answered without any text
    #[error("Model returned no content")]
    EmptyResponse,

    /// Embedding failed
    #[error("Embedding failed: {0}")]
    Embedding(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The model's chat template is missing or fails to render
    #[error("Chat template error: {0}")]
    ChatTemplate(String),
}

/// Result type alias for MistralRsError
pub type Result<T> = std::result::Result<T, MistralRsError>;

impl From<MistralRsError> for RagError {
    fn from(err: MistralRsError) -> Self {
        match err {
            MistralRsError::InvalidConfig(_) | MistralRsError::DeviceNotAvailable { .. } => {
                RagError::ConfigError(err.to_string())
            }
            MistralRsError::Embedding(message) => {
                RagError::EmbeddingError { provider: BACKEND.to_string(), message }
            }
            MistralRsError::ModelLoad(_)
            | MistralRsError::Inference(_)
            | MistralRsError::EmptyResponse
            | MistralRsError::ChatTemplate(_) => RagError::GenerationError {
                backend: BACKEND.to_string(),
                message: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use granite_rag::FaultClass;

    use super::*;

    #[test]
    fn config_problems_become_input_faults() {
        let err: RagError = MistralRsError::DeviceNotAvailable { device: "cuda:1".into() }.into();
        assert!(matches!(err, RagError::ConfigError(_)));
        assert_eq!(err.class(), FaultClass::Input);
    }

    #[test]
    fn runtime_failures_keep_their_message() {
        let err: RagError = MistralRsError::Inference("out of memory".into()).into();
        assert_eq!(err.class(), FaultClass::Runtime);
        assert!(err.to_string().contains("out of memory"));

        let err: RagError = MistralRsError::Embedding("bad shape".into()).into();
        assert!(matches!(err, RagError::EmbeddingError { .. }));
    }

    #[test]
    fn every_variant_maps_to_a_specific_rag_error() {
        let cases = [
            (MistralRsError::ModelLoad("no weights".into()), FaultClass::Runtime),
            (MistralRsError::EmptyResponse, FaultClass::Runtime),
            (MistralRsError::ChatTemplate("no chat_template".into()), FaultClass::Runtime),
            (MistralRsError::InvalidConfig("dimensions".into()), FaultClass::Input),
        ];
        for (err, class) in cases {
            let message = err.to_string();
            let converted = RagError::from(err);
            assert_eq!(converted.class(), class);
            assert!(converted.to_string().contains(&message));
        }
    }
}
