pub mod assets;
pub mod catalog;
pub mod config;
pub mod error;
pub mod llm;
pub mod prompt;
pub mod selection;
pub mod studio;
pub mod utils;

pub use assets::{GeneratedImage, ImageAsset, PreviewHandle, PreviewRevoker};
pub use config::{ApiKey, Config, Credentials};
pub use error::{StudioError, TransportError};
pub use llm::{GeminiClient, GeminiTransport, HttpTransport};
pub use prompt::{compile, CompiledPrompt, ImagePart, TechnicalHints};
pub use selection::{
    CompanionSource, Feature, GenerationResult, SelectionPatch, SelectionState, SetField,
    SubmissionPhase,
};
pub use studio::{Studio, StudioObserver};
pub use utils::logging::{init_logging, LoggingGuards};
