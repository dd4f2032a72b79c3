pub mod gemini;

pub use gemini::{GeminiClient, GeminiTransport, HttpTransport};
