//! Voice queries
//!
//! Speech recognition is an external service; this module only defines the
//! seam and how its failures surface to callers.

use crate::{Result, SearchError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranscriptionError {
    #[error("Could not understand the audio")]
    Unintelligible,

    #[error("Error with the recognition service: {0}")]
    Service(String),
}

/// Speech-to-text backend
pub trait Transcriber: Send + Sync {
    fn transcribe(&self, audio: &[u8]) -> std::result::Result<String, TranscriptionError>;
}

/// Turn recorded audio into a text query
///
/// Empty audio and blank transcripts are rejected as invalid input.
pub fn transcribe_query(transcriber: &dyn Transcriber, audio: &[u8]) -> Result<String> {
    if audio.is_empty() {
        return Err(SearchError::InvalidInput("No audio provided".to_string()));
    }
    let text = transcriber.transcribe(audio)?;
    let text = text.trim();
    if text.is_empty() {
        return Err(SearchError::Transcription(TranscriptionError::Unintelligible));
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(std::result::Result<String, TranscriptionError>);

    impl Transcriber for Fixed {
        fn transcribe(&self, _audio: &[u8]) -> std::result::Result<String, TranscriptionError> {
            self.0.clone()
        }
    }

    #[test]
    fn test_transcript_is_trimmed() {
        let t = Fixed(Ok("  red shoe \n".to_string()));
        assert_eq!(transcribe_query(&t, b"pcm").unwrap(), "red shoe");
    }

    #[test]
    fn test_failures() {
        let t = Fixed(Ok("red shoe".to_string()));
        assert!(transcribe_query(&t, b"").unwrap_err().is_invalid_input());

        let t = Fixed(Err(TranscriptionError::Unintelligible));
        assert!(matches!(
            transcribe_query(&t, b"pcm"),
            Err(SearchError::Transcription(TranscriptionError::Unintelligible))
        ));

        let t = Fixed(Err(TranscriptionError::Service("timeout".to_string())));
        let err = transcribe_query(&t, b"pcm").unwrap_err();
        assert!(err.to_string().contains("timeout"));

        let t = Fixed(Ok("   ".to_string()));
        assert!(matches!(
            transcribe_query(&t, b"pcm"),
            Err(SearchError::Transcription(TranscriptionError::Unintelligible))
        ));
    }
}
