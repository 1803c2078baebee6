//! Career insight generation
//!
//! A summary becomes an [`InsightRequest`], the request becomes a prompt, and
//! the prompt is sent to a [`TextGenerator`] whose streamed reply is decoded
//! into the insight text.

mod client;
mod decode;
mod prompt;

use futures::StreamExt;

use crate::error::Result;

pub use client::{ByteStream, ChatMessage, HttpChatClient, TextGenerator};
pub use decode::Utf8Accumulator;
pub use prompt::{InsightRequest, PROMPT_CATEGORIES};

/// Shown when generation fails for any reason
pub const INSIGHT_FAILED_MESSAGE: &str = "Failed to generate career insights. Please try again.";
/// Shown when an insight is requested for a summary with no categories
pub const INSUFFICIENT_DATA_MESSAGE: &str = "Insufficient data to generate insights";

/// Read a byte stream to completion as UTF-8 text.
pub async fn collect_stream(mut stream: ByteStream) -> Result<String> {
    let mut acc = Utf8Accumulator::new();
    let mut chunks = 0usize;
    while let Some(chunk) = stream.next().await {
        acc.push(&chunk?);
        chunks += 1;
    }
    tracing::debug!(chunks, "Insight stream complete");
    Ok(acc.finish())
}

/// Generate the insight text for a request.
pub async fn generate_insight(
    generator: &dyn TextGenerator,
    request: &InsightRequest,
) -> Result<String> {
    let stream = generator.stream_chat(&request.messages()).await?;
    collect_stream(stream).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use futures::stream;

    #[tokio::test]
    async fn test_collect_joins_chunks() {
        let chunks: Vec<Result<Vec<u8>>> = vec![
            Ok("- Grow ".as_bytes().to_vec()),
            Ok(vec![0xE2, 0x86]),
            Ok(vec![0x91, b'\n']),
        ];
        let text = collect_stream(stream::iter(chunks).boxed()).await.unwrap();
        assert_eq!(text, "- Grow \u{2191}\n");
    }

    #[tokio::test]
    async fn test_collect_propagates_stream_error() {
        let chunks: Vec<Result<Vec<u8>>> = vec![
            Ok(b"- partial".to_vec()),
            Err(Error::Insight("stream interrupted".to_string())),
        ];
        assert!(matches!(
            collect_stream(stream::iter(chunks).boxed()).await,
            Err(Error::Insight(_))
        ));
    }
}
