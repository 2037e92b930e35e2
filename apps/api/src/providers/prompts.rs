// Fixed payloads used by `test_connection` on every provider.

use super::{ChatMessage, CompletionRequest, SamplingParams};

pub const CONNECTION_TEST_SYSTEM: &str = "You are a helpful assistant.";

pub const CONNECTION_TEST_PROMPT: &str = "Say 'test successful' if you can read this.";

pub const CONNECTION_TEST_EMBED_TEXT: &str = "Test sentence for embedding.";

pub const CONNECTION_TEST_PARAMS: SamplingParams = SamplingParams {
    temperature: 1.0,
    top_p: 1.0,
    max_tokens: 50,
};

pub fn connection_test_request() -> CompletionRequest {
    CompletionRequest::new(
        vec![
            ChatMessage::system(CONNECTION_TEST_SYSTEM),
            ChatMessage::user(CONNECTION_TEST_PROMPT),
        ],
        CONNECTION_TEST_PARAMS,
    )
}
