//! Scripted provider for tests and offline runs.

use super::{ProviderConfig, TreeProvider};
use crate::error::LlmError;
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

/// Replays canned replies in order; the last one repeats.
pub struct FakeProvider {
    responses: Mutex<Vec<Result<String, LlmError>>>,
    call_count: Mutex<usize>,
}

impl FakeProvider {
    pub fn new(responses: Vec<Result<String, LlmError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            call_count: Mutex::new(0),
        }
    }

    pub fn always_ok(text: impl Into<String>) -> Self {
        Self::new(vec![Ok(text.into())])
    }

    pub fn always_error(error: LlmError) -> Self {
        Self::new(vec![Err(error)])
    }

    pub fn call_count(&self) -> usize {
        *lock(&self.call_count)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl TreeProvider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    async fn send(
        &self,
        _question: &str,
        _system_prompt: &str,
        _config: &ProviderConfig,
    ) -> Result<String, LlmError> {
        *lock(&self.call_count) += 1;

        let mut responses = lock(&self.responses);
        match responses.len() {
            0 => Err(LlmError::MalformedResponse("empty reply".to_string())),
            1 => responses[0].clone(),
            _ => responses.remove(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_then_repeats_last() {
        let fake = FakeProvider::new(vec![
            Ok("one".to_string()),
            Err(LlmError::Timeout(30)),
        ]);
        let config = ProviderConfig::default();

        assert_eq!(fake.send("q", "s", &config).await.unwrap(), "one");
        assert_eq!(fake.send("q", "s", &config).await, Err(LlmError::Timeout(30)));
        assert_eq!(fake.send("q", "s", &config).await, Err(LlmError::Timeout(30)));
        assert_eq!(fake.call_count(), 3);
    }
}
