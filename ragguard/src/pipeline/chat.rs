//! Non-streaming answer pipeline

use std::time::Instant;

use tracing::{error, info, warn};

use super::ChatPipeline;
use crate::error::BotError;
use crate::retriever::QueryParameters;

/// Steps of one `chat` call
enum Step {
    CacheLookup,
    AugmentedQuery,
    FallbackQuery,
    QualityGate(String),
    CacheWrite(String),
    Failed(BotError),
}

impl ChatPipeline {
    /// Answer `question`
    ///
    /// Order: response cache, augmented retrieval and generation, plain
    /// retrieval and generation if that failed, quality gate, cache write.
    /// A failure of both attempts returns the technical-difficulty message,
    /// which is not cached.
    pub async fn chat(&self, question: &str) -> String {
        let started = Instant::now();
        info!("Question: {}", question);

        let mut step = Step::CacheLookup;
        loop {
            step = match step {
                Step::CacheLookup => match self.responses.get(question).await {
                    Some(answer) => {
                        info!("Response cache hit ({:?})", started.elapsed());
                        return answer;
                    }
                    None => Step::AugmentedQuery,
                },

                Step::AugmentedQuery => {
                    match self.generate(question, &QueryParameters::augmented()).await {
                        Ok(answer) => Step::QualityGate(answer),
                        Err(e) => {
                            warn!("Augmented query failed, falling back to plain: {}", e);
                            Step::FallbackQuery
                        }
                    }
                }

                Step::FallbackQuery => {
                    match self.generate(question, &QueryParameters::plain()).await {
                        Ok(answer) => Step::QualityGate(answer),
                        Err(e) => Step::Failed(e),
                    }
                }

                Step::QualityGate(answer) => Step::CacheWrite(self.quality.apply(&answer)),

                Step::CacheWrite(answer) => {
                    self.responses.store(question, answer.clone()).await;
                    info!(
                        "Answered in {:?} ({} chars)",
                        started.elapsed(),
                        answer.chars().count()
                    );
                    return answer;
                }

                Step::Failed(e) => {
                    error!("Chat failed after {:?}: {}", started.elapsed(), e);
                    return self.messages.technical_difficulty.clone();
                }
            };
        }
    }
}
