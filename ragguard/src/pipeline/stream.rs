//! Streaming answer pipeline

use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use futures::{Stream, StreamExt};
use tracing::{error, info, warn};

use super::ChatPipeline;
use crate::guard::Sufficiency;
use crate::retriever::QueryParameters;

/// Answer fragments in emission order
pub type AnswerStream = Pin<Box<dyn Stream<Item = String> + Send>>;

impl ChatPipeline {
    /// Answer `question` incrementally
    ///
    /// A cached answer is yielded as a single fragment. Otherwise the context
    /// is retrieved, checked for sufficiency and the completion deltas are
    /// passed through as they arrive. The concatenation of a fully streamed
    /// answer is cached; the quality gate does not run on this path. A stream
    /// that ends without text yields the redirect and caches nothing.
    /// Failures yield the technical-difficulty message and end the stream.
    pub fn chat_stream(self: &Arc<Self>, question: &str) -> AnswerStream {
        let pipeline = Arc::clone(self);
        let question = question.to_string();

        Box::pin(async_stream::stream! {
            let started = Instant::now();
            info!("Streaming question: {}", question);

            if let Some(answer) = pipeline.responses.get(&question).await {
                info!("Response cache hit ({:?})", started.elapsed());
                yield answer;
                return;
            }

            let params = QueryParameters::augmented().with_context_only(true);
            let context = match pipeline.retriever.query(&question, &params).await {
                Ok(context) => context,
                Err(e) => {
                    error!("Context retrieval failed: {}", e);
                    yield pipeline.messages.technical_difficulty.clone();
                    return;
                }
            };

            if pipeline.sufficiency.classify(Some(&context)) == Sufficiency::Insufficient {
                warn!(
                    "Insufficient context ({} chars), returning redirect",
                    context.trim().chars().count()
                );
                yield pipeline.messages.redirect.clone();
                return;
            }

            let messages = pipeline.prompt.messages(&context, &question);
            let opened = pipeline
                .client
                .stream_complete(messages, &pipeline.generation)
                .await;
            let mut deltas = match opened {
                Ok(deltas) => deltas,
                Err(e) => {
                    error!("Completion stream failed to open: {}", e);
                    yield pipeline.messages.technical_difficulty.clone();
                    return;
                }
            };

            let mut answer = String::new();
            let mut first_token_logged = false;
            while let Some(delta) = deltas.next().await {
                match delta {
                    Ok(text) if text.is_empty() => continue,
                    Ok(text) => {
                        if !first_token_logged {
                            first_token_logged = true;
                            info!("First token after {:?}", started.elapsed());
                        }
                        answer.push_str(&text);
                        yield text;
                    }
                    Err(e) => {
                        error!(
                            "Completion stream failed after {} chars: {}",
                            answer.chars().count(),
                            e
                        );
                        yield pipeline.messages.technical_difficulty.clone();
                        return;
                    }
                }
            }

            if answer.trim().is_empty() {
                warn!("Completion stream produced no text, returning redirect");
                yield pipeline.messages.redirect.clone();
                return;
            }

            pipeline.responses.store(&question, answer.clone()).await;
            info!(
                "Streamed answer in {:?} ({} chars)",
                started.elapsed(),
                answer.chars().count()
            );
        })
    }
}
