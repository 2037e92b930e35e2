//! Job analyzer: turns a pasted job post into the six-section report.
//!
//! Flow: validate → embed the post once → six sequential completions, each
//! wrapped in a linear retry → assemble `AnalysisReport`.
//!
//! The embedding is computed on every run but not consumed by the prompts;
//! it keeps the embedding provider exercised and surfaces its failures.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analysis::prompts::{prompt_bank, AnalysisSection, ANALYSIS_SYSTEM, PROPOSAL_MAX_WORDS};
use crate::providers::{
    ChatMessage, CompletionRequest, EmbeddingModel, InferenceModel, ModelCapability,
    ProviderError, SamplingParams,
};

/// Sampling parameters for every analysis section.
pub const ANALYSIS_PARAMS: SamplingParams = SamplingParams {
    temperature: 0.7,
    top_p: 0.9,
    max_tokens: 1000,
};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Job post cannot be empty")]
    InvalidInput,

    #[error("Embedding failed: {0}")]
    Embedding(#[from] ProviderError),
}

/// Linear backoff between completion attempts: the wait after failed
/// attempt `n` is `base_delay * n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay before the attempt that follows failed attempt `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

/// The report returned to callers. Serializes to exactly seven keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub job_analysis: String,
    pub client_characteristics: String,
    pub approach_analysis: String,
    pub solution_analysis: String,
    pub questions_analysis: String,
    pub proposal: String,
    /// The prompt bank used, as a JSON object string.
    pub prompt: String,
}

impl AnalysisReport {
    #[cfg(test)]
    pub fn section(&self, section: AnalysisSection) -> &str {
        match section {
            AnalysisSection::JobAnalysis => &self.job_analysis,
            AnalysisSection::ClientCharacteristics => &self.client_characteristics,
            AnalysisSection::ApproachAnalysis => &self.approach_analysis,
            AnalysisSection::SolutionAnalysis => &self.solution_analysis,
            AnalysisSection::QuestionsAnalysis => &self.questions_analysis,
            AnalysisSection::Proposal => &self.proposal,
        }
    }

    fn section_mut(&mut self, section: AnalysisSection) -> &mut String {
        match section {
            AnalysisSection::JobAnalysis => &mut self.job_analysis,
            AnalysisSection::ClientCharacteristics => &mut self.client_characteristics,
            AnalysisSection::ApproachAnalysis => &mut self.approach_analysis,
            AnalysisSection::SolutionAnalysis => &mut self.solution_analysis,
            AnalysisSection::QuestionsAnalysis => &mut self.questions_analysis,
            AnalysisSection::Proposal => &mut self.proposal,
        }
    }
}

pub struct JobAnalyzer {
    embedder: Arc<dyn EmbeddingModel>,
    inference: Arc<dyn InferenceModel>,
    retry: RetryPolicy,
}

impl JobAnalyzer {
    pub fn new(embedder: Arc<dyn EmbeddingModel>, inference: Arc<dyn InferenceModel>) -> Self {
        Self {
            embedder,
            inference,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn embedding_model(&self) -> &str {
        self.embedder.model_id()
    }

    pub fn inference_model(&self) -> &str {
        self.inference.model_id()
    }

    /// Runs the full analysis.
    ///
    /// Only blank input and an embedding failure abort the call; each
    /// section's completion failure is contained in that section's text.
    pub async fn analyze(&self, job_post: &str) -> Result<AnalysisReport, AnalysisError> {
        if job_post.trim().is_empty() {
            return Err(AnalysisError::InvalidInput);
        }

        let embedding = self.embedder.embed(&[job_post.to_string()]).await?;
        if embedding.is_empty() {
            warn!(model = self.embedder.model_id(), "Embedding returned no vectors");
        }
        debug!(
            vectors = embedding.len(),
            dimensions = embedding.dimensions(),
            "Job post embedded"
        );

        let mut report = AnalysisReport {
            prompt: prompt_bank(),
            ..AnalysisReport::default()
        };
        for section in AnalysisSection::ALL {
            *report.section_mut(section) = self.analyze_with_retry(section, job_post).await;
        }

        if exceeds_proposal_limit(&report.proposal) {
            warn!(
                words = report.proposal.split_whitespace().count(),
                "Proposal is longer than {PROPOSAL_MAX_WORDS} words"
            );
        }

        info!(
            model = self.inference.model_id(),
            "Job analysis complete ({} sections)",
            AnalysisSection::ALL.len()
        );

        Ok(report)
    }

    /// Calls the inference model for one section. Never fails: after the last
    /// attempt the error is rendered into the section text.
    async fn analyze_with_retry(&self, section: AnalysisSection, job_post: &str) -> String {
        let request = CompletionRequest::new(
            vec![
                ChatMessage::system(ANALYSIS_SYSTEM),
                ChatMessage::user(section.user_prompt(job_post)),
            ],
            ANALYSIS_PARAMS,
        );

        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.inference.complete(&request).await {
                Ok(result) => return result.content,
                Err(e) if attempt >= max_attempts => {
                    warn!(
                        section = section.key(),
                        "Section failed after {max_attempts} attempts: {e}"
                    );
                    return format!("Analysis failed after {max_attempts} attempts: {e}");
                }
                Err(e) => {
                    let delay = self.retry.delay_after(attempt);
                    warn!(
                        section = section.key(),
                        transport = e.is_transport(),
                        "Attempt {}/{} failed ({}), retrying after {}ms...",
                        attempt,
                        max_attempts,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// The proposal length limit is a prompt instruction only; overruns are logged.
fn exceeds_proposal_limit(proposal: &str) -> bool {
    proposal.split_whitespace().count() > PROPOSAL_MAX_WORDS
}
