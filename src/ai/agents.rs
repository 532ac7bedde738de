use super::client::{ChatClient, ChatMessage};
use super::prompts;
use super::schema_utils;
use crate::core::models::{
    OptimizedPrompt, OutputScore, PromptAnalysis, PromptComparison, PromptPair, Validate,
};
use crate::core::trace::{CallTracer, Stage};
use crate::error::PrompterError;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// The four LLM-backed pipeline stages. Each call is one stateless round-trip
/// (two for the comparator) against the configured model.
pub struct PromptAgents {
    client: Arc<dyn ChatClient>,
    model: String,
    tracer: CallTracer,
}

impl PromptAgents {
    pub fn new(client: Arc<dyn ChatClient>, model: impl Into<String>, tracer: CallTracer) -> Self {
        Self { client, model: model.into(), tracer }
    }

    pub fn tracer(&self) -> &CallTracer {
        &self.tracer
    }

    pub async fn analyze_prompt(
        &self,
        prompt: &str,
        is_system_prompt: bool,
    ) -> Result<PromptAnalysis, PrompterError> {
        self.tracer
            .record(Stage::Analyze, async {
                log::debug!("analyzing prompt (system prompt: {is_system_prompt})");
                let instruction = format!(
                    "{}\n{}\n\nPrompt to analyze: {prompt}",
                    prompts::ANALYZER_PREAMBLE,
                    schema_utils::schema_block::<PromptAnalysis>()?
                );
                let messages = [ChatMessage::system(instruction)];
                self.structured(Stage::Analyze, &messages).await
            })
            .await
    }

    pub async fn optimize_prompt(
        &self,
        analysis: &PromptAnalysis,
        original_prompt: &str,
    ) -> Result<OptimizedPrompt, PrompterError> {
        self.tracer
            .record(Stage::Optimize, async {
                let instruction = format!(
                    "{}\n{}",
                    prompts::OPTIMIZER_INSTRUCTION,
                    schema_utils::schema_block::<OptimizedPrompt>()?
                );
                let messages = [
                    ChatMessage::system(instruction),
                    ChatMessage::user(analysis_summary(analysis, original_prompt)),
                ];
                self.structured(Stage::Optimize, &messages).await
            })
            .await
    }

    /// Runs the user prompt under the original and the optimized system
    /// prompt. Both calls are issued together; the first failure wins.
    pub async fn compare_outputs(
        &self,
        pair: &PromptPair,
        optimized_system_prompt: Option<&str>,
    ) -> Result<PromptComparison, PrompterError> {
        self.tracer
            .record(Stage::Compare, async {
                let original = conversation(pair.system_prompt(), pair.user_prompt());
                let optimized = conversation(
                    optimized_system_prompt.filter(|s| !s.trim().is_empty()),
                    pair.user_prompt(),
                );

                let (original_output, optimized_output) = tokio::try_join!(
                    self.client.complete(&self.model, &original, false),
                    self.client.complete(&self.model, &optimized, false),
                )?;

                Ok::<_, PrompterError>(PromptComparison { original_output, optimized_output })
            })
            .await
    }

    /// Judges the two outputs. `input_1` is always the original output.
    pub async fn score_outputs(
        &self,
        pair: &PromptPair,
        original_output: &str,
        optimized_output: &str,
    ) -> Result<OutputScore, PrompterError> {
        self.tracer
            .record(Stage::Score, async {
                let instruction = format!(
                    "{}\n{}",
                    prompts::SCORER_RUBRIC,
                    schema_utils::schema_block::<OutputScore>()?
                );
                let request = format!(
                    "System Prompt: {}\nUser Prompt: {}\n\nInput 1:\n{original_output}\n\nInput 2:\n{optimized_output}",
                    pair.system_prompt().unwrap_or("None"),
                    pair.user_prompt(),
                );
                let messages = [ChatMessage::system(instruction), ChatMessage::user(request)];
                self.structured(Stage::Score, &messages).await
            })
            .await
    }

    async fn structured<T>(&self, stage: Stage, messages: &[ChatMessage]) -> Result<T, PrompterError>
    where
        T: DeserializeOwned + Validate,
    {
        let text = self.client.complete(&self.model, messages, true).await?;
        parse_stage(stage, &text)
    }
}

fn conversation(system_prompt: Option<&str>, user_prompt: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = system_prompt {
        messages.push(ChatMessage::system(system));
    }
    messages.push(ChatMessage::user(user_prompt));
    messages
}

fn analysis_summary(analysis: &PromptAnalysis, original_prompt: &str) -> String {
    format!(
        "Original Prompt: {original_prompt}\n\n\
         Analysis:\n\
         - Program Key: {}\n\
         - Program Inputs: {}\n\
         - Hallucination Risk: {}\n\
         - Hallucination Targets: {}\n\
         - Program Improvement Ideas: {}\n\
         - Reasoning: {}",
        analysis.program_key,
        analysis.program_inputs.join(", "),
        analysis.hallucination_risk,
        analysis.hallucination_targets.join(", "),
        analysis.program_improvement_ideas.join(", "),
        analysis.reasoning.as_deref().unwrap_or("Not provided"),
    )
}

/// Strictly decodes one stage record; never yields a partial value.
pub fn parse_stage<T>(stage: Stage, text: &str) -> Result<T, PrompterError>
where
    T: DeserializeOwned + Validate,
{
    let invalid = |reason: String| PrompterError::SchemaValidation { stage, reason };

    let record: T = serde_json::from_str(strip_json_fence(text)).map_err(|e| invalid(e.to_string()))?;
    record.validate().map_err(invalid)?;
    Ok(record)
}

fn strip_json_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Any language tag on the opening fence ("json", "JSON", "jsonc").
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
