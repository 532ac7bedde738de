use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_SYSTEM_PROMPT: &str = "Rewrite this poem in Shakespeare's style.";

pub const DEFAULT_USER_PROMPT: &str = r#"
I'm going to the store to buy some eggs.
too bad inflation is so high.
2 eggs isn't enough
I need 100 eggs
small omelettes for breakfast I guess
"#;

pub const MIN_SCORE: u32 = 1;
pub const MAX_SCORE: u32 = 100;

/// Post-parse checks a stage record must pass beyond its serde shape.
pub trait Validate {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// The user's candidate instruction/content pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptPair {
    system_prompt: Option<String>,
    user_prompt: String,
}

impl PromptPair {
    pub fn new(system_prompt: Option<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt,
            user_prompt: user_prompt.into(),
        }
    }

    /// The system prompt, treating an empty or blank one as absent.
    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }

    pub fn user_prompt(&self) -> &str {
        &self.user_prompt
    }

    /// Prompt the analyzer works on: the system prompt if set, else the user prompt.
    pub fn subject(&self) -> &str {
        self.system_prompt().unwrap_or(&self.user_prompt)
    }
}

impl Default for PromptPair {
    fn default() -> Self {
        Self::new(
            Some(DEFAULT_SYSTEM_PROMPT.to_string()),
            DEFAULT_USER_PROMPT,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PromptAnalysis {
    #[schemars(description = "A concise identifier for the type of operation.")]
    pub program_key: String,
    #[schemars(description = "List of identified inputs in the prompt.")]
    pub program_inputs: Vec<String>,
    #[schemars(description = "Assessment of hallucination risk with specific text targets.")]
    pub hallucination_risk: String,
    #[schemars(description = "List of hallucination targets in the text.")]
    pub hallucination_targets: Vec<String>,
    #[schemars(description = "Ideas for improving the prompt.")]
    pub program_improvement_ideas: Vec<String>,
    #[serde(default)]
    #[schemars(description = "Optional supporting analysis.")]
    pub reasoning: Option<String>,
}

impl Validate for PromptAnalysis {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct OptimizedPrompt {
    #[schemars(description = "The input prompt being optimized.")]
    pub original_prompt: String,
    #[schemars(description = "The improved prompt text.")]
    pub optimized_prompt: String,
    #[schemars(description = "List of specific improvements made.")]
    pub improvements: Vec<String>,
}

impl Validate for OptimizedPrompt {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptComparison {
    pub original_output: String,
    pub optimized_output: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Winner {
    #[serde(rename = "input_1")]
    Input1,
    #[serde(rename = "input_2")]
    Input2,
    #[serde(rename = "tie")]
    Tie,
}

impl Winner {
    pub fn as_str(self) -> &'static str {
        match self {
            Winner::Input1 => "input_1",
            Winner::Input2 => "input_2",
            Winner::Tie => "tie",
        }
    }
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Judge verdict. `input_1` is always the original-prompt output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct OutputScore {
    #[schemars(description = "Integer score 1-100 for the first output.", range(min = 1, max = 100))]
    pub input_1: u32,
    #[schemars(description = "Integer score 1-100 for the second output.", range(min = 1, max = 100))]
    pub input_2: u32,
    #[schemars(description = "Specific observations about the differences between the outputs.")]
    pub comparison_notes: Vec<String>,
    #[schemars(description = "Which version was better.")]
    pub winner: Winner,
}

impl Validate for OutputScore {
    fn validate(&self) -> Result<(), String> {
        for (field, score) in [("input_1", self.input_1), ("input_2", self.input_2)] {
            if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
                return Err(format!(
                    "{field} = {score} is outside {MIN_SCORE}..={MAX_SCORE}"
                ));
            }
        }
        Ok(())
    }
}

/// Everything a front end needs to display one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisData {
    pub original_system_prompt: Option<String>,
    pub optimized_system_prompt: Option<String>,
    pub user_prompt: String,
    pub program_key: String,
    pub program_inputs: Vec<String>,
    pub hallucination_risk: String,
    pub hallucination_targets: Vec<String>,
    pub program_improvement_ideas: Vec<String>,
    pub comparison_notes: Vec<String>,
    pub winner: Winner,
    pub original_score: u32,
    pub optimized_score: u32,
    pub original_output: String,
    pub optimized_output: String,
}

impl AnalysisData {
    pub fn assemble(
        pair: &PromptPair,
        analysis: PromptAnalysis,
        optimized_system_prompt: Option<String>,
        comparison: PromptComparison,
        score: OutputScore,
    ) -> Self {
        Self {
            original_system_prompt: pair.system_prompt.clone(),
            optimized_system_prompt,
            user_prompt: pair.user_prompt.clone(),
            program_key: analysis.program_key,
            program_inputs: analysis.program_inputs,
            hallucination_risk: analysis.hallucination_risk,
            hallucination_targets: analysis.hallucination_targets,
            program_improvement_ideas: analysis.program_improvement_ideas,
            comparison_notes: score.comparison_notes,
            winner: score.winner,
            original_score: score.input_1,
            optimized_score: score.input_2,
            original_output: comparison.original_output,
            optimized_output: comparison.optimized_output,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AnalysisData {
        AnalysisData {
            original_system_prompt: Some("Rewrite in Shakespeare's style.".into()),
            optimized_system_prompt: Some("Rewrite in Early Modern English verse.".into()),
            user_prompt: "I need 100 eggs.".into(),
            program_key: "style_transfer".into(),
            program_inputs: vec!["poem".into()],
            hallucination_risk: "low".into(),
            hallucination_targets: vec!["100 eggs".into()],
            program_improvement_ideas: vec!["name the meter".into()],
            comparison_notes: vec!["second keeps the count".into()],
            winner: Winner::Input2,
            original_score: 70,
            optimized_score: 88,
            original_output: "Forsooth".into(),
            optimized_output: "Hark".into(),
        }
    }

    #[test]
    fn analysis_data_survives_json() {
        let data = sample();
        let text = serde_json::to_string(&data).unwrap();
        let back: AnalysisData = serde_json::from_str(&text).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn winner_uses_wire_names() {
        assert_eq!(serde_json::to_string(&Winner::Input1).unwrap(), "\"input_1\"");
        assert_eq!(serde_json::from_str::<Winner>("\"tie\"").unwrap(), Winner::Tie);
        assert!(serde_json::from_str::<Winner>("\"input_3\"").is_err());
        assert!(serde_json::from_str::<Winner>("\"Tie\"").is_err());
    }

    #[test]
    fn score_range_is_enforced() {
        let mut score = OutputScore {
            input_1: 1,
            input_2: 100,
            comparison_notes: vec![],
            winner: Winner::Tie,
        };
        assert!(score.validate().is_ok());

        score.input_1 = 0;
        assert!(score.validate().unwrap_err().contains("input_1"));

        score.input_1 = 50;
        score.input_2 = 101;
        assert!(score.validate().unwrap_err().contains("input_2"));
    }

    #[test]
    fn blank_system_prompt_falls_back_to_user_prompt() {
        let pair = PromptPair::new(Some("   ".into()), "hello");
        assert_eq!(pair.system_prompt(), None);
        assert_eq!(pair.subject(), "hello");

        let pair = PromptPair::new(Some("Be terse.".into()), "hello");
        assert_eq!(pair.subject(), "Be terse.");
    }

    #[test]
    fn missing_reasoning_is_allowed() {
        let json = r#"{
            "program_key": "k",
            "program_inputs": [],
            "hallucination_risk": "none",
            "hallucination_targets": [],
            "program_improvement_ideas": []
        }"#;
        let analysis: PromptAnalysis = serde_json::from_str(json).unwrap();
        assert_eq!(analysis.reasoning, None);
    }
}
