use crate::ai::agents::PromptAgents;
use crate::ai::client::ChatClient;
use crate::core::models::{AnalysisData, PromptPair};
use crate::core::trace::{CallTracer, Stage};
use crate::error::PrompterError;
use std::sync::Arc;

pub struct Orchestrator {
    agents: PromptAgents,
}

impl Orchestrator {
    pub fn new(client: Arc<dyn ChatClient>, model: impl Into<String>) -> Self {
        Self { agents: PromptAgents::new(client, model, CallTracer::new()) }
    }

    pub fn tracer(&self) -> &CallTracer {
        self.agents.tracer()
    }

    /// Analyze, optimize, compare, score. Any failure aborts the run.
    pub async fn generate_responses(&self, pair: &PromptPair) -> Result<AnalysisData, PrompterError> {
        self.tracer()
            .record(Stage::Orchestrate, self.run_stages(pair))
            .await
    }

    async fn run_stages(&self, pair: &PromptPair) -> Result<AnalysisData, PrompterError> {
        let subject = pair.subject();
        let is_system_prompt = pair.system_prompt().is_some();

        log::info!("🔍 Phase 1: Analysis");
        let analysis = self.agents.analyze_prompt(subject, is_system_prompt).await?;
        log::info!("   -> Program Key: {}", analysis.program_key);
        log::info!("   -> Program Inputs: {}", analysis.program_inputs.join(", "));
        log::info!("   -> Hallucination Risk: {}", analysis.hallucination_risk);
        log::info!("   -> Hallucination Targets: {}", analysis.hallucination_targets.join(", "));
        log::info!(
            "   -> Program Improvement Ideas: {}",
            analysis.program_improvement_ideas.join(", ")
        );

        log::info!("✍️  Phase 2: Optimization");
        let optimized = self.agents.optimize_prompt(&analysis, subject).await?;
        log::info!("   -> Optimized: {}", optimized.optimized_prompt);
        for improvement in &optimized.improvements {
            log::info!("      - {improvement}");
        }
        let optimized_system_prompt = Some(optimized.optimized_prompt);

        log::info!("⚖️  Phase 3: Comparison");
        let comparison = self
            .agents
            .compare_outputs(pair, optimized_system_prompt.as_deref())
            .await?;

        log::info!("🏁 Phase 4: Scoring");
        let score = self
            .agents
            .score_outputs(pair, &comparison.original_output, &comparison.optimized_output)
            .await?;
        log::info!(
            "   -> Original {}/100, Optimized {}/100, Winner: {}",
            score.input_1,
            score.input_2,
            score.winner
        );

        Ok(AnalysisData::assemble(
            pair,
            analysis,
            optimized_system_prompt,
            comparison,
            score,
        ))
    }
}
