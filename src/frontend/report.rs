use crate::core::models::{AnalysisData, Winner};
use crate::error::PrompterError;
use std::fmt::Write;

const RULE: &str = "==================================================";

pub fn winner_banner(winner: Winner) -> &'static str {
    match winner {
        Winner::Input1 => "🏆 Winner: your original prompt",
        Winner::Input2 => "🏆 Winner: the optimized prompt",
        Winner::Tie => "🤝 It's a tie",
    }
}

/// Key/value rows of the analysis table; list values are newline-joined.
pub fn analysis_rows(data: &AnalysisData) -> [(&'static str, String); 5] {
    [
        ("Program key", data.program_key.clone()),
        ("Program inputs", data.program_inputs.join("\n")),
        ("Hallucination risk", data.hallucination_risk.clone()),
        ("Hallucination targets", data.hallucination_targets.join("\n")),
        ("Potential improvements", data.program_improvement_ideas.join("\n")),
    ]
}

/// Full text report of one run, in display order.
pub fn render(data: &AnalysisData, trace_link: Option<&str>) -> String {
    // Writing into a String cannot fail.
    let mut out = String::new();

    let _ = writeln!(out, "{}\n", winner_banner(data.winner));
    let _ = writeln!(out, "Original score:  {}/100", data.original_score);
    let _ = writeln!(out, "Optimized score: {}/100", data.optimized_score);

    let _ = writeln!(out, "\n## Prompts");
    if let Some(original) = &data.original_system_prompt {
        let _ = writeln!(out, "\nOriginal system prompt:\n{original}");
        let _ = writeln!(
            out,
            "\nOptimized system prompt:\n{}",
            data.optimized_system_prompt.as_deref().unwrap_or("(none)")
        );
    }
    let _ = writeln!(out, "\nUser prompt:\n{}", data.user_prompt.trim());

    let _ = writeln!(out, "\n## Outputs");
    let _ = writeln!(out, "\nOriginal Prompt Output:\n{RULE}\n{}", data.original_output);
    let _ = writeln!(out, "\nOptimized Prompt Output:\n{RULE}\n{}", data.optimized_output);

    let _ = writeln!(out, "\n## Optimization analysis\n");
    let rows = analysis_rows(data);
    let width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    for (key, value) in &rows {
        let mut lines = value.lines();
        let _ = writeln!(out, "{key:<width$} | {}", lines.next().unwrap_or(""));
        for line in lines {
            let _ = writeln!(out, "{:<width$} | {line}", "");
        }
    }

    let _ = writeln!(out, "\n## Comparison notes\n");
    for note in &data.comparison_notes {
        let _ = writeln!(out, "- {note}");
    }

    if let Some(link) = trace_link {
        let _ = writeln!(out, "\n## View traces\n{link}");
    }

    out
}

/// Stdout of a one-shot run: the text report, or bare JSON for piping.
pub fn run_output(data: &AnalysisData, json: bool, trace_link: Option<&str>) -> Result<String, PrompterError> {
    if json {
        Ok(serde_json::to_string_pretty(data)?)
    } else {
        Ok(render(data, trace_link))
    }
}
