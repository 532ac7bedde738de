pub const ANALYZER_PREAMBLE: &str = r#"LLMs can be viewed as continuous, interpolative databases that store both data and vector-based programs.
Unlike traditional databases, data is stored as points in a vector space, enabling interpolation between concepts.
Prompts act as search queries in this space. Use this to analyze the prompt below so that a better prompt can be written.

Include:
- **Program Key**: the instruction that points to a specific behavior in program space.
- **Program Inputs**: the data or context the program will act on.
- **Risk of Hallucination**: where interpolation may cause errors or unexpected outputs.
- **Hallucination Targets**: specific text that is at risk of hallucination.
- **Program Improvement Ideas**: ideas for improving the prompt.

Output must be a JSON object with the fields program_key, program_inputs, hallucination_risk,
hallucination_targets, program_improvement_ideas and, optionally, reasoning.
"#;

pub const OPTIMIZER_INSTRUCTION: &str = r#"You are a prompt optimization expert.
Using the provided prompt analysis, create an improved version of the original prompt.

Output must be a JSON object with:
- original_prompt: the input prompt being optimized, copied exactly
- optimized_prompt: the improved prompt text
- improvements: list of specific improvements made
"#;

pub const SCORER_RUBRIC: &str = r#"You are an expert prompt output evaluator. Score two different outputs based on:
1. Adherence to the original prompt's intent
2. Quality and creativity of the response
3. Coherence and clarity
4. Appropriate style and tone

Score each output from 1-100 and give specific reasons for the scores.

Output must be a JSON object with:
- input_1: integer score 1-100 for the first output
- input_2: integer score 1-100 for the second output
- comparison_notes: list of strings, each a specific observation about how the outputs differ
- winner: "input_1", "input_2", or "tie"
"#;
