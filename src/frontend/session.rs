//! Interactive session for the blind evaluation game.
//!
//! The session moves through three screens:
//!
//! ```text
//! Input --submit--> Evaluate --show_analysis--> Analysis --try_again--> Input
//! ```
//!
//! Display order of the two responses is shuffled per run, but the LLM verdict
//! in [`AnalysisData`] always keeps `input_1` = original. The user's own
//! preference is resolved back to original/optimized here and never touches
//! that verdict.

use crate::core::models::{AnalysisData, PromptPair};
use crate::error::PrompterError;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Input,
    Evaluate,
    Analysis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Original,
    Optimized,
    Tie,
}

/// Which output is shown as "Response A".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlindOrder {
    OriginalFirst,
    OptimizedFirst,
}

impl BlindOrder {
    pub fn for_outputs(original_output: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        original_output.hash(&mut hasher);
        if hasher.finish() % 2 == 0 {
            BlindOrder::OriginalFirst
        } else {
            BlindOrder::OptimizedFirst
        }
    }

    /// `(response_a, response_b)`
    pub fn arrange<'a>(self, data: &'a AnalysisData) -> (&'a str, &'a str) {
        match self {
            BlindOrder::OriginalFirst => (&data.original_output, &data.optimized_output),
            BlindOrder::OptimizedFirst => (&data.optimized_output, &data.original_output),
        }
    }

    fn preferred(self, response_a_score: u8, response_b_score: u8) -> Choice {
        use std::cmp::Ordering::*;
        match (response_a_score.cmp(&response_b_score), self) {
            (Equal, _) => Choice::Tie,
            (Greater, BlindOrder::OriginalFirst) | (Less, BlindOrder::OptimizedFirst) => Choice::Original,
            _ => Choice::Optimized,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserEvaluation {
    pub response_a_score: u8,
    pub response_b_score: u8,
    pub preferred: Choice,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub original: usize,
    pub optimized: usize,
    pub tie: usize,
}

#[derive(Debug)]
pub struct Session {
    screen: Screen,
    last_input: PromptPair,
    analysis: Option<AnalysisData>,
    order: BlindOrder,
    rated: bool,
    evaluations: Vec<UserEvaluation>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            screen: Screen::Input,
            last_input: PromptPair::default(),
            analysis: None,
            order: BlindOrder::OriginalFirst,
            rated: false,
            evaluations: Vec::new(),
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Input to prefill the form with on the next round.
    pub fn last_input(&self) -> &PromptPair {
        &self.last_input
    }

    pub fn analysis(&self) -> Option<&AnalysisData> {
        self.analysis.as_ref()
    }

    pub fn submit(&mut self, pair: PromptPair, data: AnalysisData) -> Result<(), PrompterError> {
        self.require(Screen::Input, "submit")?;
        self.order = BlindOrder::for_outputs(&data.original_output);
        self.last_input = pair;
        self.analysis = Some(data);
        self.rated = false;
        self.screen = Screen::Evaluate;
        Ok(())
    }

    pub fn blind_responses(&self) -> Result<(&str, &str), PrompterError> {
        self.require(Screen::Evaluate, "view responses")?;
        Ok(self.order.arrange(self.current()?))
    }

    /// Records the user's ratings. Each run is rated at most once.
    pub fn rate(&mut self, response_a_score: u8, response_b_score: u8) -> Result<UserEvaluation, PrompterError> {
        self.require(Screen::Evaluate, "rate")?;
        if self.rated {
            return Err(PrompterError::Session("this run has already been rated".into()));
        }
        for score in [response_a_score, response_b_score] {
            if !(MIN_RATING..=MAX_RATING).contains(&score) {
                return Err(PrompterError::Session(format!(
                    "rating {score} is outside {MIN_RATING}..={MAX_RATING}"
                )));
            }
        }
        let evaluation = UserEvaluation {
            response_a_score,
            response_b_score,
            preferred: self.order.preferred(response_a_score, response_b_score),
        };
        self.evaluations.push(evaluation);
        self.rated = true;
        Ok(evaluation)
    }

    pub fn show_analysis(&mut self) -> Result<&AnalysisData, PrompterError> {
        self.require(Screen::Evaluate, "show analysis")?;
        self.screen = Screen::Analysis;
        self.current()
    }

    pub fn try_again(&mut self) -> Result<(), PrompterError> {
        self.require(Screen::Analysis, "try again")?;
        self.screen = Screen::Input;
        Ok(())
    }

    pub fn tally(&self) -> Tally {
        self.evaluations.iter().fold(Tally::default(), |mut t, e| {
            match e.preferred {
                Choice::Original => t.original += 1,
                Choice::Optimized => t.optimized += 1,
                Choice::Tie => t.tie += 1,
            }
            t
        })
    }

    fn current(&self) -> Result<&AnalysisData, PrompterError> {
        self.analysis
            .as_ref()
            .ok_or_else(|| PrompterError::Session("no analysis available".into()))
    }

    fn require(&self, screen: Screen, action: &str) -> Result<(), PrompterError> {
        if self.screen == screen {
            Ok(())
        } else {
            Err(PrompterError::Session(format!(
                "cannot {action} from the {:?} screen",
                self.screen
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::Winner;

    fn data(original: &str, optimized: &str) -> AnalysisData {
        AnalysisData {
            original_system_prompt: Some("sys".into()),
            optimized_system_prompt: Some("better sys".into()),
            user_prompt: "user".into(),
            program_key: "key".into(),
            program_inputs: vec![],
            hallucination_risk: "low".into(),
            hallucination_targets: vec![],
            program_improvement_ideas: vec![],
            comparison_notes: vec![],
            winner: Winner::Input1,
            original_score: 80,
            optimized_score: 60,
            original_output: original.into(),
            optimized_output: optimized.into(),
        }
    }

    #[test]
    fn full_round_trip_through_screens() {
        let mut session = Session::new();
        assert_eq!(session.screen(), Screen::Input);
        assert_eq!(session.last_input(), &PromptPair::default());

        let pair = PromptPair::new(None, "eggs");
        session.submit(pair.clone(), data("orig", "opt")).unwrap();
        assert_eq!(session.screen(), Screen::Evaluate);

        let (a, b) = session.blind_responses().unwrap();
        let mut shown = [a, b];
        shown.sort();
        assert_eq!(shown, ["opt", "orig"]);

        session.rate(7, 3).unwrap();
        let shown = session.show_analysis().unwrap();
        assert_eq!(shown.winner, Winner::Input1);
        assert_eq!(session.screen(), Screen::Analysis);

        session.try_again().unwrap();
        assert_eq!(session.screen(), Screen::Input);
        assert_eq!(session.last_input(), &pair);
        assert!(session.analysis().is_some());
    }

    #[test]
    fn out_of_order_actions_are_rejected() {
        let mut session = Session::new();
        assert!(matches!(session.rate(5, 5), Err(PrompterError::Session(_))));
        assert!(session.show_analysis().is_err());
        assert!(session.try_again().is_err());
        assert!(session.blind_responses().is_err());

        session.submit(PromptPair::new(None, "x"), data("a", "b")).unwrap();
        assert!(session.submit(PromptPair::new(None, "y"), data("c", "d")).is_err());
        assert!(session.try_again().is_err());
    }

    #[test]
    fn ratings_must_be_in_range() {
        let mut session = Session::new();
        session.submit(PromptPair::new(None, "x"), data("a", "b")).unwrap();
        assert!(session.rate(0, 5).is_err());
        assert!(session.rate(5, 11).is_err());
        assert!(session.rate(1, 10).is_ok());
    }

    #[test]
    fn second_rating_is_rejected() {
        let mut session = Session::new();
        session.submit(PromptPair::new(None, "x"), data("a", "b")).unwrap();
        session.rate(9, 1).unwrap();
        assert!(matches!(session.rate(9, 1), Err(PrompterError::Session(_))));

        let tally = session.tally();
        assert_eq!(tally.original + tally.optimized, 1);
        assert_eq!(tally.tie, 0);

        session.show_analysis().unwrap();
        session.try_again().unwrap();
        session.submit(PromptPair::new(None, "y"), data("c", "d")).unwrap();
        assert!(session.rate(4, 4).is_ok());
    }

    #[test]
    fn preference_resolves_through_blind_order() {
        assert_eq!(BlindOrder::OriginalFirst.preferred(9, 2), Choice::Original);
        assert_eq!(BlindOrder::OptimizedFirst.preferred(9, 2), Choice::Optimized);
        assert_eq!(BlindOrder::OptimizedFirst.preferred(2, 9), Choice::Original);
        assert_eq!(BlindOrder::OriginalFirst.preferred(4, 4), Choice::Tie);
    }

    #[test]
    fn user_choice_follows_content_not_position() {
        let mut session = Session::new();
        let d = data("the original text", "the optimized text");
        session.submit(PromptPair::new(None, "x"), d).unwrap();

        let (a, _) = session.blind_responses().unwrap();
        let a_is_original = a == "the original text";
        let eval = session.rate(10, 1).unwrap();
        let expected = if a_is_original { Choice::Original } else { Choice::Optimized };
        assert_eq!(eval.preferred, expected);

        // The LLM verdict is left as produced.
        assert_eq!(session.analysis().unwrap().winner, Winner::Input1);
    }

    #[test]
    fn blind_order_is_deterministic_per_output() {
        assert_eq!(BlindOrder::for_outputs("same"), BlindOrder::for_outputs("same"));
    }

    #[test]
    fn tally_counts_preferences() {
        let mut session = Session::new();
        for (a, b) in [(9, 1), (1, 9), (5, 5)] {
            session.submit(PromptPair::new(None, "x"), data("o", "p")).unwrap();
            session.rate(a, b).unwrap();
            session.show_analysis().unwrap();
            session.try_again().unwrap();
        }
        let tally = session.tally();
        assert_eq!(tally.original + tally.optimized, 2);
        assert_eq!(tally.tie, 1);
    }
}
