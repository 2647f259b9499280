//! Scripted answers for tests and benches.

use super::{Ask, AskError, Validate};
use std::collections::VecDeque;

/// Deterministic ask capability.
///
/// Each call consumes one step. An answer step is run through the validator
/// and fails with [`AskError::Rejected`] when it does not pass; a failure step
/// is returned as-is. Labels are recorded in call order.
#[derive(Debug, Clone, Default)]
pub struct ScriptedAsk {
    steps: VecDeque<Result<String, AskError>>,
    asked: Vec<String>,
}

impl ScriptedAsk {
    /// Script that answers with `answers`, in order.
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            steps: answers.into_iter().map(|a| Ok(a.into())).collect(),
            asked: Vec::new(),
        }
    }

    /// Append an answer step.
    pub fn then_answer(mut self, answer: impl Into<String>) -> Self {
        self.steps.push_back(Ok(answer.into()));
        self
    }

    /// Append a failure step.
    pub fn then_fail(mut self, err: AskError) -> Self {
        self.steps.push_back(Err(err));
        self
    }

    /// Labels asked so far.
    pub fn asked(&self) -> &[String] {
        &self.asked
    }

    /// Steps not yet consumed.
    pub fn remaining(&self) -> usize {
        self.steps.len()
    }
}

impl Ask for ScriptedAsk {
    fn ask(&mut self, label: &str, validate: Validate<'_>) -> Result<String, AskError> {
        self.asked.push(label.to_string());
        let answer = self.steps.pop_front().ok_or(AskError::Exhausted)??;
        validate(&answer).map_err(AskError::Rejected)?;
        Ok(answer)
    }
}
