use std::time::Duration;

/// How a single submitted task ended.
#[derive(Debug)]
pub enum TaskOutcome {
    Completed,
    /// The task returned an error or panicked.
    Failed(anyhow::Error),
    TimedOut(Duration),
    /// The pool shut down before the task could run.
    Dropped,
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Completed)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TaskOutcome::Failed(_) | TaskOutcome::TimedOut(_))
    }
}

/// Per-task outcomes of one `execute_tasks` batch, in submission order.
#[derive(Debug, Default)]
pub struct BatchReport {
    outcomes: Vec<TaskOutcome>,
}

impl BatchReport {
    pub(crate) fn new(outcomes: Vec<TaskOutcome>) -> Self {
        Self { outcomes }
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn completed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }

    pub fn dropped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, TaskOutcome::Dropped))
            .count()
    }

    /// Index and outcome of every task that did not complete successfully.
    pub fn failures(&self) -> impl Iterator<Item = (usize, &TaskOutcome)> {
        self.outcomes
            .iter()
            .enumerate()
            .filter(|(_, outcome)| !outcome.is_success())
    }

    pub fn outcomes(&self) -> &[TaskOutcome] {
        &self.outcomes
    }

    pub fn into_outcomes(self) -> Vec<TaskOutcome> {
        self.outcomes
    }
}
