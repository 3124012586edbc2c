use quill_model::ModelFinishReason;

/// A unit of work given to one agent: what to do, and what a good answer
/// looks like.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Task {
    pub(crate) description: String,
    pub(crate) expected_output: String,
    pub(crate) agent_role: Option<String>,
}

impl Task {
    /// Creates a task with its description and expected-output hint.
    #[inline]
    pub fn new<D: Into<String>, E: Into<String>>(
        description: D,
        expected_output: E,
    ) -> Self {
        Self {
            description: description.into(),
            expected_output: expected_output.into(),
            agent_role: None,
        }
    }

    /// Assigns the task to the agent with the given role. Unassigned tasks
    /// go to the first agent of the crew.
    #[inline]
    pub fn with_agent<S: Into<String>>(mut self, role: S) -> Self {
        self.agent_role = Some(role.into());
        self
    }

    /// Returns the task description.
    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the expected-output hint.
    #[inline]
    pub fn expected_output(&self) -> &str {
        &self.expected_output
    }
}

/// The result of one finished task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskOutput {
    /// The description of the task.
    pub description: String,
    /// The role of the agent that ran the task.
    pub agent_role: String,
    /// The text generated by the model.
    pub raw: String,
    /// The reason the model stopped, if it reported one.
    pub finish_reason: Option<ModelFinishReason>,
}
