use super::Agent;

/// [`Agent`] builder.
#[derive(Clone, Debug)]
pub struct AgentBuilder {
    role: String,
    goal: String,
    backstory: String,
    temperature: Option<f64>,
}

impl AgentBuilder {
    /// Creates a new builder with the specified role.
    #[inline]
    pub fn with_role<S: Into<String>>(role: S) -> Self {
        Self {
            role: role.into(),
            goal: String::new(),
            backstory: String::new(),
            temperature: None,
        }
    }

    /// Sets the goal.
    #[inline]
    pub fn with_goal<S: Into<String>>(mut self, goal: S) -> Self {
        self.goal = goal.into();
        self
    }

    /// Sets the backstory.
    #[inline]
    pub fn with_backstory<S: Into<String>>(mut self, backstory: S) -> Self {
        self.backstory = backstory.into();
        self
    }

    /// Sets the sampling temperature, passed to the model unchanged.
    #[inline]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Builds the agent.
    #[inline]
    pub fn build(self) -> Agent {
        Agent {
            role: self.role,
            goal: self.goal,
            backstory: self.backstory,
            temperature: self.temperature,
        }
    }
}
