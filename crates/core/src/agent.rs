mod builder;

pub use builder::AgentBuilder;

/// An agent: a role to play, a goal to pursue and a backstory that shapes
/// how it writes, plus the sampling settings used for its requests.
///
/// Agents are plain values. The [`Crew`](crate::Crew) that runs them owns
/// the model client.
#[derive(Clone, Debug, PartialEq)]
pub struct Agent {
    pub(crate) role: String,
    pub(crate) goal: String,
    pub(crate) backstory: String,
    pub(crate) temperature: Option<f64>,
}

impl Agent {
    /// Returns a builder for an agent with the given role.
    #[inline]
    pub fn builder<S: Into<String>>(role: S) -> AgentBuilder {
        AgentBuilder::with_role(role)
    }

    /// Returns the role of this agent.
    #[inline]
    pub fn role(&self) -> &str {
        &self.role
    }

    /// Returns the goal of this agent.
    #[inline]
    pub fn goal(&self) -> &str {
        &self.goal
    }

    /// Returns the backstory of this agent.
    #[inline]
    pub fn backstory(&self) -> &str {
        &self.backstory
    }

    /// Returns the sampling temperature, if one is set.
    #[inline]
    pub fn temperature(&self) -> Option<f64> {
        self.temperature
    }
}
