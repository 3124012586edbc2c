mod prompt;

use std::fmt::{self, Display};
use std::sync::Arc;

use quill_model::{ModelFinishReason, ModelMessage, ModelProvider, ModelRequest};

use crate::error::Error;
use crate::model_client::ModelClient;
use crate::{Agent, Task, TaskOutput};

type TranscriptFn = Arc<dyn Fn(&str) + Send + Sync>;

/// [`Crew`] builder.
pub struct CrewBuilder {
    model_client: ModelClient,
    agents: Vec<Agent>,
    tasks: Vec<Task>,
    on_transcript: Option<TranscriptFn>,
}

impl CrewBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(provider: P) -> Self {
        Self::with_model_client(ModelClient::new(provider))
    }

    /// Creates a new builder sharing an existing model client.
    #[inline]
    pub fn with_model_client(model_client: ModelClient) -> Self {
        Self {
            model_client,
            agents: vec![],
            tasks: vec![],
            on_transcript: None,
        }
    }

    /// Adds an agent.
    #[inline]
    pub fn with_agent(mut self, agent: Agent) -> Self {
        self.agents.push(agent);
        self
    }

    /// Appends a task. Tasks run in the order they are added.
    #[inline]
    pub fn with_task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    /// Attaches a callback to be invoked with every piece of text the model
    /// streams back.
    #[inline]
    pub fn on_transcript(
        mut self,
        on_transcript: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        self.on_transcript = Some(Arc::new(on_transcript));
        self
    }

    /// Builds the crew.
    #[inline]
    pub fn build(self) -> Crew {
        Crew {
            model_client: self.model_client,
            agents: self.agents,
            tasks: self.tasks,
            on_transcript: self.on_transcript,
        }
    }
}

/// A set of agents and the tasks they work on, run sequentially.
///
/// Each task is one model request. The output of a task is handed to the
/// next one as context, and the output of the last task is the output of
/// the crew.
pub struct Crew {
    model_client: ModelClient,
    agents: Vec<Agent>,
    tasks: Vec<Task>,
    on_transcript: Option<TranscriptFn>,
}

impl Crew {
    /// Returns the tasks of this crew.
    #[inline]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Builds the request for the task at `task_idx` without sending it.
    ///
    /// The request depends only on the agent, the task and `context`, so
    /// the same inputs always produce an equal request.
    pub fn build_request(
        &self,
        task_idx: usize,
        context: Option<&str>,
    ) -> Result<ModelRequest, Error> {
        let task = self
            .tasks
            .get(task_idx)
            .ok_or_else(|| Error::unknown_task(task_idx, self.tasks.len()))?;
        let agent = self.agent_for(task)?;
        Ok(ModelRequest {
            messages: vec![
                ModelMessage::System(prompt::system_prompt(agent)),
                ModelMessage::User(prompt::task_prompt(task, context)),
            ],
            temperature: agent.temperature,
        })
    }

    /// Runs all tasks in order and returns the final output.
    ///
    /// The first error stops the crew and is returned as is, nothing is
    /// retried.
    pub async fn kickoff(&self) -> Result<CrewOutput, Error> {
        if self.tasks.is_empty() {
            return Err(Error::no_tasks());
        }

        let mut tasks_output: Vec<TaskOutput> = vec![];
        for (task_idx, task) in self.tasks.iter().enumerate() {
            let agent = self.agent_for(task)?;
            let context = tasks_output.last().map(|o| o.raw.as_str());
            let request = self.build_request(task_idx, context)?;

            info!(agent = %agent.role, "starting task: {}", task.description);
            let on_transcript = self.on_transcript.clone();
            let resp = self
                .model_client
                .send_request(request, move |delta| {
                    if let Some(on_transcript) = &on_transcript {
                        on_transcript(delta);
                    }
                })
                .await?;

            if resp.transcript.trim().is_empty() {
                return Err(match resp.finish_reason {
                    Some(ModelFinishReason::Safety) => {
                        Error::moderated("response stopped by safety filter")
                    }
                    _ => Error::empty_output(),
                });
            }
            if resp.finish_reason == Some(ModelFinishReason::MaxTokens) {
                warn!("task output was cut at the token limit");
            }
            info!(
                agent = %agent.role,
                chars = resp.transcript.len(),
                "finished task: {}",
                task.description
            );

            tasks_output.push(TaskOutput {
                description: task.description.clone(),
                agent_role: agent.role.clone(),
                raw: resp.transcript,
                finish_reason: resp.finish_reason,
            });
        }

        let raw = tasks_output
            .last()
            .map(|o| o.raw.clone())
            .unwrap_or_default();
        Ok(CrewOutput { raw, tasks_output })
    }

    fn agent_for(&self, task: &Task) -> Result<&Agent, Error> {
        match &task.agent_role {
            Some(role) => self
                .agents
                .iter()
                .find(|a| &a.role == role)
                .ok_or_else(|| Error::unknown_agent(role)),
            None => self
                .agents
                .first()
                .ok_or_else(|| Error::unknown_agent("<none>")),
        }
    }
}

/// The output of a finished crew.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CrewOutput {
    /// The text of the last task.
    pub raw: String,
    /// Outputs of every task, in order.
    pub tasks_output: Vec<TaskOutput>,
}

impl Display for CrewOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
