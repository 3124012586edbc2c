//! The commands run by the `quill` CLI.
//!
//! Every command takes a [`ModelClient`] and a [`Printer`], and never
//! touches the environment, so they can be driven by a test model provider.

use std::io::Write;

use anyhow::Context as _;
use quill_core::{Agent, Crew, CrewBuilder, CrewOutput, ModelClient, Task};
use quill_model::{ModelMessage, ModelRequest};

use crate::Printer;

/// Role of the writer agent.
pub const WRITER_ROLE: &str = "Writer";
/// Goal of the writer agent.
pub const WRITER_GOAL: &str = "Write a short blog post about AI";
/// Backstory of the writer agent.
pub const WRITER_BACKSTORY: &str =
    "You are a tech writer who explains AI in simple words";
/// The default blog post task.
pub const BLOG_TASK: &str = "Write a 3-sentence blogpost about AI in education";
/// The expected output of the default blog post task.
pub const BLOG_EXPECTED_OUTPUT: &str =
    "A concise 3-sentence blog post about AI in education";

/// The prompt sent by [`check_key`], the same task the writer gets.
pub const KEY_CHECK_PROMPT: &str = BLOG_TASK;

/// Settings of the blog writer.
#[derive(Clone, Debug, PartialEq)]
pub struct BlogPostSettings {
    /// The model id, shown in the start banner.
    pub model: String,
    /// Sampling temperature of the writer agent.
    pub temperature: f64,
    /// What the writer is asked to do.
    pub task: String,
    /// The criteria of the final answer.
    pub expected_output: String,
}

impl BlogPostSettings {
    /// Creates settings for the default blog post task.
    pub fn new<S: Into<String>>(model: S, temperature: f64) -> Self {
        Self {
            model: model.into(),
            temperature,
            task: BLOG_TASK.to_owned(),
            expected_output: BLOG_EXPECTED_OUTPUT.to_owned(),
        }
    }
}

/// Builds the single-agent crew that writes the blog post.
pub fn writer_crew(
    model_client: ModelClient,
    settings: &BlogPostSettings,
    on_transcript: impl Fn(&str) + Send + Sync + 'static,
) -> Crew {
    let writer = Agent::builder(WRITER_ROLE)
        .with_goal(WRITER_GOAL)
        .with_backstory(WRITER_BACKSTORY)
        .with_temperature(settings.temperature)
        .build();
    let task = Task::new(&settings.task, &settings.expected_output);
    CrewBuilder::with_model_client(model_client)
        .with_agent(writer)
        .with_task(task)
        .on_transcript(on_transcript)
        .build()
}

/// Callbacks around the crew run of [`write_blog_post`].
#[derive(Debug)]
pub struct Hooks<S, F> {
    /// Called after the start banner, right before the crew runs.
    pub on_started: S,
    /// Called when the crew has finished, before anything else is printed.
    pub on_finished: F,
}

impl Hooks<fn(), fn()> {
    /// Hooks that do nothing.
    pub fn none() -> Self {
        Self {
            on_started: || {},
            on_finished: || {},
        }
    }
}

/// Runs the writer crew and prints the blog post.
///
/// Crew failures are returned, and nothing but the start banner is printed
/// for them.
pub async fn write_blog_post<W, S, F>(
    crew: &Crew,
    settings: &BlogPostSettings,
    printer: &mut Printer<W>,
    hooks: Hooks<S, F>,
) -> anyhow::Result<CrewOutput>
where
    W: Write,
    S: FnOnce(),
    F: FnOnce(),
{
    printer.blog_post_start(&settings.model)?;

    (hooks.on_started)();
    let result = crew.kickoff().await;
    (hooks.on_finished)();

    let output = result.context("failed to write the blog post")?;
    printer.blog_post(&output.raw)?;
    Ok(output)
}

/// Sends the blog task as a bare prompt to verify that the credential works.
///
/// Failures are printed, not returned. Only output errors are returned.
pub async fn check_key<W: Write>(
    model_client: &ModelClient,
    printer: &mut Printer<W>,
) -> std::io::Result<()> {
    let req = ModelRequest {
        messages: vec![ModelMessage::User(KEY_CHECK_PROMPT.to_owned())],
        temperature: None,
    };
    match model_client.send_request(req, |_| {}).await {
        Ok(resp) => printer.key_check_success(&resp.transcript),
        Err(err) => {
            warn!("key check failed: {err}");
            printer.key_check_error(&err)
        }
    }
}

/// Prints the models that support content generation.
///
/// Failures are printed, not returned. Only output errors are returned.
pub async fn list_models<W: Write>(
    model_client: &ModelClient,
    printer: &mut Printer<W>,
) -> std::io::Result<()> {
    match model_client.list_models().await {
        Ok(models) => {
            debug!("got {} models", models.len());
            printer.model_list(&models)
        }
        Err(err) => printer.model_list_error(&err),
    }
}

/// Validates a sampling temperature given on the command line.
pub fn parse_temperature(s: &str) -> Result<f64, String> {
    let temperature: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("`{s}` is not a number"))?;
    if !(0.0..=1.0).contains(&temperature) {
        return Err(format!("temperature {temperature} is not in [0, 1]"));
    }
    Ok(temperature)
}
