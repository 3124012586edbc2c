use crate::{Agent, Task};

pub(crate) fn system_prompt(agent: &Agent) -> String {
    let mut prompt = format!("You are {}.", agent.role);
    if !agent.backstory.is_empty() {
        prompt.push(' ');
        prompt.push_str(&agent.backstory);
    }
    if !agent.goal.is_empty() {
        prompt.push_str("\nYour personal goal is: ");
        prompt.push_str(&agent.goal);
    }
    prompt
}

pub(crate) fn task_prompt(task: &Task, context: Option<&str>) -> String {
    let mut prompt = format!(
        "Current Task: {}\n\n\
         This is the expected criteria for your final answer: {}\n\
         you MUST return the actual complete content as the final answer, \
         not a summary.",
        task.description, task.expected_output
    );
    if let Some(context) = context {
        prompt.push_str("\n\nThis is the context you're working with:\n");
        prompt.push_str(context);
    }
    prompt
}
