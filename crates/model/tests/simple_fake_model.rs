use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::future::{poll_fn, ready};
use std::pin::Pin;
use std::task::{self, Poll, ready};
use std::time::Duration;

use quill_model::{
    ErrorKind, ModelFinishReason, ModelInfo, ModelMessage, ModelProvider,
    ModelProviderError, ModelRequest, ModelResponse, ModelResponseEvent,
};
use tokio::time::{Sleep, sleep};

#[derive(Debug)]
struct FakeModelProviderError(ErrorKind);

impl Display for FakeModelProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Error for FakeModelProviderError {}

impl ModelProviderError for FakeModelProviderError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

/// Streams a canned answer sentence by sentence, then reports how it
/// finished.
#[derive(Debug)]
struct FakeModelResponse {
    sentences: VecDeque<String>,
    finish_reason: Option<ModelFinishReason>,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl FakeModelResponse {
    fn new(answer: &str, finish_reason: ModelFinishReason) -> Self {
        Self {
            sentences: answer.split_inclusive(". ").map(Into::into).collect(),
            finish_reason: Some(finish_reason),
            sleep: None,
        }
    }
}

impl ModelResponse for FakeModelResponse {
    type Error = FakeModelProviderError;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.get_mut();
        if let Some(sleep) = &mut this.sleep {
            ready!(sleep.as_mut().poll(cx));
            this.sleep = None;

            if let Some(sentence) = this.sentences.pop_front() {
                return Poll::Ready(Ok(Some(
                    ModelResponseEvent::MessageDelta(sentence),
                )));
            }
            return Poll::Ready(Ok(this
                .finish_reason
                .take()
                .map(ModelResponseEvent::Completed)));
        }
        this.sleep = Some(Box::pin(sleep(Duration::from_millis(1))));
        Pin::new(this).poll_next_event(cx)
    }
}

/// A writer model: the answer depends on the task in the last user
/// message, and the temperature must be a valid sampling temperature.
struct FakeModelProvider;

impl ModelProvider for FakeModelProvider {
    type Error = FakeModelProviderError;
    type Response = FakeModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let result = 'blk: {
            if req.temperature.is_some_and(|t| !(0.0..=1.0).contains(&t)) {
                break 'blk Err(FakeModelProviderError(ErrorKind::Other));
            }
            let Some(ModelMessage::User(task)) = req.messages.last() else {
                break 'blk Err(FakeModelProviderError(ErrorKind::Other));
            };
            if task.contains("weapon") {
                break 'blk Err(FakeModelProviderError(ErrorKind::Moderated));
            }
            let resp = if task.contains("blogpost") {
                FakeModelResponse::new(
                    "AI tutors adapt to students. Teachers gain time.",
                    ModelFinishReason::Stop,
                )
            } else if task.contains("essay") {
                FakeModelResponse::new(
                    "AI is changing schools. It",
                    ModelFinishReason::MaxTokens,
                )
            } else {
                FakeModelResponse::new("", ModelFinishReason::Safety)
            };
            Ok(resp)
        };
        ready(result)
    }

    fn list_models(
        &self,
    ) -> impl Future<Output = Result<Vec<ModelInfo>, Self::Error>> + Send + 'static
    {
        ready(Ok(vec![
            ModelInfo::new("models/gemini-2.0-flash", true),
            ModelInfo::new("models/text-embedding-004", false),
        ]))
    }
}

fn task_request(task: &str, temperature: Option<f64>) -> ModelRequest {
    ModelRequest {
        messages: vec![
            ModelMessage::System("You are Writer.".to_owned()),
            ModelMessage::User(task.to_owned()),
        ],
        temperature,
    }
}

async fn complete(
    req: &ModelRequest,
) -> Result<(String, Option<ModelFinishReason>), FakeModelProviderError> {
    let mut resp = FakeModelProvider.send_request(req).await?;

    let mut text = String::new();
    let mut finish_reason = None;
    while let Some(event) =
        poll_fn(|cx| Pin::new(&mut resp).poll_next_event(cx)).await?
    {
        match event {
            ModelResponseEvent::MessageDelta(delta) => text.push_str(&delta),
            ModelResponseEvent::Completed(reason) => {
                assert!(finish_reason.is_none(), "completed twice");
                finish_reason = Some(reason);
            }
        }
    }
    Ok((text, finish_reason))
}

#[tokio::test]
async fn test_completion() {
    let req = task_request(
        "Write a 3-sentence blogpost about AI in education",
        Some(0.7),
    );
    let (text, finish_reason) = complete(&req).await.unwrap();
    assert_eq!(text, "AI tutors adapt to students. Teachers gain time.");
    assert_eq!(finish_reason, Some(ModelFinishReason::Stop));
}

#[tokio::test]
async fn test_finish_reasons() {
    let (text, finish_reason) =
        complete(&task_request("Write a long essay", None)).await.unwrap();
    assert_eq!(text, "AI is changing schools. It");
    assert_eq!(finish_reason, Some(ModelFinishReason::MaxTokens));

    // A filtered answer completes without any text.
    let (text, finish_reason) =
        complete(&task_request("Write a rumor", None)).await.unwrap();
    assert!(text.is_empty());
    assert_eq!(finish_reason, Some(ModelFinishReason::Safety));
}

#[tokio::test]
async fn test_error() {
    let err = complete(&ModelRequest::default()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Other);

    let err = complete(&task_request("Describe a weapon", None))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Moderated);

    let err = complete(&task_request("Write a blogpost", Some(1.5)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Other);
}

#[tokio::test]
async fn test_list_models() {
    let models = FakeModelProvider.list_models().await.unwrap();
    let generating: Vec<_> = models
        .iter()
        .filter(|m| m.can_generate)
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(generating, ["models/gemini-2.0-flash"]);
    assert!(models.iter().all(|m| m.display_name.is_none()));
}

#[test]
fn test_prompt_text() {
    let req = task_request("Say hi", None);
    assert_eq!(req.prompt_text(), "You are Writer.\n\nSay hi");
    assert_eq!(ModelRequest::default().prompt_text(), "");
}
