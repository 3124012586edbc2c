use std::pin::Pin;
use std::task::{Context, Poll, ready};

use pin_project_lite::pin_project;
use quill_model::{
    ErrorKind, ModelFinishReason, ModelResponse, ModelResponseEvent,
};

use crate::Error;
use crate::io::{Sse, SseError};
use crate::proto::{self, GenerateContentChunk};

struct PartialState {
    sse: Sse,
    // This field will be cleared after the response returns the complete event.
    pending_finish_reason: Option<ModelFinishReason>,
    finished: bool,
}

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextEvent = Result<(Option<ModelResponseEvent>, PartialState), Error>;

pin_project! {
    pub struct GeminiResponse {
        next_event_fut: Option<PinnedFuture<NextEvent>>,
    }
}

impl GeminiResponse {
    #[inline]
    pub fn from_sse(sse: Sse) -> Self {
        let partial_state = PartialState {
            sse,
            pending_finish_reason: None,
            finished: false,
        };
        let next_event_fut = async move { next_event(partial_state).await };
        Self {
            next_event_fut: Some(Box::pin(next_event_fut)),
        }
    }
}

impl ModelResponse for GeminiResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.project();
        let Some(next_event_fut) = this.next_event_fut else {
            return Poll::Ready(Ok(None));
        };
        let (event, partial_state) =
            match ready!(next_event_fut.as_mut().poll(cx)) {
                Ok((Some(event), partial_state)) => (event, partial_state),
                Ok((None, _)) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Ok(None));
                }
                Err(err) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Err(err));
                }
            };

        // The stream may still have more data to pull, create a new future for
        // the next event.
        let next_event_fut = async move { next_event(partial_state).await };
        *this.next_event_fut = Some(Box::pin(next_event_fut));

        Poll::Ready(Ok(Some(event)))
    }
}

async fn next_event(
    mut partial_state: PartialState,
) -> Result<(Option<ModelResponseEvent>, PartialState), Error> {
    let sse = &mut partial_state.sse;
    let mut message_delta = String::new();

    loop {
        let sse_event = match sse.next_event().await {
            Ok(Some(event)) => event,
            Ok(None) if partial_state.finished || !message_delta.is_empty() => {
                break;
            }
            Ok(None) => {
                return Err(Error::new(
                    "stream ended before finishReason",
                    ErrorKind::Transport,
                ));
            }
            Err(SseError::ChunksError(_) | SseError::UnexpectedEof) => {
                return Err(Error::new(
                    "connection closed while reading the response",
                    ErrorKind::Transport,
                ));
            }
            Err(err) => {
                return Err(Error::new(format!("{err:?}"), ErrorKind::Other));
            }
        };
        trace!("got sse event: {sse_event}");

        let chunk = serde_json::from_str::<GenerateContentChunk>(&sse_event)
            .map_err(|err| Error::new(format!("{err}"), ErrorKind::Other))?;
        if let Some(api_error) = chunk.error {
            return Err(Error::from_api_error(None, api_error));
        }
        if let Some(block_reason) =
            chunk.prompt_feedback.and_then(|f| f.block_reason)
        {
            return Err(Error::new(
                format!("prompt blocked: {block_reason}"),
                ErrorKind::Moderated,
            ));
        }

        // Only the first candidate is requested.
        let Some(candidate) = chunk.candidates.into_iter().next() else {
            continue;
        };
        for part in candidate.content.into_iter().flat_map(|c| c.parts) {
            if !part.thought {
                message_delta.push_str(&part.text);
            }
        }
        if let Some(reason) = candidate.finish_reason {
            partial_state.pending_finish_reason =
                Some(proto::finish_reason(&reason));
            partial_state.finished = true;
        }

        if !message_delta.is_empty()
            || partial_state.pending_finish_reason.is_some()
        {
            break;
        }
    }

    // Always emit message delta first, then the pending finish reason.

    if !message_delta.is_empty() {
        return Ok((
            Some(ModelResponseEvent::MessageDelta(message_delta)),
            partial_state,
        ));
    }

    if let Some(finish_reason) = partial_state.pending_finish_reason.take() {
        return Ok((
            Some(ModelResponseEvent::Completed(finish_reason)),
            partial_state,
        ));
    }

    Ok((None, partial_state))
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use bytes::Bytes;
    use quill_model::ModelProviderError;

    use super::*;
    use crate::io::Chunks;

    async fn collect(
        payload: &'static [u8],
    ) -> Result<(String, Vec<ModelFinishReason>), Error> {
        let chunks = Chunks::from_vec_deque(
            vec![Bytes::from_static(payload)].into(),
        );
        let mut resp = pin!(GeminiResponse::from_sse(Sse::new(chunks)));
        let mut text = String::new();
        let mut reasons = vec![];
        while let Some(event) =
            poll_fn(|cx| resp.as_mut().poll_next_event(cx)).await?
        {
            match event {
                ModelResponseEvent::MessageDelta(delta) => {
                    text.push_str(&delta)
                }
                ModelResponseEvent::Completed(reason) => reasons.push(reason),
            }
        }
        Ok((text, reasons))
    }

    #[tokio::test]
    async fn test_simple_events() {
        let (text, reasons) =
            collect(include_bytes!("../fixtures/test_response.txt"))
                .await
                .unwrap();
        assert_eq!(
            text,
            "AI tutors can adapt lessons to each student. Teachers gain time \
             for mentoring. Schools must still guard student privacy."
        );
        assert_eq!(reasons, vec![ModelFinishReason::Stop]);
    }

    #[tokio::test]
    async fn test_text_and_finish_in_one_chunk() {
        let (text, reasons) = collect(
            b"data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":\
              [{\"text\":\"Done.\"}]},\"finishReason\":\"MAX_TOKENS\"}]}\r\n\r\n",
        )
        .await
        .unwrap();
        assert_eq!(text, "Done.");
        assert_eq!(reasons, vec![ModelFinishReason::MaxTokens]);
    }

    #[tokio::test]
    async fn test_thought_parts_are_skipped() {
        let (text, _) = collect(
            b"data: {\"candidates\":[{\"content\":{\"parts\":[\
              {\"text\":\"hmm\",\"thought\":true},{\"text\":\"Hi\"}]},\
              \"finishReason\":\"STOP\"}]}\n\n",
        )
        .await
        .unwrap();
        assert_eq!(text, "Hi");
    }

    #[tokio::test]
    async fn test_blocked_prompt() {
        let err = collect(
            b"data: {\"promptFeedback\":{\"blockReason\":\"SAFETY\"}}\n\n",
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Moderated);
        assert!(err.message().contains("SAFETY"));
    }

    #[tokio::test]
    async fn test_error_event() {
        let err = collect(
            b"data: {\"error\":{\"code\":429,\"message\":\"Resource has been \
              exhausted\",\"status\":\"RESOURCE_EXHAUSTED\"}}\n\n",
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
        assert_eq!(err.message(), "Resource has been exhausted");
    }

    #[tokio::test]
    async fn test_cut_off_response() {
        // The connection closes in the middle of the second event.
        let err = collect(
            b"data: {\"candidates\":[{\"content\":{\"parts\":\
              [{\"text\":\"AI tutors\"}]}}]}\r\n\r\n\
              data: {\"candidates\":[{\"content\":{\"parts\":\
              [{\"text\":\" adapt les",
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);

        // Complete events, but the stream never reports a finish reason.
        let err = collect(
            b"data: {\"candidates\":[{\"content\":{\"parts\":\
              [{\"text\":\"AI tutors\"}]}}]}\n\n",
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(err.message().contains("finishReason"));
    }

    #[tokio::test]
    async fn test_multibyte_text_split_across_chunks() {
        let payload: &[u8] = b"data: {\"candidates\":[{\"content\":{\"parts\":\
            [{\"text\":\"Caf\xC3\xA9 lessons\"}]},\"finishReason\":\"STOP\"}]}\n\n";
        let split = payload.iter().position(|&b| b == 0xC3).unwrap() + 1;
        let chunks = Chunks::from_vec_deque(
            vec![
                Bytes::copy_from_slice(&payload[..split]),
                Bytes::copy_from_slice(&payload[split..]),
            ]
            .into(),
        );
        let mut resp = pin!(GeminiResponse::from_sse(Sse::new(chunks)));
        let event = poll_fn(|cx| resp.as_mut().poll_next_event(cx))
            .await
            .unwrap();
        assert_eq!(
            event,
            Some(ModelResponseEvent::MessageDelta("Café lessons".to_owned()))
        );
    }

    #[tokio::test]
    async fn test_malformed_chunk() {
        let err = collect(b"data: {not json}\n\n").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
    }
}
