use std::fmt::{self, Debug};
use std::future::poll_fn;
use std::pin::{Pin, pin};
use std::sync::Arc;

use quill_model::{
    ModelFinishReason, ModelInfo, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, ModelResponseEvent,
};
use tracing::Instrument;

type BoxedError = Box<dyn ModelProviderError>;
type SendRequestResult = Result<ModelClientResponse, BoxedError>;
type BoxedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
#[rustfmt::skip]
type HandlerFn = Arc<
    dyn Fn(ModelRequest, Box<dyn Fn(&str) + Send + 'static>)
        -> BoxedFuture<SendRequestResult> + Send + Sync
>;
type ListModelsFn =
    Arc<dyn Fn() -> BoxedFuture<Result<Vec<ModelInfo>, BoxedError>> + Send + Sync>;

/// A wrapper around a model provider that provides a type-erased interface
/// for the other modules.
#[derive(Clone)]
pub struct ModelClient {
    handler_fn: HandlerFn,
    list_models_fn: ListModelsFn,
}

impl ModelClient {
    /// Creates a client that drives the given provider.
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since `ModelClient` doesn't have a
        // generic parameter and we don't want it either.
        let provider = Arc::new(provider);
        let handler_fn: HandlerFn = Arc::new({
            let provider = Arc::clone(&provider);
            move |req, on_transcript| {
                let fut = provider.send_request(&req);
                Box::pin(
                    async move {
                        trace!("got a request: {:?}", req);
                        let resp_or_err = fut.await;
                        handle_response::<P>(resp_or_err, on_transcript).await
                    }
                    .instrument(trace_span!("model client req")),
                )
            }
        });
        let list_models_fn: ListModelsFn = Arc::new(move || {
            let fut = provider.list_models();
            Box::pin(async move {
                fut.await.map_err(|err| {
                    error!("failed to list models: {err}");
                    Box::new(err) as BoxedError
                })
            })
        });
        Self {
            handler_fn,
            list_models_fn,
        }
    }

    /// Sends a request and returns the completely received response.
    ///
    /// `on_transcript` is called with every message delta as it arrives.
    /// The request is sent exactly once, errors are never retried.
    #[inline]
    pub async fn send_request(
        &self,
        req: ModelRequest,
        on_transcript: impl Fn(&str) + Send + 'static,
    ) -> SendRequestResult {
        (self.handler_fn)(req, Box::new(on_transcript)).await
    }

    /// Lists the models available to the provider's credential.
    #[inline]
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, BoxedError> {
        (self.list_models_fn)().await
    }
}

impl Debug for ModelClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelClient").finish_non_exhaustive()
    }
}

/// A completely received response from the model client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelClientResponse {
    /// The full generated text.
    pub transcript: String,
    /// The reason the model finished generating.
    pub finish_reason: Option<ModelFinishReason>,
}

async fn handle_response<P: ModelProvider + 'static>(
    resp_or_err: Result<P::Response, P::Error>,
    on_transcript: Box<dyn Fn(&str) + Send + 'static>,
) -> SendRequestResult {
    let resp = match resp_or_err {
        Ok(resp) => resp,
        Err(err) => {
            error!("got an error: {err}");
            return Err(Box::new(err));
        }
    };

    let mut transcript = String::new();
    let mut finish_reason = None;

    trace!("start receiving events");

    let mut pinned_resp = pin!(resp);
    loop {
        let event_or_err =
            poll_fn(|cx| pinned_resp.as_mut().poll_next_event(cx)).await;
        let event = match event_or_err {
            Ok(event) => event,
            Err(err) => {
                error!("got an error: {err}");
                return Err(Box::new(err));
            }
        };

        let Some(event) = event else {
            break;
        };
        trace!("got an event: {event:?}");

        match event {
            ModelResponseEvent::MessageDelta(msg) => {
                transcript.push_str(&msg);
                on_transcript(&msg);
            }
            ModelResponseEvent::Completed(reason) => {
                finish_reason = Some(reason);
            }
        }
    }

    trace!("finished a request");

    Ok(ModelClientResponse {
        transcript,
        finish_reason,
    })
}
