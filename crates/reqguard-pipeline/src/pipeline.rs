use std::sync::Arc;

use bytes::Bytes;
use futures_core::future::BoxFuture;

use crate::error::Result;

/// An outbound HTTP request with its body fully buffered.
pub type Request = http::Request<Bytes>;

/// Future returned by every stage: the request as finally dispatched.
pub type StageFuture<'a> = BoxFuture<'a, Result<Request>>;

/// One step of an outbound request pipeline.
///
/// A stage either continues with `next.run(request)`, restarts the chain with
/// `next.first(request)`, or short-circuits by returning an error.
pub trait Stage: Send + Sync {
    fn handle<'a>(&'a self, request: Request, next: Next<'a>) -> StageFuture<'a>;
}

/// The terminal sender that puts a request on the wire.
pub trait Dispatch: Send + Sync {
    fn dispatch(&self, request: Request) -> StageFuture<'_>;
}

/// Handle to the rest of the pipeline, passed to each [`Stage`].
#[derive(Clone, Copy)]
pub struct Next<'a> {
    remaining: &'a [Arc<dyn Stage>],
    chain: &'a [Arc<dyn Stage>],
    dispatcher: &'a dyn Dispatch,
}

impl<'a> Next<'a> {
    /// Continue with the following stage, or dispatch if none is left.
    pub fn run(self, request: Request) -> StageFuture<'a> {
        match self.remaining.split_first() {
            Some((stage, rest)) => stage.handle(
                request,
                Next {
                    remaining: rest,
                    ..self
                },
            ),
            None => self.dispatcher.dispatch(request),
        }
    }

    /// Restart at the head of the chain.
    pub fn first(self, request: Request) -> StageFuture<'a> {
        Next {
            remaining: self.chain,
            ..self
        }
        .run(request)
    }

    /// Number of stages left before dispatch.
    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }
}

impl<T: Dispatch + ?Sized> Dispatch for Arc<T> {
    fn dispatch(&self, request: Request) -> StageFuture<'_> {
        (**self).dispatch(request)
    }
}

/// An ordered chain of stages in front of a dispatcher.
pub struct Pipeline {
    stages: Vec<Arc<dyn Stage>>,
    dispatcher: Arc<dyn Dispatch>,
}

impl Pipeline {
    pub fn new(dispatcher: impl Dispatch + 'static) -> Self {
        Self {
            stages: Vec::new(),
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Append a stage; stages run in insertion order.
    pub fn with_stage(self, stage: impl Stage + 'static) -> Self {
        self.with_shared_stage(Arc::new(stage))
    }

    /// Append a stage that is shared with other pipelines.
    pub fn with_shared_stage(mut self, stage: Arc<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run `request` through every stage and the dispatcher.
    pub fn send(&self, request: Request) -> StageFuture<'_> {
        Next {
            remaining: &self.stages,
            chain: &self.stages,
            dispatcher: self.dispatcher.as_ref(),
        }
        .run(request)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stages.len())
            .finish()
    }
}

/// Dispatcher that resolves with the request it was given without sending it.
#[derive(Debug, Default, Clone, Copy)]
pub struct Loopback;

impl Dispatch for Loopback {
    fn dispatch(&self, request: Request) -> StageFuture<'_> {
        Box::pin(async move { Ok(request) })
    }
}
