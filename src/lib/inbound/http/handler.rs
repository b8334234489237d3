//! The single request pipeline shared by every route: bind, validate, invoke, respond.

use std::future::Future;
use std::pin::Pin;

use axum::Json;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::domain::error::{Error, ErrorKind};
use crate::inbound::http::params::{Params, RawRequest};

/// Outcome of a business operation as seen by the [Handler].
#[derive(Debug, Error)]
pub enum OperationError {
    /// Typed failure, answered with its own status and body.
    #[error(transparent)]
    Domain(#[from] Error),
    /// Anything else, answered with a generic 500.
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

/// `Ok(None)` answers the success status with an empty body.
pub type OperationResult<T> = Result<Option<T>, OperationError>;

/// A route endpoint configured with a business operation, the status to answer on success and
/// the shape of its parameters.
///
/// Each request gets its own parameter value from `shape`, so concurrent requests never share
/// parameter state. `context` is cloned into every invocation of `operation`.
pub struct Handler<C, P, F> {
    context: C,
    operation: F,
    status: StatusCode,
    shape: Option<fn() -> P>,
}

impl<C: Clone, P, F: Clone> Clone for Handler<C, P, F> {
    fn clone(&self) -> Self {
        Self {
            context: self.context.clone(),
            operation: self.operation.clone(),
            status: self.status,
            shape: self.shape,
        }
    }
}

impl<C, P, F, Fut, T> Handler<C, P, F>
where
    C: Clone + Send + Sync + 'static,
    P: Params,
    F: Fn(C, P) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = OperationResult<T>> + Send,
    T: Serialize + Send,
{
    pub fn new(context: C, operation: F, status: StatusCode, shape: fn() -> P) -> Self {
        Self {
            context,
            operation,
            status,
            shape: Some(shape),
        }
    }

    /// Endpoint whose operation ignores the request; it receives `P::default()` unbound.
    pub fn without_params(context: C, operation: F, status: StatusCode) -> Self {
        Self {
            context,
            operation,
            status,
            shape: None,
        }
    }

    pub async fn handle(self, req: Request) -> Response {
        let params = match self.shape {
            Some(shape) => match bind_and_validate(shape(), req).await {
                Ok(params) => params,
                Err(e) => return reject(e),
            },
            None => P::default(),
        };

        match (self.operation)(self.context, params).await {
            Ok(Some(result)) => (self.status, Json(result)).into_response(),
            Ok(None) => self.status.into_response(),
            Err(OperationError::Domain(e)) => {
                record_error(&e);
                e.into_response()
            }
            Err(OperationError::Unexpected(cause)) => {
                tracing::error!("{:?}", cause);
                record_error(&cause);
                Error::internal(ErrorKind::InternalError, "Internal server error").into_response()
            }
        }
    }
}

impl<C, P, F, Fut, T, S> axum::handler::Handler<P, S> for Handler<C, P, F>
where
    C: Clone + Send + Sync + 'static,
    P: Params,
    F: Fn(C, P) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = OperationResult<T>> + Send + 'static,
    T: Serialize + Send + 'static,
{
    type Future = Pin<Box<dyn Future<Output = Response> + Send>>;

    fn call(self, req: Request, _state: S) -> Self::Future {
        Box::pin(self.handle(req))
    }
}

async fn bind_and_validate<P: Params>(mut params: P, req: Request) -> Result<P, Error> {
    let raw = RawRequest::from_request(req)
        .await
        .map_err(|e| Error::bad_request(ErrorKind::BindError, e.to_string()))?;

    params
        .bind(&raw)
        .map_err(|e| Error::bad_request(ErrorKind::BindError, e.to_string()))?;

    params
        .validate()
        .map_err(|e| Error::bad_request(ErrorKind::ValidateError, e.to_string()))?;

    if let Ok(json) = serde_json::to_string(&params) {
        tracing::debug!(params = %json, "bound request parameters");
    }

    Ok(params)
}

fn reject(e: Error) -> Response {
    tracing::warn!("{}", e);
    record_error(&e);
    e.into_response()
}

/// Attaches the failure to the enclosing `http_request` span.
fn record_error(e: &dyn std::fmt::Display) {
    tracing::Span::current().record("error", tracing::field::display(e));
}
