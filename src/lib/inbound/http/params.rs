use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use axum::body::Bytes;
use axum::extract::rejection::PathRejection;
use axum::extract::{FromRequestParts, Path, Request};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

/// Largest request body the handler will buffer.
const BODY_LIMIT: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum BindError {
    #[error("missing path parameter {0}")]
    MissingPathParam(&'static str),
    #[error("invalid path parameter {name}: {reason}")]
    InvalidPathParam { name: &'static str, reason: String },
    #[error("invalid request body: {0}")]
    Body(#[from] serde_json::Error),
    #[error("failed to read request: {0}")]
    Request(String),
}

/// Untyped inbound data: path parameters by name and the raw body.
#[derive(Debug, Clone, Default)]
pub struct RawRequest {
    path: HashMap<String, String>,
    body: Bytes,
}

impl RawRequest {
    pub fn new(path: HashMap<String, String>, body: Bytes) -> Self {
        Self { path, body }
    }

    pub async fn from_request(req: Request) -> Result<Self, BindError> {
        let (mut parts, body) = req.into_parts();

        let path = match Path::<HashMap<String, String>>::from_request_parts(&mut parts, &()).await
        {
            Ok(Path(path)) => path,
            Err(PathRejection::MissingPathParams(_)) => HashMap::new(),
            Err(rejection) => return Err(BindError::Request(rejection.body_text())),
        };

        let body = axum::body::to_bytes(body, BODY_LIMIT)
            .await
            .map_err(|e| BindError::Request(e.to_string()))?;

        Ok(Self { path, body })
    }

    pub fn path<T>(&self, name: &'static str) -> Result<T, BindError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self
            .path
            .get(name)
            .ok_or(BindError::MissingPathParam(name))?;

        raw.parse().map_err(|e: T::Err| BindError::InvalidPathParam {
            name,
            reason: e.to_string(),
        })
    }

    /// Deserializes the body. An empty body yields the zero value of `T`.
    pub fn json<T>(&self) -> Result<T, BindError>
    where
        T: DeserializeOwned + Default,
    {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(T::default());
        }

        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// A parameter shape the generic [Handler](super::handler::Handler) can fill from a request.
///
/// `bind` is always called on a freshly constructed, zero-valued instance.
pub trait Params: Validate + Serialize + Default + Send + Sync + 'static {
    fn bind(&mut self, req: &RawRequest) -> Result<(), BindError>;
}

/// Shape for operations that take no input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NoParams;

impl Validate for NoParams {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

impl Params for NoParams {
    fn bind(&mut self, _req: &RawRequest) -> Result<(), BindError> {
        Ok(())
    }
}
