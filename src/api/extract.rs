use axum::body::Bytes;
use axum::extract::{FromRequest, Request};

use crate::error::AppError;
use crate::models::CourseRequest;

/// JSON course body whose decode failures surface as [`AppError::Deserialization`].
///
/// Runs before any validation rule, so an unknown enum literal or malformed
/// JSON never reaches [`crate::validation::validate`].
#[derive(Debug)]
pub struct CourseBody(pub CourseRequest);

impl<S> FromRequest<S> for CourseBody
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::Deserialization(e.body_text()))?;

        let course = serde_json::from_slice(&bytes)
            .map_err(|e| AppError::Deserialization(decode_message(&e)))?;

        Ok(Self(course))
    }
}

// serde_json appends the input position; clients only get the reason.
fn decode_message(err: &serde_json::Error) -> String {
    let message = err.to_string();
    let position = format!(" at line {} column {}", err.line(), err.column());
    match message.strip_suffix(&position) {
        Some(reason) => reason.to_string(),
        None => message,
    }
}
