//! Custom Axum extractors

use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;

use super::error::ApiError;
use crate::error::DomainError;
use crate::models::Validate;

/// JSON body that has passed its own [`Validate`] check.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::MalformedBody(rejection.body_text()))?;

        value
            .validate()
            .into_result()
            .map_err(|problems| ApiError::Domain(DomainError::ValidationFailed(problems)))?;

        Ok(Self(value))
    }
}
