use async_trait::async_trait;
use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use utils::AppError;
use validator::Validate;

/// Json extractor that runs the DTO's validator rules before the handler
/// sees the value; both rejection paths surface as AppError responses.
pub struct ValidationExtractor<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidationExtractor<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;

        Ok(ValidationExtractor(value))
    }
}
