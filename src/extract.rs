//! Request extractors that validate path, query and body input before a
//! handler runs.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::{
    Error,
    database_id::DatabaseId,
    owner::OwnerId,
    validation::{Validate, ValidationErrors},
};

/// A record ID taken from the last path segment.
///
/// Only strings of ASCII digits that fit a [DatabaseId] are accepted, anything
/// else is rejected with [Error::InvalidId].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordId(pub DatabaseId);

impl<S> FromRequestParts<S> for RecordId
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw_id) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| Error::InvalidId)?;

        parse_record_id(&raw_id).map(RecordId)
    }
}

/// Parse a path segment as a record ID.
///
/// # Errors
/// Returns [Error::InvalidId] if `raw_id` is not a string of digits or does
/// not fit in a [DatabaseId].
pub fn parse_record_id(raw_id: &str) -> Result<DatabaseId, Error> {
    if raw_id.is_empty() || !raw_id.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(Error::InvalidId);
    }

    raw_id.parse().map_err(|_| Error::InvalidId)
}

#[derive(Debug, Deserialize)]
struct OwnerQuery {
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

/// The owner identifier taken from the `userId` query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner(pub OwnerId);

impl<S> FromRequestParts<S> for Owner
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<OwnerQuery>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                Error::Validation(ValidationErrors::single("userId", &rejection.body_text()))
            })?;

        let owner = OwnerId::new(query.user_id.as_deref().unwrap_or_default())?;

        Ok(Owner(owner))
    }
}

/// A JSON body that has been validated against the schema `T`.
///
/// Malformed JSON and schema violations are both rejected with
/// [Error::Validation]. A field holding the wrong JSON type is reported
/// under its own name, anything else wrong with the body under `body`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: Validate,
{
    type Rejection = Error;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<Value>::from_request(request, state)
            .await
            .map_err(|rejection| {
                Error::Validation(ValidationErrors::single("body", &rejection.body_text()))
            })?;

        let payload = parse_payload::<T::Payload>(&body).map_err(Error::Validation)?;

        T::validate(payload).map(ValidJson).map_err(Error::Validation)
    }
}

/// Deserialize `body` into `P`, blaming the first field that fails to
/// deserialize on its own.
fn parse_payload<P: DeserializeOwned>(body: &Value) -> Result<P, ValidationErrors> {
    let error = match P::deserialize(body) {
        Ok(payload) => return Ok(payload),
        Err(error) => error,
    };

    let path = body
        .as_object()
        .and_then(|fields| {
            fields.iter().find(|(name, value)| {
                let field = Value::Object(Map::from_iter([((*name).clone(), (*value).clone())]));
                P::deserialize(&field).is_err()
            })
        })
        .map_or("body", |(name, _)| name.as_str());

    Err(ValidationErrors::single(path, &error.to_string()))
}
