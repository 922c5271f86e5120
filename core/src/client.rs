//! Stateless request builder and response parser for the users endpoint.
//!
//! # Design
//! `UsersClient` holds only a `base_url`. Each operation is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method that
//! consumes the matching `HttpResponse`. Any status outside `2xx` is a
//! transport failure; the error body is never inspected for detail.

use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{NewUser, UserId, UserRecord};

/// Synchronous, stateless client for `/users`.
#[derive(Debug, Clone)]
pub struct UsersClient {
    base_url: String,
}

impl UsersClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn build_list(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/users", self.base_url),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_create(&self, input: &NewUser) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/users", self.base_url),
            headers: json_headers(),
            body: Some(encode(input)?),
        })
    }

    /// `PUT /users/{id}` carrying the full record, id included.
    pub fn build_update(&self, record: &UserRecord) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: HttpMethod::Put,
            path: format!("{}/users/{}", self.base_url, record.id),
            headers: json_headers(),
            body: Some(encode(record)?),
        })
    }

    pub fn build_delete(&self, id: UserId) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            path: format!("{}/users/{id}", self.base_url),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn parse_list(&self, response: HttpResponse) -> Result<Vec<UserRecord>, ApiError> {
        check_status(&response)?;
        decode(&response.body)
    }

    pub fn parse_create(&self, response: HttpResponse) -> Result<UserRecord, ApiError> {
        check_status(&response)?;
        decode(&response.body)
    }

    /// A record whose id differs from `requested` is treated as malformed;
    /// the store must never be keyed by an id it did not ask to update.
    pub fn parse_update(
        &self,
        response: HttpResponse,
        requested: UserId,
    ) -> Result<UserRecord, ApiError> {
        check_status(&response)?;
        let record: UserRecord = decode(&response.body)?;
        if record.id != requested {
            return Err(ApiError::Decode(format!(
                "updated record has id {} but {requested} was requested",
                record.id
            )));
        }
        Ok(record)
    }

    /// The body is ignored; a success status confirms `requested`.
    pub fn parse_delete(&self, response: HttpResponse, requested: UserId) -> Result<UserId, ApiError> {
        check_status(&response)?;
        Ok(requested)
    }
}

fn json_headers() -> Vec<(String, String)> {
    vec![("content-type".to_string(), "application/json".to_string())]
}

fn encode<T: serde::Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string(value).map_err(|e| ApiError::Encode(e.to_string()))
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
}

fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(ApiError::Status {
        status: response.status,
        body: response.body.clone(),
    })
}
