//! Client-side state synchronization for a users directory.
//!
//! # Overview
//! Keeps a local, render-driving copy of the remote `/users` collection in
//! step with the server. Input is validated before any mutation is sent, and
//! the local copy changes only after the server confirms.
//!
//! # Design
//! - `UsersClient` is stateless: `build_*` produces a request and `parse_*`
//!   consumes the response, so the wire mapping is tested without I/O.
//! - `Transport` executes one request per call; `ReqwestTransport` is the
//!   production implementation.
//! - `UserCollection::apply` holds the transition rules; `Directory` drives
//!   them and publishes `DirectoryState` snapshots over a `watch` channel.
//! - DTOs are defined independently from the mock-server crate; the
//!   end-to-end tests catch schema drift.

pub mod client;
pub mod directory;
pub mod error;
pub mod http;
pub mod store;
pub mod transport;
pub mod types;
pub mod validate;

pub use client::UsersClient;
pub use directory::Directory;
pub use error::{ApiError, DirectoryError, Field, ValidationError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use store::{
    DirectoryState, DraftCreate, EditState, LoadStatus, Operation, PendingEdit, Transition,
    UserCollection,
};
pub use transport::{ReqwestTransport, Transport};
pub use types::{NewUser, UserId, UserRecord};
pub use validate::{validate_email, validate_name, validate_user};
