//! The session driver: validation, one remote call, then a confirmed
//! transition.
//!
//! # Design
//! `Directory` is the one explicitly owned session context. State lives in a
//! `watch` channel so the presentation layer subscribes to snapshots instead
//! of polling. Calls are not serialized against each other: concurrent
//! operations each settle on their own when their response arrives, and a
//! response still applies after the form that issued it was abandoned.

use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::client::UsersClient;
use crate::error::{ApiError, DirectoryError};
use crate::http::{HttpRequest, HttpResponse};
use crate::store::{
    DirectoryState, DraftCreate, EditState, LoadStatus, Operation, PendingEdit, Transition,
};
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{NewUser, UserId, UserRecord};
use crate::validate::validate_user;

#[derive(Debug)]
pub struct Directory<T> {
    client: UsersClient,
    transport: T,
    state: watch::Sender<DirectoryState>,
}

impl Directory<ReqwestTransport> {
    /// Session against `base_url` over a fresh `reqwest` client.
    pub fn connect(base_url: &str) -> Self {
        Self::new(UsersClient::new(base_url), ReqwestTransport::new())
    }
}

impl<T: Transport> Directory<T> {
    pub fn new(client: UsersClient, transport: T) -> Self {
        let (state, _) = watch::channel(DirectoryState::default());
        Self {
            client,
            transport,
            state,
        }
    }

    /// Receiver that observes every state change from now on.
    pub fn subscribe(&self) -> watch::Receiver<DirectoryState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> DirectoryState {
        self.state.borrow().clone()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Replaces the collection with the server's list.
    ///
    /// On failure the collection keeps its prior contents and the page-level
    /// `LoadStatus::Failed` is set.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<usize, DirectoryError> {
        let request = self.client.build_list();
        let in_flight = self.begin(Operation::Load);
        let outcome = self.round_trip(request, |c, r| c.parse_list(r)).await;

        let users = self.settle(in_flight, outcome, |s, users| {
            s.users.apply(Transition::Loaded(users.clone()));
            s.load = LoadStatus::Loaded;
        })?;
        let count = users.len();
        info!(count, "users loaded");
        Ok(count)
    }

    #[instrument(skip(self))]
    pub async fn create(&self, name: &str, email: &str) -> Result<UserRecord, DirectoryError> {
        self.validate(Operation::Create, name, email)?;
        let request = self.client.build_create(&NewUser {
            name: name.to_string(),
            email: email.to_string(),
        })?;

        let in_flight = self.begin(Operation::Create);
        let outcome = self.round_trip(request, |c, r| c.parse_create(r)).await;

        let record = self.settle(in_flight, outcome, |s, record| {
            s.users.apply(Transition::Created(record.clone()));
        })?;
        info!(id = %record.id, "user created");
        Ok(record)
    }

    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: UserId,
        name: &str,
        email: &str,
    ) -> Result<UserRecord, DirectoryError> {
        let operation = Operation::Update(id);
        self.validate(operation, name, email)?;
        let request = self.client.build_update(&UserRecord::new(id, name, email))?;

        let in_flight = self.begin(operation);
        let outcome = self.round_trip(request, |c, r| c.parse_update(r, id)).await;

        let record = self.settle(in_flight, outcome, |s, record| {
            s.users.apply(Transition::Updated(record.clone()));
        })?;
        info!("user updated");
        Ok(record)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: UserId) -> Result<UserId, DirectoryError> {
        let operation = Operation::Delete(id);
        let request = self.client.build_delete(id);

        let in_flight = self.begin(operation);
        let outcome = self.round_trip(request, |c, r| c.parse_delete(r, id)).await;

        let id = self.settle(in_flight, outcome, |s, id| {
            s.users.apply(Transition::Deleted(*id));
        })?;
        info!("user deleted");
        Ok(id)
    }

    pub fn set_draft(&self, name: &str, email: &str) {
        self.state.send_if_modified(|s| {
            let draft = DraftCreate {
                name: name.to_string(),
                email: email.to_string(),
            };
            if s.draft == draft {
                return false;
            }
            s.draft = draft;
            true
        });
    }

    /// Creates a user from the current draft, clearing the draft on success
    /// unless it was edited while the request was in flight.
    pub async fn submit_create(&self) -> Result<UserRecord, DirectoryError> {
        let draft = self.snapshot().draft;
        let record = self.create(&draft.name, &draft.email).await?;
        self.state.send_if_modified(|s| {
            if s.draft != draft {
                return false;
            }
            s.draft = DraftCreate::default();
            true
        });
        Ok(record)
    }

    /// Opens the edit form for `id`, discarding any other unsaved edit.
    pub fn begin_edit(&self, id: UserId) -> Result<(), DirectoryError> {
        let mut found = false;
        self.state.send_if_modified(|s| {
            let Some(record) = s.users.get(id) else {
                return false;
            };
            s.edit = EditState::Editing(PendingEdit {
                target: id,
                name: record.name.clone(),
                email: record.email.clone(),
            });
            found = true;
            true
        });
        if !found {
            return Err(DirectoryError::UnknownUser(id));
        }
        debug!(%id, "editing user");
        Ok(())
    }

    pub fn set_edit(&self, name: &str, email: &str) -> Result<(), DirectoryError> {
        let mut editing = false;
        self.state.send_if_modified(|s| {
            let EditState::Editing(edit) = &mut s.edit else {
                return false;
            };
            editing = true;
            if edit.name == name && edit.email == email {
                return false;
            }
            edit.name = name.to_string();
            edit.email = email.to_string();
            true
        });
        if editing {
            Ok(())
        } else {
            Err(DirectoryError::NotEditing)
        }
    }

    /// Closes the edit form. A request it already issued still applies.
    pub fn cancel_edit(&self) {
        self.state.send_if_modified(|s| {
            if s.edit == EditState::Idle {
                return false;
            }
            s.edit = EditState::Idle;
            true
        });
    }

    /// Sends the open edit. The form stays open on failure so the operator
    /// can correct it, and closes on success unless another edit replaced it.
    pub async fn submit_edit(&self) -> Result<UserRecord, DirectoryError> {
        let edit = self
            .snapshot()
            .editing()
            .cloned()
            .ok_or(DirectoryError::NotEditing)?;
        let record = self.update(edit.target, &edit.name, &edit.email).await?;
        self.state.send_if_modified(|s| match &s.edit {
            EditState::Editing(current) if current.target == edit.target => {
                s.edit = EditState::Idle;
                true
            }
            _ => false,
        });
        Ok(record)
    }

    pub fn dismiss_notice(&self, operation: Operation) {
        self.state.send_if_modified(|s| s.clear_notice(operation));
    }

    fn validate(&self, operation: Operation, name: &str, email: &str) -> Result<(), DirectoryError> {
        if let Err(err) = validate_user(name, email) {
            warn!(error = %err, "rejected before dispatch");
            self.state.send_modify(|s| s.set_notice(operation, err.to_string()));
            return Err(err.into());
        }
        Ok(())
    }

    async fn round_trip<R, F>(&self, request: HttpRequest, parse: F) -> Result<R, ApiError>
    where
        F: FnOnce(&UsersClient, HttpResponse) -> Result<R, ApiError> + Send,
    {
        debug!(method = request.method.as_str(), path = %request.path, "Sending request");
        let response = self.transport.execute(request).await?;
        parse(&self.client, response)
    }

    /// Marks `operation` in flight until the returned guard is settled or
    /// dropped.
    fn begin(&self, operation: Operation) -> InFlight<'_> {
        self.state.send_modify(|s| s.begin(operation));
        InFlight {
            state: &self.state,
            operation,
            settled: false,
        }
    }

    /// Clears the in-flight mark and applies `on_success`, or records the
    /// failure without touching the collection.
    fn settle<R>(
        &self,
        mut in_flight: InFlight<'_>,
        outcome: Result<R, ApiError>,
        on_success: impl FnOnce(&mut DirectoryState, &R),
    ) -> Result<R, DirectoryError> {
        in_flight.settled = true;
        let operation = in_flight.operation;
        match outcome {
            Ok(value) => {
                self.state.send_modify(|s| {
                    s.finish(operation);
                    on_success(s, &value);
                });
                Ok(value)
            }
            Err(err) => {
                warn!(?operation, error = %err, "remote call failed");
                self.state.send_modify(|s| {
                    s.finish(operation);
                    let message = failure_message(operation).to_string();
                    match operation {
                        Operation::Load => s.load = LoadStatus::Failed(message),
                        _ => s.set_notice(operation, message),
                    }
                });
                Err(err.into())
            }
        }
    }
}

/// In-flight mark of one call. Dropping it unsettled, as happens when the
/// caller abandons the future mid-request, clears the mark.
struct InFlight<'a> {
    state: &'a watch::Sender<DirectoryState>,
    operation: Operation,
    settled: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let operation = self.operation;
        debug!(?operation, "call dropped before its response arrived");
        self.state.send_modify(|s| s.finish(operation));
    }
}

/// Operator-facing text; both transport and decode failures read the same.
fn failure_message(operation: Operation) -> &'static str {
    match operation {
        Operation::Load => "Failed to fetch users.",
        Operation::Create => "Failed to create user.",
        Operation::Update(_) => "Failed to update user.",
        Operation::Delete(_) => "Failed to delete user.",
    }
}
