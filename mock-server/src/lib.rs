use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

/// Body of `PUT /users/{id}`. A body `id` is accepted but the path wins.
#[derive(Deserialize)]
pub struct UpdateUser {
    pub id: Option<u64>,
    pub name: String,
    pub email: String,
}

/// Users keyed by id; ids are handed out in increasing order, so iteration
/// order is creation order.
#[derive(Debug, Default)]
pub struct Users {
    next_id: u64,
    records: BTreeMap<u64, User>,
}

impl Users {
    fn insert(&mut self, input: NewUser) -> User {
        self.next_id += 1;
        let user = User {
            id: self.next_id,
            name: input.name,
            email: input.email,
        };
        self.records.insert(user.id, user.clone());
        user
    }
}

pub type Db = Arc<RwLock<Users>>;

pub fn app() -> Router {
    app_with(Vec::new())
}

/// Router whose store starts with `seed`, assigned ids `1..`.
pub fn app_with(seed: Vec<NewUser>) -> Router {
    let mut users = Users::default();
    for input in seed {
        users.insert(input);
    }
    let db: Db = Arc::new(RwLock::new(users));
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}", put(update_user).delete(delete_user))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn list_users(State(db): State<Db>) -> Json<Vec<User>> {
    let users = db.read().await;
    Json(users.records.values().cloned().collect())
}

async fn create_user(
    State(db): State<Db>,
    Json(input): Json<NewUser>,
) -> (StatusCode, Json<User>) {
    let user = db.write().await.insert(input);
    debug!(id = user.id, "created user");
    (StatusCode::CREATED, Json(user))
}

async fn update_user(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<UpdateUser>,
) -> Result<Json<User>, StatusCode> {
    let mut users = db.write().await;
    let user = users.records.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    user.name = input.name;
    user.email = input.email;
    Ok(Json(user.clone()))
}

async fn delete_user(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let mut users = db.write().await;
    users
        .records
        .remove(&id)
        .map(|_| Json(serde_json::json!({})))
        .ok_or(StatusCode::NOT_FOUND)
}
