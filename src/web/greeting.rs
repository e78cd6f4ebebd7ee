use axum::{Json, extract::Query};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct GreetingQuery {
    name: Option<String>,
}

#[derive(Serialize)]
pub struct Greeting {
    content: String,
}

/// `GET /greeting?name=`: tells that the server is alive.
pub async fn greeting(Query(query): Query<GreetingQuery>) -> Json<Greeting> {
    let name = query.name.as_deref().unwrap_or("World");
    Json(Greeting { content: format!("Hello, {name}!") })
}
