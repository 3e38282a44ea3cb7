//! Landing page.

use std::time::Duration;

use axum::{extract::State, response::Html};

use crate::api::AppState;
use crate::metrics::{GREETING, GREETING_TIMER};

/// GET /
pub async fn greeting(State(state): State<AppState>) -> Html<String> {
    tracing::info!("GET /");

    let timer = state.metrics().start_timer(GREETING_TIMER);
    state.metrics().increment(GREETING);
    let count = state.books().count().await.ok();
    let elapsed = timer.stop();
    tracing::debug!(elapsed_ms = elapsed.as_millis() as u64, "GET /. rendered");

    Html(render(elapsed, count))
}

fn render(elapsed: Duration, count: Option<usize>) -> String {
    let books = count
        .map(|n| format!("<h3>Books on the shelf: {n}</h3>\n"))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
    <head>
        <style>
            body {{font-family: sans-serif; padding-left: 25px;}}
        </style>
        <title>Book API</title>
    </head>
    <body>
        <h1>Welcome to the book API</h1>
        <h2>You can perform rest operations under "/books"</h2>
        {books}<h3>Load time: {} milliseconds</h3>
    </body>
</html>
"#,
        elapsed.as_millis()
    )
}
