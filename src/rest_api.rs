//! Web control surface for the switch.
//!
//! Thin plumbing only: every handler calls into [`SwitchSession`] through
//! `spawn_blocking` (the protocol layer sleeps while polling the device)
//! and renders the result. Returns JSON with a stable shape on the API
//! routes and a small HTML control page on `/`.

use axum::{
    extract::{Form, State},
    response::Html,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::protocol::PortId;
use crate::session::SwitchSession;

/// Shared state injected into every handler.
#[derive(Clone)]
pub struct RestContext {
    pub session: Arc<SwitchSession>,
}

/// Form body for switch requests (`port=<id>`).
#[derive(Deserialize)]
pub struct SwitchRequest {
    pub port: Option<String>,
}

/// Build the application router.
pub fn build_router(ctx: RestContext) -> Router {
    Router::new()
        .route("/", get(index).post(index_switch))
        .route("/api/port", get(api_get_port).post(api_set_port))
        .route("/health", get(health))
        .with_state(ctx)
}

// ---------- Handlers ----------

async fn health() -> &'static str {
    "ok"
}

async fn index(State(ctx): State<RestContext>) -> Html<String> {
    let session = ctx.session.clone();
    let current = run_protocol(session, |s| s.query_port()).await;

    let (selected, error) = match current {
        Ok(port) => (Some(port), None),
        Err(e) => (None, Some(e.to_string())),
    };
    Html(render_page(
        ctx.session.ports(),
        selected.as_ref(),
        error.as_deref(),
    ))
}

async fn index_switch(
    State(ctx): State<RestContext>,
    Form(req): Form<SwitchRequest>,
) -> Html<String> {
    let Some(port) = req.port else {
        return index(State(ctx)).await;
    };
    let target = PortId::new(port);
    info!(target = %target, "switch requested via control page");

    let session = ctx.session.clone();
    let requested = target.clone();
    let result = run_protocol(session, move |s| s.switch_port(&requested)).await;

    let (selected, error) = match result {
        Ok(reported) if reported == target => (Some(reported), None),
        Ok(reported) => {
            let message = format!("Failed to switch to port {target}");
            (Some(reported), Some(message))
        }
        Err(e) => (None, Some(e.to_string())),
    };
    Html(render_page(
        ctx.session.ports(),
        selected.as_ref(),
        error.as_deref(),
    ))
}

async fn api_get_port(State(ctx): State<RestContext>) -> AppResult<Json<Value>> {
    let port = run_protocol(ctx.session, |s| s.query_port()).await?;
    Ok(Json(json!({ "current_port": port })))
}

async fn api_set_port(
    State(ctx): State<RestContext>,
    Form(req): Form<SwitchRequest>,
) -> AppResult<Json<Value>> {
    let target = PortId::new(req.port.ok_or(AppError::PortNotSpecified)?);
    info!(target = %target, "switch requested via API");

    let requested = target.clone();
    let reported = run_protocol(ctx.session, move |s| s.switch_port(&requested)).await?;

    if reported != target {
        return Err(AppError::SwitchMismatch {
            requested: target,
            reported,
        });
    }
    Ok(Json(json!({ "current_port": reported })))
}

/// Run a blocking protocol operation off the async runtime.
async fn run_protocol<T, F>(session: Arc<SwitchSession>, op: F) -> T
where
    T: Send + 'static,
    F: FnOnce(&SwitchSession) -> T + Send + 'static,
{
    tokio::task::spawn_blocking(move || op(&session))
        .await
        .expect("protocol task panicked")
}

// ---------- Page rendering ----------

/// Render the control page: one button per configured port, the active
/// port highlighted, errors in red.
fn render_page(ports: &[PortId], selected: Option<&PortId>, error: Option<&str>) -> String {
    let mut buttons = String::new();
    for port in ports {
        let class = if Some(port) == selected { "green" } else { "gray" };
        buttons.push_str(&format!(
            "            <button class=\"button {class}\" name=\"port\" value=\"{port}\">Port {port}</button>\n"
        ));
    }

    let error_html = match error {
        Some(message) => format!("    <p class=\"error\">{}</p>\n", escape_html(message)),
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>USB Switch Controller</title>
    <style>
        .button {{ padding: 10px; margin: 5px; width: 100px; font-size: 16px; }}
        .green {{ background-color: green; color: white; }}
        .gray {{ background-color: gray; color: white; }}
        .error {{ color: red; font-weight: bold; }}
    </style>
</head>
<body>
    <h1>USB Switch Controller</h1>
    <form method="post">
{buttons}    </form>
{error_html}</body>
</html>
"#
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ports() -> Vec<PortId> {
        ["01", "02", "03", "04"]
            .into_iter()
            .map(PortId::from)
            .collect()
    }

    #[test]
    fn test_page_highlights_selected_port() {
        let selected = PortId::from("02");
        let page = render_page(&ports(), Some(&selected), None);

        assert!(page.contains(r#"class="button green" name="port" value="02""#));
        assert!(page.contains(r#"class="button gray" name="port" value="01""#));
        assert!(!page.contains("class=\"error\""));
    }

    #[test]
    fn test_page_renders_error() {
        let page = render_page(&ports(), None, Some("Failed to switch to port 03"));
        assert!(page.contains(r#"<p class="error">Failed to switch to port 03</p>"#));
    }

    #[test]
    fn test_page_escapes_error_text() {
        let page = render_page(&ports(), None, Some("<script>"));
        assert!(page.contains("&lt;script&gt;"));
        assert!(!page.contains("<script>"));
    }

    #[test]
    fn test_page_has_one_button_per_port() {
        let page = render_page(&ports(), None, None);
        assert_eq!(page.matches("<button").count(), 4);
    }
}
