//! Loopback OAuth callback listener.
//!
//! A single-shot axum server bound to `localhost:{port}` that waits for the
//! browser redirect, validates the CSRF state, answers with a static HTML
//! page, and hands the authorization code back to the caller. The listening
//! port is released on success, timeout, and caller abort alike.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use antigravity_types::GatewayError;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tokio::sync::oneshot;

/// Query parameters Google appends to the redirect.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

struct CallbackShared {
    expected_state: String,
    result_tx: Mutex<Option<oneshot::Sender<Result<String, GatewayError>>>>,
}

/// Listen for a single OAuth callback and return the authorization code.
///
/// The state nonce is checked against `expected_state`; a mismatch is
/// rejected as a possible CSRF attempt. After `timeout` without a callback
/// the listener shuts down and an error is returned.
pub async fn await_authorization_code(
    port: u16,
    expected_state: String,
    timeout: Duration,
) -> Result<String, GatewayError> {
    let listener =
        tokio::net::TcpListener::bind(("127.0.0.1", port)).await.map_err(|e| GatewayError::Auth {
            status: 500,
            message: format!("Failed to bind callback port {}: {}", port, e),
        })?;

    let (result_tx, result_rx) = oneshot::channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let shared =
        Arc::new(CallbackShared { expected_state, result_tx: Mutex::new(Some(result_tx)) });
    let app = Router::new().route("/oauth-callback", get(handle_callback)).with_state(shared);

    // If the caller's future is dropped, shutdown_tx drops with it and the
    // server unblocks through the closed channel, releasing the port.
    let server = tokio::spawn(async move {
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await;
        if let Err(e) = result {
            tracing::warn!("OAuth callback server error: {}", e);
        }
    });

    let outcome = match tokio::time::timeout(timeout, result_rx).await {
        Ok(Ok(result)) => result,
        Ok(Err(_)) => Err(GatewayError::Auth {
            status: 500,
            message: "OAuth callback listener closed unexpectedly".to_string(),
        }),
        Err(_) => Err(GatewayError::Auth {
            status: 408,
            message: format!("OAuth callback timeout after {}s", timeout.as_secs()),
        }),
    };

    let _ = shutdown_tx.send(());
    let _ = server.await;

    outcome
}

async fn handle_callback(
    State(shared): State<Arc<CallbackShared>>,
    Query(query): Query<CallbackQuery>,
) -> (StatusCode, Html<String>) {
    let result = evaluate_callback(&shared.expected_state, &query);

    let response = match &result {
        Ok(_) => (StatusCode::OK, Html(success_page())),
        Err(e) => (StatusCode::BAD_REQUEST, Html(failure_page(&e.to_string()))),
    };

    if let Ok(mut guard) = shared.result_tx.lock() {
        if let Some(tx) = guard.take() {
            let _ = tx.send(result);
        }
    }

    response
}

fn evaluate_callback(expected_state: &str, query: &CallbackQuery) -> Result<String, GatewayError> {
    if let Some(error) = &query.error {
        return Err(GatewayError::Auth { status: 400, message: format!("OAuth error: {}", error) });
    }

    let Some(code) = &query.code else {
        return Err(GatewayError::Auth {
            status: 400,
            message: "No authorization code received".to_string(),
        });
    };

    if query.state.as_deref() != Some(expected_state) {
        return Err(GatewayError::Auth {
            status: 400,
            message: "State mismatch - possible CSRF attack".to_string(),
        });
    }

    Ok(code.clone())
}

fn success_page() -> String {
    r#"<html><head><title>Authentication Successful</title></head>
<body style="font-family: system-ui; padding: 40px; text-align: center;">
<h1 style="color: #28a745;">Authentication Successful!</h1>
<p>You can close this window and return to the terminal.</p>
</body></html>"#
        .to_string()
}

fn failure_page(error: &str) -> String {
    format!(
        r#"<html><head><title>Authentication Failed</title></head>
<body style="font-family: system-ui; padding: 40px; text-align: center;">
<h1 style="color: #dc3545;">Authentication Failed</h1>
<p>Error: {}</p>
</body></html>"#,
        escape_html(error)
    )
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
