use std::collections::HashMap;

use axum::{Extension, extract::Query, response::Html};

use crate::types::{CallbackOutcome, SharedAuth};

pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(shared_state): Extension<SharedAuth>,
) -> Html<&'static str> {
    let mut state = shared_state.lock().await;
    let Some(pending) = state.as_mut() else {
        return Html("<h4>No authorization in progress.</h4>");
    };

    // first callback wins; browsers like to retry
    if pending.outcome.is_some() {
        return Html("<h4>Authorization already handled.</h4><p>Close browser window.</p>");
    }

    if params.get("state") != Some(&pending.expected_state) {
        pending.outcome = Some(CallbackOutcome::StateMismatch);
        return Html("<h4>Login failed.</h4>");
    }

    if let Some(reason) = params.get("error") {
        pending.outcome = Some(CallbackOutcome::Denied(reason.clone()));
        return Html("<h4>Authorization denied.</h4>");
    }

    match params.get("code") {
        Some(code) => {
            pending.outcome = Some(CallbackOutcome::Code(code.clone()));
            Html("<h2>Authentication successful.</h2><p>Close browser window.</p>")
        }
        None => {
            pending.outcome = Some(CallbackOutcome::Denied("missing authorization code".to_string()));
            Html("<h4>Missing authorization code.</h4>")
        }
    }
}
