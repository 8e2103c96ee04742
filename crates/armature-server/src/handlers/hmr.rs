//! Server-sent change events.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use tokio::sync::broadcast::error::RecvError;

use crate::state::AppState;

/// Open a change event stream.
///
/// The first frame sets the client's reconnect delay; every change after
/// that is sent as a named event carrying `{file, version}`.
pub async fn hmr_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.hub.subscribe();
    let event_name = state.config.hmr.event_name.clone();
    let retry = Duration::from_millis(state.config.hmr.retry_ms);
    tracing::debug!(clients = state.hub.client_count(), "hmr client connected");

    let hello = futures::stream::once(async move {
        Ok::<_, Infallible>(Event::default().retry(retry).comment("connected"))
    });

    let changes = futures::stream::unfold(rx, move |mut rx| {
        let event_name = event_name.clone();
        async move {
            loop {
                match rx.recv().await {
                    Ok(change) => {
                        let event = Event::default().event(&event_name).data(change.to_json());
                        return Some((Ok(event), rx));
                    }
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "hmr client fell behind");
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        }
    });

    Sse::new(hello.chain(changes)).keep_alive(KeepAlive::default())
}
