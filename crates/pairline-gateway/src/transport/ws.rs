//! WebSocket session handler.
//!
//! Responsibilities:
//! - Upgrade HTTP -> WS
//! - Register the connection with the relay engine and the client table
//! - Single select loop per session: egress queue, inbound frames, terminate
//! - Route close, read errors and forced termination into one cleanup path

use std::sync::Arc;

use axum::{
    extract::{ws::WebSocket, ws::WebSocketUpgrade, State},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::Instrument;

use crate::app_state::AppState;
use crate::relay::{Connection, Egress};
use crate::transport::codec::{decode, encode, Inbound};

pub async fn ws_upgrade(State(app): State<AppState>, ws: WebSocketUpgrade) -> Response {
    upgrade(app, ws)
}

pub fn upgrade(app: AppState, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_session(app, socket))
}

async fn run_session(app: AppState, socket: WebSocket) {
    let gw = &app.cfg().gateway;
    let max_frame_bytes = gw.max_frame_bytes;
    let (out_tx, out_rx) = mpsc::channel::<Egress>(gw.outbound_queue);

    let engine = app.engine();
    let conn = engine.open(out_tx);
    app.clients().insert(Arc::clone(&conn));

    let span = tracing::info_span!("session", conn = conn.id());
    async move {
        tracing::info!(clients = app.clients().len(), "connection opened");

        pump(&app, &conn, socket, out_rx, max_frame_bytes).await;

        // close and error both land here; close() is idempotent
        engine.close(conn.id());
        app.clients().remove(conn.id());
        tracing::info!(dropped = conn.dropped_count(), "connection closed");
    }
    .instrument(span)
    .await
}

async fn pump(
    app: &AppState,
    conn: &Connection,
    socket: WebSocket,
    mut out_rx: mpsc::Receiver<Egress>,
    max_frame_bytes: usize,
) {
    let engine = app.engine();
    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            // outbound writer
            maybe_out = out_rx.recv() => {
                let Some(out) = maybe_out else { break; };
                if let Err(e) = ws_tx.send(encode(out)).await {
                    tracing::debug!(error = %e, "socket write failed");
                    break;
                }
            }

            // inbound reader
            incoming = ws_rx.next() => {
                let Some(incoming) = incoming else { break; };
                let msg = match incoming {
                    Ok(m) => m,
                    Err(e) => {
                        tracing::warn!(error = %e, "websocket error");
                        break;
                    }
                };

                match decode(msg, max_frame_bytes) {
                    Inbound::Text(s) => engine.handle_text(conn.id(), &s),
                    Inbound::Pong => conn.mark_alive(),
                    Inbound::Ping => {}
                    Inbound::Close => break,
                    Inbound::Oversized(len) => {
                        tracing::warn!(len, max_frame_bytes, "dropping oversized frame");
                    }
                    Inbound::NotUtf8 => {
                        tracing::warn!("dropping non-UTF-8 binary frame");
                    }
                }
            }

            // liveness eviction
            _ = conn.terminated() => {
                tracing::warn!("terminated by liveness monitor");
                break;
            }
        }
    }
}
