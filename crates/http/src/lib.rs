// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! A thin `axum` service over the task store and the worker's static
//! dataset listing. Every handler either enqueues a task or reads the
//! store; none of them touch `poudriere`/`zfs` directly beyond the
//! read-only dataset listing behind `/info`.

mod config;
mod error;
mod handlers;
mod sse;
mod state;

pub use config::HttpConfig;
pub use error::HttpError;
pub use state::AppState;

use axum::routing::{get, put};
use axum::Router;
use tower_http::trace::TraceLayer;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/info", get(handlers::info))
        .route("/jail/:id", put(handlers::create_jail))
        .route("/ports/update/:id", put(handlers::update_ports))
        .route("/build/:id", put(handlers::run_build))
        .route("/depends/:id", put(handlers::get_depends))
        .route("/result/:id", get(handlers::result))
        .route("/log/:id", get(handlers::log))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
