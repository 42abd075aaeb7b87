use crate::auth::{require_admin, require_user};
use crate::error::ApiError;
use crate::handlers::{
    apache_modules, bigfileid, config, dav_slowdown, files_properties, lastlogin, locking,
    logfile, mimetype, notifications, occ, opcache, server_files, skeleton, sysinfo,
    trusted_servers,
};
use crate::state::AppState;
use axum::Router;
use axum::extract::{DefaultBodyLimit, Request};
use axum::http::{StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use std::io;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{Instrument, debug, info};

pub struct FixtureServer {
    bind_address: String,
    state: AppState,
    shutdown_rx: broadcast::Receiver<()>,
}

impl FixtureServer {
    pub fn with_state(
        bind_address: String,
        state: AppState,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            bind_address,
            state,
            shutdown_rx,
        }
    }

    pub async fn run(self) -> io::Result<()> {
        let listener = TcpListener::bind(&self.bind_address).await?;
        info!(
            "fixture API listening on {}{}",
            self.bind_address, self.state.config.network.base_path
        );
        self.run_with_listener(listener).await
    }

    /// Serve on an already bound listener until a shutdown signal arrives
    pub async fn run_with_listener(self, listener: TcpListener) -> io::Result<()> {
        let mut shutdown_rx = self.shutdown_rx;
        let app = build_router(self.state);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("shutting down fixture API");
            })
            .await
    }
}

/// All routes below the configured base path
///
/// Every route requires an administrator except `/notifications`, which any
/// configured user may call.
pub fn build_router(state: AppState) -> Router {
    let admin = Router::new()
        // App configuration
        .route(
            "/app/:appid/:configkey",
            get(config::get_value)
                .post(config::set_value)
                .delete(config::delete_value),
        )
        .route("/app/:appid", get(config::get_values))
        .route(
            "/apps",
            post(config::set_values).delete(config::delete_values),
        )
        .route("/getextension/:type", get(mimetype::extensions_for_type))
        .route(
            "/getextension/:type/:subtype",
            get(mimetype::extensions_for_type_subtype),
        )
        // Locking
        .route(
            "/lockprovisioning",
            get(locking::is_locking_enabled).delete(locking::release_all),
        )
        .route(
            "/lockprovisioning/:type",
            delete(locking::release_all_of_type),
        )
        .route(
            "/lockprovisioning/:type/:user",
            get(locking::is_locked)
                .post(locking::acquire_lock)
                .put(locking::change_lock)
                .delete(locking::release_lock),
        )
        // Host CLI
        .route("/occ", post(occ::execute))
        .route("/occ/bulk", post(occ::bulk_execute))
        // Log and diagnostics
        .route("/logfile", get(logfile::read).delete(logfile::clear))
        .route("/logfile/:lines", get(logfile::read_lines))
        .route("/sysinfo", get(sysinfo::read))
        // Fixture files
        .route(
            "/dir",
            get(server_files::list_files)
                .post(server_files::mk_dir)
                .delete(server_files::rm_dir),
        )
        .route(
            "/file",
            get(server_files::read_file)
                .post(server_files::create_file)
                .delete(server_files::delete_file),
        )
        // Host database fixtures
        .route("/increasefileid", post(bigfileid::increase_file_ids))
        .route(
            "/lastlogindate/:user",
            get(lastlogin::get_last_login_date).post(lastlogin::set_last_login_date),
        )
        .route(
            "/trustedservers",
            get(trusted_servers::list)
                .post(trusted_servers::add)
                .delete(trusted_servers::remove),
        )
        .route("/trustedservers/all", delete(trusted_servers::remove_all))
        .route(
            "/testingskeletondirectory",
            get(skeleton::get).post(skeleton::set),
        )
        .route(
            "/davslowdown/:method/:seconds",
            put(dav_slowdown::set_slowdown),
        )
        .route("/files_properties", put(files_properties::upsert_property))
        // Web server environment
        .route("/apache_modules/:module", get(apache_modules::get_module))
        .route("/opcache", delete(opcache::reset))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    let user = Router::new()
        .route(
            "/notifications",
            post(notifications::add).delete(notifications::delete_all),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_user));

    let api = admin.merge(user);
    let base_path = state.config.network.base_path.trim_end_matches('/');
    let router = if base_path.is_empty() {
        Router::new().merge(api)
    } else {
        Router::new().nest(base_path, api)
    };

    router
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(state.config.network.max_body_bytes))
        .layer(middleware::from_fn(method_not_allowed))
        .layer(middleware::from_fn(request_tracing))
        .with_state(state)
}

async fn not_found(request: Request) -> ApiError {
    ApiError::NotFound(format!("no route for {} {}", request.method(), request.uri().path()))
}

/// Known path, wrong method: keep the `Allow` header, answer with an envelope
async fn method_not_allowed(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    let response = next.run(request).await;
    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }

    let allow = response.headers().get(header::ALLOW).cloned();
    let mut failure =
        ApiError::MethodNotAllowed(format!("{method} is not allowed on {path}")).into_response();
    if let Some(allow) = allow {
        failure.headers_mut().insert(header::ALLOW, allow);
    }
    failure
}

async fn request_tracing(request: Request, next: Next) -> Response {
    let span = tracing::info_span!(
        "http.request",
        method = %request.method(),
        route = %request.uri().path(),
    );

    let started = Instant::now();
    let response = next.run(request).instrument(span.clone()).await;
    span.in_scope(|| {
        debug!(
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request finished"
        );
    });
    response
}
