use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::error_handling::HandleErrorLayer;
use axum::http::{StatusCode, Uri};
use axum::routing::{get, post};
use axum::{BoxError, Router};
use tokio::net;
use tokio::signal;
use tower::ServiceBuilder;
use tower::timeout::error::Elapsed;
use uuid::Uuid;

use crate::domain::device::models::requests::{
    CreateDeviceRequest, DeleteDeviceRequest, GetDeviceByIdRequest, GetDevicesByBrandRequest,
    GetDevicesByStateRequest, PatchDeviceRequest, UpdateDeviceRequest,
};
use crate::domain::device::ports::DeviceService;
use crate::domain::error::{Error, ErrorKind};
use crate::inbound::http::handler::Handler;
use crate::inbound::http::handlers::{
    create_device::create_device, delete_device::delete_device, get_device::get_device,
    get_devices::get_devices, get_devices_by_brand::get_devices_by_brand,
    get_devices_by_state::get_devices_by_state, patch_device::patch_device,
    update_device::update_device,
};

pub mod handler;
mod handlers;
pub mod params;
mod responses;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpServerConfig<'a> {
    pub host: &'a str,
    pub port: &'a str,
    pub request_timeout: Duration,
}

pub struct HttpServer {
    router: axum::Router,
    listener: net::TcpListener,
}

impl HttpServer {
    pub async fn new(
        device_service: impl DeviceService,
        config: HttpServerConfig<'_>,
    ) -> anyhow::Result<Self> {
        let trace_layer = tower_http::trace::TraceLayer::new_for_http().make_span_with(
            |request: &axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                let request_id = Uuid::new_v4();
                tracing::info_span!(
                    "http_request",
                    method = ?request.method(),
                    uri,
                    %request_id,
                    error = tracing::field::Empty,
                )
            },
        );

        let router = router(device_service, config.request_timeout).layer(trace_layer);

        let addr = format!("{}:{}", config.host, config.port);
        let listener = net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to listen on {}", addr))?;

        Ok(Self { router, listener })
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let addr = self
            .listener
            .local_addr()
            .context("failed to read listener address")?;
        tracing::info!("listening on {}", addr);

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("received error from running server")?;

        tracing::info!("server stopped");
        Ok(())
    }
}

/// Builds the device API without binding a listener. Requests running past `request_timeout`
/// are dropped and answered with a typed error.
pub fn router<DS: DeviceService>(device_service: DS, request_timeout: Duration) -> Router {
    Router::new()
        .nest("/v1", api_routes(Arc::new(device_service)))
        .fallback(path_not_found)
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(request_failed))
                .timeout(request_timeout),
        )
}

fn api_routes<DS: DeviceService>(service: Arc<DS>) -> Router {
    Router::new()
        .route(
            "/devices",
            post(Handler::new(
                service.clone(),
                create_device::<DS>,
                StatusCode::CREATED,
                CreateDeviceRequest::default,
            ))
            .get(Handler::without_params(
                service.clone(),
                get_devices::<DS>,
                StatusCode::OK,
            )),
        )
        .route(
            "/devices/{id}",
            get(Handler::new(
                service.clone(),
                get_device::<DS>,
                StatusCode::OK,
                GetDeviceByIdRequest::default,
            ))
            .put(Handler::new(
                service.clone(),
                update_device::<DS>,
                StatusCode::OK,
                UpdateDeviceRequest::default,
            ))
            .patch(Handler::new(
                service.clone(),
                patch_device::<DS>,
                StatusCode::OK,
                PatchDeviceRequest::default,
            ))
            .delete(Handler::new(
                service.clone(),
                delete_device::<DS>,
                StatusCode::NO_CONTENT,
                DeleteDeviceRequest::default,
            )),
        )
        .route(
            "/devices/brand/{brand}",
            get(Handler::new(
                service.clone(),
                get_devices_by_brand::<DS>,
                StatusCode::OK,
                GetDevicesByBrandRequest::default,
            )),
        )
        .route(
            "/devices/state/{state}",
            get(Handler::new(
                service,
                get_devices_by_state::<DS>,
                StatusCode::OK,
                GetDevicesByStateRequest::default,
            )),
        )
}

async fn path_not_found(uri: Uri) -> Error {
    Error::new(
        ErrorKind::PathNotFound,
        Error::NOT_FOUND,
        format!("no route for {}", uri.path()),
    )
}

async fn request_failed(err: BoxError) -> Error {
    let e = if err.is::<Elapsed>() {
        Error::new(
            ErrorKind::InternalError,
            Error::SERVICE_UNAVAILABLE,
            "request deadline exceeded",
        )
    } else {
        tracing::error!("{}", err);
        Error::internal(ErrorKind::InternalError, "Internal server error")
    };

    tracing::warn!("{}", e);
    tracing::Span::current().record("error", tracing::field::display(&e));
    e
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received, draining connections");
}
