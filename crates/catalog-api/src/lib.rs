//! # catalog-api
//!
//! Server-rendered admin for the product catalog: listing with search and
//! pagination, create and edit forms with image upload and reordering,
//! CSRF-protected deletion, and image download.

pub mod config;
pub mod csrf;
pub mod error;
pub mod flash;
pub mod forms;
pub mod handlers;
pub mod messages;
pub mod state;
pub mod views;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub use config::ServerConfig;
pub use error::ApiError;
pub use state::AppState;

use handlers::products;

/// UUIDv7 request ids for `x-request-id`.
#[derive(Clone, Copy)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Build the full router with middleware.
pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let mut router = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/product", get(products::list_products))
        .route(
            "/product/new",
            get(products::new_product_form).post(products::create_product),
        )
        .route(
            "/product/:id/edit",
            get(products::edit_product_form)
                .put(products::update_product)
                .post(products::update_product),
        )
        .route(
            "/product/:id",
            delete(products::delete_product).post(products::delete_product),
        )
        .route(
            "/product/download-image/:id",
            get(products::download_image),
        );

    if config.serves_media() {
        router = router.nest_service(
            &config.public_image_base_url,
            ServeDir::new(&config.file_storage_path),
        );
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::new()),
        )
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_body_size_bytes))
        .with_state(state)
}
