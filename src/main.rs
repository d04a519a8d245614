use axum::{Router, http::header, routing::get};
use cofund::api::{handlers::api_routes, openapi::ApiDoc};
use cofund::config::CONFIG;
use cofund::core::services::CheckoutService;
use cofund::infrastructure::{
    logging::in_memory::InMemoryLogging,
    orders::in_memory::InMemoryOrderService,
    payment::{
        PaymentChannels, cod::CashOnDeliveryChannel, collection_link::CollectionLinkChannel, wallet::WalletChannel,
    },
    storage::in_memory::InMemoryStorage,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&CONFIG.log_level)))
        .init();
    info!("Loaded configuration: {:?}", *CONFIG);

    let channels = PaymentChannels::new()
        .with(Arc::new(WalletChannel::new(CONFIG.wallet_opening_balance)))
        .with(Arc::new(CollectionLinkChannel::new(CONFIG.collection_link_base_url.clone())))
        .with(Arc::new(CashOnDeliveryChannel::new()));
    info!("Payment channels: {:?}", channels.methods());

    let storage = InMemoryStorage::new();
    let logging = InMemoryLogging::new();
    let orders = InMemoryOrderService::new();
    let service = Arc::new(CheckoutService::new(
        storage,
        logging,
        orders,
        channels,
        CONFIG.jwt_secret.clone(),
        CONFIG.token_ttl_secs,
    ));

    let app = Router::new()
        .route("/", get(|| async { "OK" }))
        .nest("/api", api_routes(service))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CompressionLayer::new()) // Gzip compression
        .layer(TimeoutLayer::new(Duration::from_secs(CONFIG.request_timeout_secs)))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([
                    http::Method::GET,
                    http::Method::POST,
                    http::Method::PUT,
                    http::Method::DELETE,
                ])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        )
        .layer(TraceLayer::new_for_http()); // Request tracing

    let addr = SocketAddr::from(([127, 0, 0, 1], CONFIG.port));
    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
