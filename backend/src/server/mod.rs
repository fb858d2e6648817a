//! Server construction and adapter wiring.

mod config;

pub use config::ServerSettings;

use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use mockable::DefaultClock;
use tracing::{info, warn};

use swap_backend::Trace;
#[cfg(debug_assertions)]
use swap_backend::doc::ApiDoc;
use swap_backend::domain::SwapService;
use swap_backend::domain::ports::{MarketplaceStore, NoOpPushNotifier, PushNotifier};
use swap_backend::inbound::http::health::{HealthState, live, ready};
use swap_backend::inbound::http::matches::{
    accept_match_request, cancel_match_request, get_match, review_match, send_match_request,
};
use swap_backend::inbound::http::products::{
    delete_product, get_product, like_product, list_product, list_product_matches,
    unlike_product,
};
use swap_backend::inbound::http::state::HttpState;
use swap_backend::outbound::memory::InMemoryMarketplaceStore;
use swap_backend::outbound::persistence::{
    DbPool, DieselMarketplaceStore, PoolConfig, run_pending_migrations,
};
use swap_backend::outbound::push::ExpoHttpNotifier;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

/// Store adapter selected from settings.
enum StoreChoice {
    Memory(Arc<InMemoryMarketplaceStore>),
    Postgres(Arc<DieselMarketplaceStore>),
}

/// Push adapter selected from settings.
enum NotifierChoice {
    Expo(Arc<ExpoHttpNotifier>),
    Disabled,
}

/// Fully resolved server inputs.
pub struct ServerConfig {
    bind_addr: SocketAddr,
    http_state: HttpState,
}

fn swap_state<S, P>(store: Arc<S>, notifier: Arc<P>) -> HttpState
where
    S: MarketplaceStore + 'static,
    P: PushNotifier + 'static,
{
    let service = Arc::new(SwapService::new(store, notifier, Arc::new(DefaultClock)));
    HttpState::new(service.clone(), service)
}

fn with_notifier<S>(store: Arc<S>, notifier: NotifierChoice) -> HttpState
where
    S: MarketplaceStore + 'static,
{
    match notifier {
        NotifierChoice::Expo(expo) => swap_state(store, expo),
        NotifierChoice::Disabled => swap_state(store, Arc::new(NoOpPushNotifier)),
    }
}

fn build_http_state(store: StoreChoice, notifier: NotifierChoice) -> HttpState {
    match store {
        StoreChoice::Memory(memory) => with_notifier(memory, notifier),
        StoreChoice::Postgres(postgres) => with_notifier(postgres, notifier),
    }
}

async fn select_store(settings: &ServerSettings) -> std::io::Result<StoreChoice> {
    let Some(url) = settings.database_url.as_deref() else {
        warn!("no database configured; using the in-memory store");
        return Ok(StoreChoice::Memory(Arc::new(InMemoryMarketplaceStore::new())));
    };
    run_pending_migrations(url)
        .await
        .map_err(std::io::Error::other)?;
    let pool = DbPool::new(
        PoolConfig::new(url).with_max_size(settings.database_max_connections()),
    )
    .await
    .map_err(std::io::Error::other)?;
    info!("using the PostgreSQL store");
    Ok(StoreChoice::Postgres(Arc::new(DieselMarketplaceStore::new(
        pool,
    ))))
}

fn select_notifier(settings: &ServerSettings) -> std::io::Result<NotifierChoice> {
    if !settings.push_enabled {
        return Ok(NotifierChoice::Disabled);
    }
    let endpoint = settings.push_endpoint().map_err(std::io::Error::other)?;
    let expo = ExpoHttpNotifier::new(endpoint, settings.push_timeout())
        .map_err(std::io::Error::other)?;
    Ok(NotifierChoice::Expo(Arc::new(expo)))
}

/// Resolve adapters and the bind address from settings.
///
/// # Errors
/// Returns [`std::io::Error`] when a setting is malformed, migrations fail,
/// or the database pool cannot be built.
pub async fn resolve_config(settings: &ServerSettings) -> std::io::Result<ServerConfig> {
    let bind_addr = settings.bind_addr().map_err(std::io::Error::other)?;
    let store = select_store(settings).await?;
    let notifier = select_notifier(settings)?;
    Ok(ServerConfig {
        bind_addr,
        http_state: build_http_state(store, notifier),
    })
}

fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let api = web::scope("/api/v1")
        .service(list_product)
        .service(get_product)
        .service(delete_product)
        .service(list_product_matches)
        .service(like_product)
        .service(unlike_product)
        .service(get_match)
        .service(send_match_request)
        .service(accept_match_request)
        .service(cancel_match_request)
        .service(review_match);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .service(api)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(
        SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    app
}

/// Construct an Actix HTTP server from resolved configuration.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let ServerConfig {
        bind_addr,
        http_state,
    } = config;
    let http_state = web::Data::new(http_state);
    let server_health_state = health_state.clone();

    let server =
        HttpServer::new(move || build_app(server_health_state.clone(), http_state.clone()))
            .bind(bind_addr)?
            .run();

    info!(%bind_addr, "server listening");
    health_state.mark_ready();
    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::{Value, json};

    fn memory_state() -> web::Data<HttpState> {
        web::Data::new(build_http_state(
            StoreChoice::Memory(Arc::new(InMemoryMarketplaceStore::new())),
            NotifierChoice::Disabled,
        ))
    }

    #[actix_web::test]
    async fn listed_product_is_readable_through_the_wired_app() {
        let app = test::init_service(build_app(
            web::Data::new(HealthState::new()),
            memory_state(),
        ))
        .await;
        let create = test::TestRequest::post()
            .uri("/api/v1/products")
            .set_json(json!({
                "creatorId": "00000000-0000-0000-0000-000000000201",
                "title": "Linen shirt",
                "category": "tops",
                "minPrice": 10,
                "maxPrice": 20
            }))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, create).await;
        let id = created["product"]["id"].as_str().expect("id").to_owned();

        let fetch = test::TestRequest::get()
            .uri(&format!("/api/v1/products/{id}"))
            .to_request();
        let res = test::call_service(&app, fetch).await;

        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key("trace-id"));
    }

    #[actix_web::test]
    async fn readiness_is_wired() {
        let app = test::init_service(build_app(
            web::Data::new(HealthState::new()),
            memory_state(),
        ))
        .await;
        let req = test::TestRequest::get().uri("/health/ready").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
