//! Assembles adapters, middleware and routes into a running `HttpServer`.

mod config;
mod state_builders;

pub use config::ServerConfig;

use actix_web::body::MessageBody;
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use khidma::Trace;
use khidma::inbound::http::configure_api;
use khidma::inbound::http::health::{HealthState, live, ready};
use khidma::inbound::http::state::HttpState;
use khidma::inbound::ws::{self, state::WsState};
use khidma::middleware::RateLimit;

use config::CookiePolicy;
use state_builders::{AppStates, bootstrap_admin, build_states};

/// Per-worker handles; every field is a cheap clone of shared state.
#[derive(Clone)]
struct Shared {
    health: web::Data<HealthState>,
    http: web::Data<HttpState>,
    ws: web::Data<WsState>,
    limiter: RateLimit,
    cookies: CookiePolicy,
}

impl Shared {
    fn app(
        self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse<impl MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        let app = App::new()
            .app_data(self.health)
            .app_data(self.http)
            .app_data(self.ws)
            .wrap(self.cookies.middleware())
            .wrap(self.limiter)
            .wrap(Trace)
            .configure(configure_api)
            .service(ws::ws_entry)
            .service(live)
            .service(ready);
        with_docs(app)
    }
}

#[cfg(debug_assertions)]
fn with_docs<T>(app: App<T>) -> App<T>
where
    T: ServiceFactory<ServiceRequest, Config = (), Error = actix_web::Error, InitError = ()>,
{
    use khidma::doc::ApiDoc;
    use utoipa::OpenApi;
    use utoipa_swagger_ui::SwaggerUi;

    app.service(SwaggerUi::new("/docs/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(not(debug_assertions))]
fn with_docs<T>(app: App<T>) -> App<T> {
    app
}

/// Build adapters from `config`, seed the bootstrap admin, bind and return
/// the server. Readiness flips once the listener is bound.
///
/// # Errors
///
/// Unusable settings, a failed admin bootstrap or a bind failure.
pub async fn create_server(
    health: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let AppStates { http, ws } = build_states(&config)?;
    bootstrap_admin(&config.settings, &http).await?;

    let shared = Shared {
        health: health.clone(),
        http: web::Data::new(http),
        ws: web::Data::new(ws),
        limiter: RateLimit::new(config.settings.rate_limits()),
        cookies: config.cookies.clone(),
    };
    let server = HttpServer::new(move || shared.clone().app())
        .bind(config.bind_addr())?
        .run();

    health.mark_ready();
    Ok(server)
}
