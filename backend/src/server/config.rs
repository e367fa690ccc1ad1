//! Everything `create_server` needs beyond the loaded settings.

use std::net::SocketAddr;

use actix_session::SessionMiddleware;
use actix_session::config::{CookieContentSecurity, PersistentSession};
use actix_session::storage::CookieSessionStore;
use actix_web::cookie::time::Duration;
use actix_web::cookie::{Key, SameSite};
use khidma::outbound::persistence::DbPool;
use khidma::settings::ServerSettings;

const SESSION_COOKIE: &str = "session";

/// How the browser session cookie is issued.
///
/// The cookie lives as long as a bearer token so both login paths expire
/// together.
#[derive(Clone)]
pub struct CookiePolicy {
    key: Key,
    secure: bool,
    same_site: SameSite,
    lifetime: Duration,
}

impl CookiePolicy {
    fn from_settings(key: Key, settings: &ServerSettings) -> Self {
        Self {
            key,
            secure: settings.cookie_secure(),
            same_site: SameSite::Lax,
            lifetime: Duration::seconds(settings.jwt_ttl_secs()),
        }
    }

    /// Encrypted, HTTP-only cookie session middleware.
    pub fn middleware(&self) -> SessionMiddleware<CookieSessionStore> {
        SessionMiddleware::builder(CookieSessionStore::default(), self.key.clone())
            .cookie_name(SESSION_COOKIE.to_owned())
            .cookie_path("/".to_owned())
            .cookie_http_only(true)
            .cookie_secure(self.secure)
            .cookie_same_site(self.same_site)
            .cookie_content_security(CookieContentSecurity::Private)
            .session_lifecycle(PersistentSession::default().session_ttl(self.lifetime))
            .build()
    }
}

/// Server inputs: settings, the session key and an optional database pool.
pub struct ServerConfig {
    pub(crate) settings: ServerSettings,
    pub(crate) cookies: CookiePolicy,
    pub(crate) db_pool: Option<DbPool>,
}

impl ServerConfig {
    /// Settings with the cookie master key; data stays in memory until
    /// [`Self::with_db_pool`] is called.
    #[must_use]
    pub fn new(key: Key, settings: ServerSettings) -> Self {
        Self {
            cookies: CookiePolicy::from_settings(key, &settings),
            settings,
            db_pool: None,
        }
    }

    /// Use PostgreSQL instead of the in-memory store.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Address the listener binds.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.settings.bind_addr()
    }
}
