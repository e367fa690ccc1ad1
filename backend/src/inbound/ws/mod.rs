//! WebSocket inbound adapter streaming notifications to signed-in users.
//!
//! Responsibilities:
//! - validate upgrade requests (origin allow-list, authentication)
//! - subscribe the connection to the notification feed
//! - keep WebSocket-specific concerns at the edge of the system

use actix_web::web::{self, Payload};
use actix_web::{HttpRequest, HttpResponse, get, http::header::ORIGIN};
use tracing::error;

use crate::inbound::http::auth::Authenticated;

mod session;

pub mod messages;
pub mod origin;
pub mod state;

pub use origin::{AllowedOrigins, InvalidOrigin};

/// Upgrade to the live notification feed of the caller.
#[get("/ws/notifications")]
pub async fn ws_entry(
    state: web::Data<state::WsState>,
    Authenticated(principal): Authenticated,
    req: HttpRequest,
    stream: Payload,
) -> actix_web::Result<HttpResponse> {
    let mut origin_iter = req.headers().get_all(ORIGIN);
    let origin_header = origin_iter.next().ok_or_else(|| {
        error!("Missing Origin header on WebSocket upgrade");
        actix_web::error::ErrorForbidden("Origin not allowed")
    })?;
    if origin_iter.next().is_some() {
        error!("Multiple Origin headers on WebSocket upgrade");
        return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
    }
    state.origins.validate(origin_header)?;

    let user = state.accounts.me(principal.user_id).await?;
    // Subscribe before the handshake completes so no event slips between.
    let events = state.feed.subscribe();
    let (response, session, stream) = actix_ws::handle(&req, stream).map_err(|error| {
        error!(error = %error, "WebSocket upgrade failed");
        error
    })?;
    actix_web::rt::spawn(session::handle_ws_session(
        user.id,
        user.locale,
        events,
        session,
        stream,
    ));
    Ok(response)
}
