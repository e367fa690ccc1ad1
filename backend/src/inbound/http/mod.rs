//! HTTP inbound adapter exposing the REST API under `/api/v1`.

pub mod accounts;
pub mod admin;
pub mod applications;
pub mod assistant;
pub mod auth;
pub mod bookings;
pub mod error;
pub mod health;
pub mod notifications;
pub mod payments;
pub mod reviews;
pub mod services;
pub mod session;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

use actix_web::web;

pub use error::ApiResult;

/// Register every `/api/v1` route together with the extractor configs that
/// report malformed input in the shared error schema.
///
/// The caller provides `web::Data<state::HttpState>` and, for cookie
/// sessions, the session middleware.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .app_data(validation::json_config())
            .app_data(validation::query_config())
            .app_data(validation::path_config())
            .service(accounts::register)
            .service(accounts::login)
            .service(accounts::logout)
            .service(accounts::current_user)
            .service(accounts::update_current_user)
            .service(services::search_services)
            .service(services::create_service)
            .service(services::service_reviews)
            .service(services::get_service)
            .service(services::update_service)
            .service(services::archive_service)
            .service(services::provider_services)
            .service(bookings::create_booking)
            .service(bookings::list_bookings)
            .service(bookings::get_booking)
            .service(bookings::accept_booking)
            .service(bookings::start_booking)
            .service(bookings::complete_booking)
            .service(bookings::cancel_booking)
            .service(payments::create_checkout)
            .service(payments::list_payments)
            .service(payments::stripe_webhook)
            .service(reviews::create_review)
            .service(notifications::list_notifications)
            .service(notifications::mark_all_read)
            .service(notifications::mark_read)
            .service(applications::apply)
            .service(applications::my_application)
            .service(admin::list_applications)
            .service(admin::approve_application)
            .service(admin::reject_application)
            .service(admin::pending_services)
            .service(admin::approve_service)
            .service(admin::reject_service)
            .service(admin::list_users)
            .service(admin::dashboard)
            .service(assistant::chat),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::test_utils::{TestHarness, test_session_middleware};
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use rstest::rstest;
    use serde_json::Value;

    #[rstest]
    #[case("not json", "application/json")]
    #[case("{\"email\": 1}", "application/json")]
    #[actix_web::test]
    async fn malformed_bodies_use_the_error_schema(#[case] body: &str, #[case] content_type: &str) {
        let harness = TestHarness::new();
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(harness.state.clone()))
                .wrap(test_session_middleware())
                .configure(configure_api),
        )
        .await;
        let req = actix_test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .insert_header(("content-type", content_type))
            .set_payload(body.to_owned())
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let value: Value = actix_test::read_body_json(res).await;
        assert_eq!(value["code"], "invalid_request");
        assert_eq!(value["details"]["code"], "malformed_body");
    }
}
