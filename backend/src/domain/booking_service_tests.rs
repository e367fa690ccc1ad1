//! Booking lifecycle behaviour against mocked ports.

use std::sync::Arc;

use chrono::TimeDelta;
use rstest::rstest;

use super::*;
use crate::domain::ports::{
    MockBookingRepository, MockNotificationPublisher, MockNotificationRepository,
    MockPaymentRepository, MockServiceRepository, RepositoryError,
};
use crate::domain::{
    ErrorCode, Money, Payment, PaymentId, PaymentMethod, Role, Service, UserId,
};
use crate::test_support::{fixed_clock, fixture_now, sample_booking, sample_service};

struct Harness {
    bookings: MockBookingRepository,
    payments: MockPaymentRepository,
    services: MockServiceRepository,
    notifications: MockNotificationRepository,
}

impl Harness {
    fn new() -> Self {
        let mut notifications = MockNotificationRepository::new();
        notifications.expect_insert().returning(|_| Ok(()));
        Self {
            bookings: MockBookingRepository::new(),
            payments: MockPaymentRepository::new(),
            services: MockServiceRepository::new(),
            notifications,
        }
    }

    fn with_booking(mut self, booking: &Booking) -> Self {
        let found = booking.clone();
        self.bookings
            .expect_find_by_id()
            .returning(move |_| Ok(Some(found.clone())));
        self
    }

    fn with_service(mut self, service: &Service) -> Self {
        let found = service.clone();
        self.services
            .expect_find_by_id()
            .returning(move |_| Ok(Some(found.clone())));
        self
    }

    fn build(self) -> BookingService {
        let clock = fixed_clock();
        let mut publisher = MockNotificationPublisher::new();
        publisher.expect_publish().return_const(());
        let notifications = NotificationService::new(
            Arc::new(self.notifications),
            Arc::new(publisher),
            clock.clone(),
        );
        let catalogue = CatalogueService::new(Arc::new(self.services), clock.clone());
        BookingService::new(
            Arc::new(self.bookings),
            Arc::new(self.payments),
            catalogue,
            notifications,
            clock,
        )
    }
}

fn principal(user_id: UserId, role: Role) -> Principal {
    Principal { user_id, role }
}

fn reason() -> CancelReason {
    CancelReason::new("Plans changed unexpectedly").expect("reason")
}

#[rstest]
#[tokio::test]
async fn create_snapshots_price_and_notifies_provider() {
    let service = sample_service(UserId::random());
    let mut harness = Harness::new().with_service(&service);
    harness.bookings.expect_insert().times(1).returning(|_| Ok(()));
    let svc = harness.build();
    let client = principal(UserId::random(), Role::Client);

    let booking = svc
        .create(client, service.id, fixture_now() + TimeDelta::days(2), Some(" gate code 12 "))
        .await
        .expect("created");
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.price, service.price);
    assert_eq!(booking.notes.as_deref(), Some("gate code 12"));
    assert_eq!(booking.provider_id, service.provider_id);
}

#[rstest]
#[tokio::test]
async fn create_rejects_past_slots() {
    let svc = Harness::new().build();
    let err = svc
        .create(
            principal(UserId::random(), Role::Client),
            ServiceId::random(),
            fixture_now() - TimeDelta::hours(1),
            None,
        )
        .await
        .expect_err("past");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(err.details().map(|d| d["field"].clone()), Some("scheduledAt".into()));
}

#[rstest]
#[tokio::test]
async fn providers_cannot_book_themselves() {
    let provider = UserId::random();
    let service = sample_service(provider);
    let svc = Harness::new().with_service(&service).build();

    let err = svc
        .create(
            principal(provider, Role::Provider),
            service.id,
            fixture_now() + TimeDelta::days(1),
            None,
        )
        .await
        .expect_err("own service");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn only_the_provider_advances() {
    let service = sample_service(UserId::random());
    let client = UserId::random();
    let booking = sample_booking(&service, client, BookingStatus::Pending);
    let svc = Harness::new().with_booking(&booking).build();

    let err = svc
        .advance(principal(client, Role::Client), booking.id, BookingAction::Accept)
        .await
        .expect_err("client cannot accept");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[case(BookingStatus::Pending, BookingAction::Accept, Some(BookingStatus::Accepted))]
#[case(BookingStatus::Accepted, BookingAction::Start, Some(BookingStatus::InProgress))]
#[case(BookingStatus::InProgress, BookingAction::Complete, Some(BookingStatus::Completed))]
#[case(BookingStatus::Pending, BookingAction::Complete, None)]
#[case(BookingStatus::Cancelled, BookingAction::Accept, None)]
#[tokio::test]
async fn provider_transitions(
    #[case] from: BookingStatus,
    #[case] action: BookingAction,
    #[case] expected: Option<BookingStatus>,
) {
    let service = sample_service(UserId::random());
    let booking = sample_booking(&service, UserId::random(), from);
    let mut harness = Harness::new().with_booking(&booking);
    harness
        .bookings
        .expect_update()
        .withf(move |_, prior| *prior == from)
        .times(usize::from(expected.is_some()))
        .returning(|_, _| Ok(()));
    let svc = harness.build();

    let result = svc
        .advance(principal(service.provider_id, Role::Provider), booking.id, action)
        .await;
    match expected {
        Some(status) => assert_eq!(result.expect("transition").status, status),
        None => assert_eq!(result.expect_err("illegal").code(), ErrorCode::Conflict),
    }
}

#[rstest]
#[case(BookingStatus::Completed)]
#[case(BookingStatus::Cancelled)]
#[case(BookingStatus::InProgress)]
#[tokio::test]
async fn finished_bookings_cannot_be_cancelled(#[case] status: BookingStatus) {
    let service = sample_service(UserId::random());
    let client = UserId::random();
    let booking = sample_booking(&service, client, status);
    let svc = Harness::new().with_booking(&booking).build();

    let err = svc
        .cancel(principal(client, Role::Client), booking.id, reason())
        .await
        .expect_err("conflict");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn cancelling_refunds_succeeded_payments() {
    let service = sample_service(UserId::random());
    let client = UserId::random();
    let booking = sample_booking(&service, client, BookingStatus::Accepted);
    let payment = Payment {
        id: PaymentId::random(),
        booking_id: booking.id,
        payer_id: client,
        amount: Money::new(25_000, "SAR").expect("money"),
        method: PaymentMethod::ApplePay,
        status: PaymentStatus::Succeeded,
        provider_reference: None,
        checkout_url: None,
        created_at: fixture_now(),
        updated_at: fixture_now(),
    };
    let mut harness = Harness::new().with_booking(&booking);
    harness
        .bookings
        .expect_update()
        .withf(|b, prior| {
            b.status == BookingStatus::Cancelled && *prior == BookingStatus::Accepted
        })
        .times(1)
        .returning(|_, _| Ok(()));
    harness
        .payments
        .expect_list_for_booking()
        .returning(move |_| Ok(vec![payment.clone()]));
    harness
        .payments
        .expect_update()
        .withf(|p| p.status == PaymentStatus::Refunded)
        .times(1)
        .returning(|_| Ok(()));
    let svc = harness.build();

    let cancelled = svc
        .cancel(principal(client, Role::Client), booking.id, reason())
        .await
        .expect("cancelled");
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    let cancellation = cancelled.cancellation.expect("cancellation");
    assert_eq!(cancellation.by, client);
    assert_eq!(cancellation.reason, "Plans changed unexpectedly");
}

#[rstest]
#[tokio::test]
async fn strangers_see_not_found_while_admins_see_everything() {
    let service = sample_service(UserId::random());
    let booking = sample_booking(&service, UserId::random(), BookingStatus::Pending);
    let svc = Harness::new().with_booking(&booking).build();

    let err = svc
        .get(principal(UserId::random(), Role::Client), booking.id)
        .await
        .expect_err("hidden");
    assert_eq!(err.code(), ErrorCode::NotFound);
    assert!(
        svc.get(principal(UserId::random(), Role::Admin), booking.id)
            .await
            .is_ok()
    );
}

#[rstest]
#[tokio::test]
async fn a_booking_that_moved_on_meanwhile_conflicts() {
    let service = sample_service(UserId::random());
    let booking = sample_booking(&service, UserId::random(), BookingStatus::Pending);
    let mut harness = Harness::new().with_booking(&booking);
    harness
        .bookings
        .expect_update()
        .times(1)
        .returning(|b, _| {
            Err(RepositoryError::conflict(format!(
                "booking {} is no longer pending",
                b.id
            )))
        });
    let svc = harness.build();

    let err = svc
        .advance(
            principal(service.provider_id, Role::Provider),
            booking.id,
            BookingAction::Accept,
        )
        .await
        .expect_err("stale");
    assert_eq!(err.code(), ErrorCode::Conflict);
}
