//! Behavioural coverage for the in-memory store.

use chrono::TimeDelta;
use rstest::{fixture, rstest};

use super::MemoryStore;
use crate::domain::ports::{
    ApplicationRepository, BookingRepository, NotificationRepository, PaymentRepository,
    RepositoryError, ReviewRepository, ServiceRepository, UserRepository,
};
use crate::domain::{
    ApplicationId, ApplicationStatus, BookingId, BookingStatus, Category, Decision, Money,
    Notification, NotificationKind, Payment, PaymentId, PaymentMethod, PaymentStatus, PhoneNumber,
    ProviderApplication, Rating, Review, ReviewId, Role, ServiceCursorKey, ServiceFilter,
    ServiceStatus, StoredUser, UserId,
};
use crate::test_support::{fixture_now, sample_booking, sample_service, sample_user};

#[fixture]
fn store() -> MemoryStore {
    MemoryStore::new()
}

fn stored(role: Role) -> StoredUser {
    StoredUser {
        user: sample_user(role),
        password_hash: "hash".to_owned(),
    }
}

fn application(user: UserId) -> ProviderApplication {
    ProviderApplication {
        id: ApplicationId::random(),
        user_id: user,
        business_name: "Sparkle Co".to_owned(),
        bio: None,
        categories: vec![Category::new("cleaning").expect("category")],
        phone: PhoneNumber::new("+966500000000").expect("phone"),
        status: ApplicationStatus::Pending,
        rejection_reason: None,
        reviewed_by: None,
        reviewed_at: None,
        created_at: fixture_now(),
    }
}

fn payment(booking: BookingId, payer: UserId, status: PaymentStatus, amount: i64) -> Payment {
    Payment {
        id: PaymentId::random(),
        booking_id: booking,
        payer_id: payer,
        amount: Money::new(amount, "SAR").expect("money"),
        method: PaymentMethod::Card,
        status,
        provider_reference: Some(format!("cs_{amount}")),
        checkout_url: None,
        created_at: fixture_now(),
        updated_at: fixture_now(),
    }
}

#[rstest]
#[tokio::test]
async fn duplicate_email_is_a_conflict(store: MemoryStore) {
    let first = stored(Role::Client);
    let mut second = stored(Role::Client);
    second.user.email = first.user.email.clone();

    UserRepository::create(&store, &first).await.expect("first insert");
    let err = UserRepository::create(&store, &second)
        .await
        .expect_err("duplicate email");

    assert!(matches!(err, RepositoryError::Conflict { .. }));
}

#[rstest]
#[tokio::test]
async fn search_pages_newest_first_and_skips_unapproved(store: MemoryStore) {
    let provider = UserId::random();
    let mut older = sample_service(provider);
    older.created_at = fixture_now() - TimeDelta::hours(2);
    let newer = sample_service(provider);
    let mut pending = sample_service(provider);
    pending.status = ServiceStatus::PendingApproval;
    for service in [&older, &newer, &pending] {
        ServiceRepository::insert(&store, service).await.expect("insert");
    }

    let filter = ServiceFilter::default();
    let first = store.search(&filter, None, 1).await.expect("first page");
    assert_eq!(first.iter().map(|s| s.id).collect::<Vec<_>>(), vec![newer.id]);

    let cursor = ServiceCursorKey::of(&newer);
    let second = store.search(&filter, Some(cursor), 10).await.expect("second page");
    assert_eq!(second.iter().map(|s| s.id).collect::<Vec<_>>(), vec![older.id]);
}

#[rstest]
#[tokio::test]
async fn second_review_for_booking_conflicts(store: MemoryStore) {
    let review = Review {
        id: ReviewId::random(),
        booking_id: BookingId::random(),
        service_id: sample_service(UserId::random()).id,
        client_id: UserId::random(),
        rating: Rating::new(5).expect("rating"),
        comment: None,
        created_at: fixture_now(),
    };
    ReviewRepository::insert(&store, &review).await.expect("first review");

    let again = Review {
        id: ReviewId::random(),
        ..review
    };
    let err = ReviewRepository::insert(&store, &again)
        .await
        .expect_err("second review");
    assert!(matches!(err, RepositoryError::Conflict { .. }));
}

#[rstest]
#[tokio::test]
async fn mark_read_is_scoped_to_owner(store: MemoryStore) {
    let owner = UserId::random();
    let notification = Notification::from_template(
        owner,
        NotificationKind::BookingRequested,
        None,
        fixture_now(),
    );
    NotificationRepository::insert(&store, &notification)
        .await
        .expect("insert");

    let stranger = store
        .mark_read(notification.id, UserId::random())
        .await
        .expect("lookup");
    assert!(stranger.is_none());

    let marked = store
        .mark_read(notification.id, owner)
        .await
        .expect("lookup")
        .expect("owned notification");
    assert!(marked.read);
    assert_eq!(store.mark_all_read(owner).await.expect("mark all"), 0);
}

#[rstest]
#[tokio::test]
async fn volume_only_counts_settled_payments(store: MemoryStore) {
    let payer = UserId::random();
    for (status, amount) in [
        (PaymentStatus::Succeeded, 10_000),
        (PaymentStatus::Succeeded, 5_000),
        (PaymentStatus::Failed, 7_000),
    ] {
        PaymentRepository::insert(&store, &payment(BookingId::random(), payer, status, amount))
            .await
            .expect("insert");
    }

    let volume = store.succeeded_volume().await.expect("volume");
    assert_eq!(volume, vec![("SAR".to_owned(), 15_000)]);
    let found = store.find_by_reference("cs_7000").await.expect("lookup");
    assert_eq!(found.map(|p| p.status), Some(PaymentStatus::Failed));
}

#[rstest]
#[tokio::test]
async fn approving_promotes_the_applicant(store: MemoryStore) {
    let applicant = stored(Role::Client);
    UserRepository::create(&store, &applicant).await.expect("user");
    let pending = application(applicant.user.id);
    ApplicationRepository::insert(&store, &pending).await.expect("apply");

    let reviewer = UserId::random();
    let decided = store
        .decide(pending.id, &Decision::Approve, reviewer, fixture_now())
        .await
        .expect("approve");

    assert_eq!(decided.status, ApplicationStatus::Approved);
    assert_eq!(decided.reviewed_by, Some(reviewer));
    let user = UserRepository::find_by_id(&store, applicant.user.id)
        .await
        .expect("lookup")
        .expect("user exists");
    assert_eq!(user.role, Role::Provider);

    let err = store
        .decide(pending.id, &Decision::Approve, reviewer, fixture_now())
        .await
        .expect_err("already decided");
    assert!(matches!(err, RepositoryError::Conflict { .. }));
}

#[rstest]
#[tokio::test]
async fn one_pending_application_per_user(store: MemoryStore) {
    let user = UserId::random();
    ApplicationRepository::insert(&store, &application(user))
        .await
        .expect("first");
    let err = ApplicationRepository::insert(&store, &application(user))
        .await
        .expect_err("second pending");
    assert!(matches!(err, RepositoryError::Conflict { .. }));
}

#[rstest]
#[tokio::test]
async fn deciding_unknown_application_is_missing(store: MemoryStore) {
    let err = store
        .decide(
            ApplicationId::random(),
            &Decision::Reject {
                reason: "incomplete".to_owned(),
            },
            UserId::random(),
            fixture_now(),
        )
        .await
        .expect_err("unknown id");
    assert!(matches!(err, RepositoryError::Missing { .. }));
}

#[rstest]
#[tokio::test]
async fn booking_updates_require_the_expected_status(store: MemoryStore) {
    let mut booking = sample_booking(
        &sample_service(UserId::random()),
        UserId::random(),
        BookingStatus::Pending,
    );
    BookingRepository::insert(&store, &booking)
        .await
        .expect("insert");

    booking.status = BookingStatus::Accepted;
    BookingRepository::update(&store, &booking, BookingStatus::Pending)
        .await
        .expect("first transition");

    booking.status = BookingStatus::Cancelled;
    let err = BookingRepository::update(&store, &booking, BookingStatus::Pending)
        .await
        .expect_err("stale transition");
    assert!(matches!(err, RepositoryError::Conflict { .. }));
    let stored = BookingRepository::find_by_id(&store, booking.id)
        .await
        .expect("lookup")
        .expect("booking");
    assert_eq!(stored.status, BookingStatus::Accepted);
}

#[rstest]
#[tokio::test]
async fn a_booking_settles_at_most_once(store: MemoryStore) {
    let booking = BookingId::random();
    let payer = UserId::random();
    PaymentRepository::insert(&store, &payment(booking, payer, PaymentStatus::Succeeded, 100))
        .await
        .expect("first success");
    let mut pending = payment(booking, payer, PaymentStatus::Pending, 200);
    PaymentRepository::insert(&store, &pending)
        .await
        .expect("pending insert");

    let err = PaymentRepository::insert(
        &store,
        &payment(booking, payer, PaymentStatus::Succeeded, 300),
    )
    .await
    .expect_err("second success on insert");
    assert!(matches!(err, RepositoryError::Conflict { .. }));

    pending.status = PaymentStatus::Succeeded;
    let err = PaymentRepository::update(&store, &pending)
        .await
        .expect_err("second success on update");
    assert!(matches!(err, RepositoryError::Conflict { .. }));
}
