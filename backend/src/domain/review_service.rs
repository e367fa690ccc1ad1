//! Reviews of completed bookings.

use std::sync::Arc;

use mockable::Clock;
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use super::ports::{BookingRepository, RepositoryError, ReviewRepository};
use super::service_support::map_repository_error;
use super::{
    BookingStatus, CatalogueService, Error, NotificationKind, NotificationService, Principal,
    RatingSummary, Review, ReviewDraft, ReviewId, ServiceId,
};

/// Reviews of a listing with their aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceReviews {
    pub reviews: Vec<Review>,
    pub summary: RatingSummary,
}

/// Review use-cases.
#[derive(Clone)]
pub struct ReviewService {
    reviews: Arc<dyn ReviewRepository>,
    bookings: Arc<dyn BookingRepository>,
    catalogue: CatalogueService,
    notifications: NotificationService,
    clock: Arc<dyn Clock>,
}

impl ReviewService {
    /// Wire the service to its collaborators.
    pub fn new(
        reviews: Arc<dyn ReviewRepository>,
        bookings: Arc<dyn BookingRepository>,
        catalogue: CatalogueService,
        notifications: NotificationService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            reviews,
            bookings,
            catalogue,
            notifications,
            clock,
        }
    }

    /// Review a completed booking, once, as its client.
    pub async fn create(&self, actor: Principal, draft: ReviewDraft) -> Result<Review, Error> {
        let booking = self
            .bookings
            .find_by_id(draft.booking_id)
            .await
            .map_err(map_repository_error)?
            .filter(|b| b.is_participant(actor.user_id))
            .ok_or_else(|| Error::not_found(format!("booking {} not found", draft.booking_id)))?;
        if booking.client_id != actor.user_id {
            return Err(Error::forbidden("only the client may review a booking"));
        }
        if booking.status != BookingStatus::Completed {
            return Err(Error::conflict("only completed bookings can be reviewed"));
        }
        let existing = self
            .reviews
            .find_by_booking(booking.id)
            .await
            .map_err(map_repository_error)?;
        if existing.is_some() {
            return Err(already_reviewed());
        }
        let review = Review {
            id: ReviewId::random(),
            booking_id: booking.id,
            service_id: booking.service_id,
            client_id: actor.user_id,
            rating: draft.rating,
            comment: draft.comment,
            created_at: self.clock.utc(),
        };
        self.reviews.insert(&review).await.map_err(|err| match err {
            RepositoryError::Conflict { .. } => already_reviewed(),
            other => map_repository_error(other),
        })?;
        info!(
            review_id = %review.id,
            booking_id = %booking.id,
            rating = review.rating.get(),
            "review posted"
        );
        self.notifications
            .notify(
                booking.provider_id,
                NotificationKind::ReviewReceived,
                Some(*review.service_id.as_uuid()),
                review.comment.as_deref(),
            )
            .await;
        Ok(review)
    }

    /// Reviews and rating summary of a publicly visible listing.
    pub async fn service_reviews(&self, service_id: ServiceId) -> Result<ServiceReviews, Error> {
        self.catalogue.get(None, service_id).await?;
        let reviews = self
            .reviews
            .list_for_service(service_id)
            .await
            .map_err(map_repository_error)?;
        let summary = RatingSummary::of(&reviews);
        Ok(ServiceReviews { reviews, summary })
    }
}

fn already_reviewed() -> Error {
    Error::conflict("booking has already been reviewed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{
        MockBookingRepository, MockNotificationPublisher, MockNotificationRepository,
        MockReviewRepository, MockServiceRepository,
    };
    use crate::domain::{Booking, ErrorCode, Rating, Role, UserId};
    use crate::test_support::{fixed_clock, fixture_now, sample_booking, sample_service};
    use rstest::rstest;

    fn build(
        reviews: MockReviewRepository,
        booking: Option<Booking>,
        services: MockServiceRepository,
    ) -> ReviewService {
        let clock = fixed_clock();
        let mut bookings = MockBookingRepository::new();
        bookings
            .expect_find_by_id()
            .returning(move |_| Ok(booking.clone()));
        let mut notifications = MockNotificationRepository::new();
        notifications.expect_insert().returning(|_| Ok(()));
        let mut publisher = MockNotificationPublisher::new();
        publisher.expect_publish().return_const(());
        ReviewService::new(
            Arc::new(reviews),
            Arc::new(bookings),
            CatalogueService::new(Arc::new(services), clock.clone()),
            NotificationService::new(Arc::new(notifications), Arc::new(publisher), clock.clone()),
            clock,
        )
    }

    fn completed_booking() -> Booking {
        sample_booking(
            &sample_service(UserId::random()),
            UserId::random(),
            BookingStatus::Completed,
        )
    }

    fn client(booking: &Booking) -> Principal {
        Principal {
            user_id: booking.client_id,
            role: Role::Client,
        }
    }

    fn existing_review(booking: &Booking, rating: i16) -> Review {
        Review {
            id: ReviewId::random(),
            booking_id: booking.id,
            service_id: booking.service_id,
            client_id: booking.client_id,
            rating: Rating::new(rating).expect("rating"),
            comment: None,
            created_at: fixture_now(),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn client_reviews_completed_booking() {
        let booking = completed_booking();
        let mut reviews = MockReviewRepository::new();
        reviews.expect_find_by_booking().returning(|_| Ok(None));
        reviews.expect_insert().times(1).returning(|_| Ok(()));
        let svc = build(reviews, Some(booking.clone()), MockServiceRepository::new());
        let draft = ReviewDraft::new(booking.id, 5, Some("Spotless")).expect("draft");

        let review = svc.create(client(&booking), draft).await.expect("review");
        assert_eq!(review.service_id, booking.service_id);
        assert_eq!(review.rating.get(), 5);
    }

    #[rstest]
    #[case(BookingStatus::Pending)]
    #[case(BookingStatus::Accepted)]
    #[case(BookingStatus::InProgress)]
    #[case(BookingStatus::Cancelled)]
    #[tokio::test]
    async fn unfinished_bookings_cannot_be_reviewed(#[case] status: BookingStatus) {
        let mut booking = completed_booking();
        booking.status = status;
        let svc = build(
            MockReviewRepository::new(),
            Some(booking.clone()),
            MockServiceRepository::new(),
        );
        let draft = ReviewDraft::new(booking.id, 4, None).expect("draft");

        let err = svc.create(client(&booking), draft).await.expect_err("conflict");
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[rstest]
    #[tokio::test]
    async fn second_review_conflicts() {
        let booking = completed_booking();
        let earlier = existing_review(&booking, 3);
        let mut reviews = MockReviewRepository::new();
        reviews
            .expect_find_by_booking()
            .returning(move |_| Ok(Some(earlier.clone())));
        reviews.expect_insert().never();
        let svc = build(reviews, Some(booking.clone()), MockServiceRepository::new());
        let draft = ReviewDraft::new(booking.id, 4, None).expect("draft");

        let err = svc.create(client(&booking), draft).await.expect_err("duplicate");
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[rstest]
    #[tokio::test]
    async fn providers_cannot_review_their_own_work() {
        let booking = completed_booking();
        let svc = build(
            MockReviewRepository::new(),
            Some(booking.clone()),
            MockServiceRepository::new(),
        );
        let provider = Principal {
            user_id: booking.provider_id,
            role: Role::Provider,
        };
        let draft = ReviewDraft::new(booking.id, 5, None).expect("draft");

        let err = svc.create(provider, draft).await.expect_err("forbidden");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    #[tokio::test]
    async fn listing_reviews_include_summary() {
        let booking = completed_booking();
        let service = sample_service(booking.provider_id);
        let stored = vec![existing_review(&booking, 4), existing_review(&booking, 5)];
        let mut reviews = MockReviewRepository::new();
        reviews
            .expect_list_for_service()
            .returning(move |_| Ok(stored.clone()));
        let mut services = MockServiceRepository::new();
        services
            .expect_find_by_id()
            .returning(move |_| Ok(Some(service.clone())));
        let svc = build(reviews, None, services);

        let page = svc
            .service_reviews(booking.service_id)
            .await
            .expect("reviews");
        assert_eq!(page.reviews.len(), 2);
        assert_eq!(page.summary.count, 2);
        assert!((page.summary.average - 4.5).abs() < f64::EPSILON);
    }
}
