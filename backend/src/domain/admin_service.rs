//! Moderation queue, user directory and the admin dashboard.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use super::ports::UserRepository;
use super::service_support::map_repository_error;
use super::{
    BookingService, CatalogueService, Decision, Error, Money, NotificationKind,
    NotificationService, PaymentService, Principal, Role, Service, ServiceId, User,
};

/// Count of records sharing one status or role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StatusCount {
    pub status: String,
    pub count: u64,
}

impl StatusCount {
    fn tally<S: AsRef<str>>(rows: impl IntoIterator<Item = (S, u64)>) -> Vec<Self> {
        let mut counts: Vec<Self> = rows
            .into_iter()
            .map(|(status, count)| Self {
                status: status.as_ref().to_owned(),
                count,
            })
            .collect();
        counts.sort_by(|a, b| a.status.cmp(&b.status));
        counts
    }
}

/// Marketplace totals for admins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub users_by_role: Vec<StatusCount>,
    pub services_by_status: Vec<StatusCount>,
    pub bookings_by_status: Vec<StatusCount>,
    /// Gross volume of succeeded payments per currency.
    pub payment_volume: Vec<Money>,
}

/// Admin-only use-cases spanning several aggregates.
#[derive(Clone)]
pub struct AdminService {
    users: Arc<dyn UserRepository>,
    catalogue: CatalogueService,
    bookings: BookingService,
    payments: PaymentService,
    notifications: NotificationService,
}

impl AdminService {
    /// Wire the service to its collaborators.
    pub fn new(
        users: Arc<dyn UserRepository>,
        catalogue: CatalogueService,
        bookings: BookingService,
        payments: PaymentService,
        notifications: NotificationService,
    ) -> Self {
        Self {
            users,
            catalogue,
            bookings,
            payments,
            notifications,
        }
    }

    /// Listings awaiting review.
    pub async fn pending_services(&self, actor: Principal) -> Result<Vec<Service>, Error> {
        actor.require(Role::Admin)?;
        self.catalogue.pending().await
    }

    /// Approve or reject a pending listing and tell its provider.
    pub async fn decide_service(
        &self,
        actor: Principal,
        id: ServiceId,
        decision: Decision,
    ) -> Result<Service, Error> {
        actor.require(Role::Admin)?;
        let (rejection, kind) = match decision {
            Decision::Approve => (None, NotificationKind::ServiceApproved),
            Decision::Reject { reason } => (Some(reason), NotificationKind::ServiceRejected),
        };
        let service = self.catalogue.decide(id, rejection).await?;
        info!(
            service_id = %id,
            status = service.status.as_str(),
            reviewer = %actor.user_id,
            "service decided"
        );
        self.notifications
            .notify(
                service.provider_id,
                kind,
                Some(*id.as_uuid()),
                service.rejection_reason.as_deref(),
            )
            .await;
        Ok(service)
    }

    /// Accounts, optionally restricted to one role.
    pub async fn list_users(&self, actor: Principal, role: Option<Role>) -> Result<Vec<User>, Error> {
        actor.require(Role::Admin)?;
        self.users.list(role).await.map_err(map_repository_error)
    }

    /// Aggregate counts across the marketplace.
    pub async fn dashboard(&self, actor: Principal) -> Result<Dashboard, Error> {
        actor.require(Role::Admin)?;
        let users = self
            .users
            .count_by_role()
            .await
            .map_err(map_repository_error)?;
        let services = self.catalogue.count_by_status().await?;
        let bookings = self.bookings.count_by_status().await?;
        let payment_volume = self
            .payments
            .succeeded_volume()
            .await?
            .into_iter()
            .map(|(currency, amount)| {
                Money::new(amount, &currency)
                    .map_err(|err| Error::internal(format!("stored volume for {currency}: {err}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Dashboard {
            users_by_role: StatusCount::tally(users.into_iter().map(|(r, n)| (r.as_str(), n))),
            services_by_status: StatusCount::tally(
                services.into_iter().map(|(s, n)| (s.as_str(), n)),
            ),
            bookings_by_status: StatusCount::tally(
                bookings.into_iter().map(|(s, n)| (s.as_str(), n)),
            ),
            payment_volume,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{
        MockBookingRepository, MockNotificationPublisher, MockNotificationRepository,
        MockPaymentGateway, MockPaymentRepository, MockServiceRepository, MockUserRepository,
        MockWebhookVerifier,
    };
    use crate::domain::{BookingStatus, ErrorCode, PaymentGateways, ServiceStatus, UserId};
    use crate::test_support::{fixed_clock, sample_service};
    use rstest::rstest;

    struct Mocks {
        users: MockUserRepository,
        services: MockServiceRepository,
        bookings: MockBookingRepository,
        payments: MockPaymentRepository,
        notifications: MockNotificationRepository,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                users: MockUserRepository::new(),
                services: MockServiceRepository::new(),
                bookings: MockBookingRepository::new(),
                payments: MockPaymentRepository::new(),
                notifications: MockNotificationRepository::new(),
            }
        }

        fn build(self) -> AdminService {
            let clock = fixed_clock();
            let mut publisher = MockNotificationPublisher::new();
            publisher.expect_publish().return_const(());
            let notifications = NotificationService::new(
                Arc::new(self.notifications),
                Arc::new(publisher),
                clock.clone(),
            );
            let catalogue = CatalogueService::new(Arc::new(self.services), clock.clone());
            let bookings: Arc<MockBookingRepository> = Arc::new(self.bookings);
            let payments: Arc<MockPaymentRepository> = Arc::new(self.payments);
            let booking_service = BookingService::new(
                bookings.clone(),
                payments.clone(),
                catalogue.clone(),
                notifications.clone(),
                clock.clone(),
            );
            let payment_service = PaymentService::new(
                payments,
                bookings,
                catalogue.clone(),
                PaymentGateways {
                    card: Arc::new(MockPaymentGateway::new()),
                    apple_pay: Arc::new(MockPaymentGateway::new()),
                },
                Arc::new(MockWebhookVerifier::new()),
                notifications.clone(),
                clock,
            );
            AdminService::new(
                Arc::new(self.users),
                catalogue,
                booking_service,
                payment_service,
                notifications,
            )
        }
    }

    fn admin() -> Principal {
        Principal {
            user_id: UserId::random(),
            role: Role::Admin,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn rejecting_a_listing_notifies_provider_with_reason() {
        let mut pending = sample_service(UserId::random());
        pending.status = ServiceStatus::PendingApproval;
        let provider = pending.provider_id;
        let mut mocks = Mocks::new();
        let found = pending.clone();
        mocks
            .services
            .expect_find_by_id()
            .returning(move |_| Ok(Some(found.clone())));
        mocks
            .services
            .expect_update()
            .withf(|s| s.status == ServiceStatus::Rejected)
            .times(1)
            .returning(|_| Ok(()));
        mocks
            .notifications
            .expect_insert()
            .withf(move |n| {
                n.user_id == provider
                    && n.kind == NotificationKind::ServiceRejected
                    && n.body.en().contains("Photos are missing")
            })
            .times(1)
            .returning(|_| Ok(()));
        let svc = mocks.build();
        let decision = Decision::reject("Photos are missing").expect("reason");

        let service = svc
            .decide_service(admin(), pending.id, decision)
            .await
            .expect("rejected");
        assert_eq!(service.rejection_reason.as_deref(), Some("Photos are missing"));
    }

    #[rstest]
    #[tokio::test]
    async fn approved_listings_cannot_be_decided_again() {
        let approved = sample_service(UserId::random());
        let mut mocks = Mocks::new();
        let found = approved.clone();
        mocks
            .services
            .expect_find_by_id()
            .returning(move |_| Ok(Some(found.clone())));
        let svc = mocks.build();

        let err = svc
            .decide_service(admin(), approved.id, Decision::Approve)
            .await
            .expect_err("conflict");
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[rstest]
    #[case(Role::Client)]
    #[case(Role::Provider)]
    #[tokio::test]
    async fn dashboard_is_admin_only(#[case] role: Role) {
        let svc = Mocks::new().build();
        let actor = Principal {
            user_id: UserId::random(),
            role,
        };
        let err = svc.dashboard(actor).await.expect_err("forbidden");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    #[tokio::test]
    async fn dashboard_collects_counts() {
        let mut mocks = Mocks::new();
        mocks
            .users
            .expect_count_by_role()
            .returning(|| Ok(vec![(Role::Provider, 2), (Role::Client, 5)]));
        mocks
            .services
            .expect_count_by_status()
            .returning(|| Ok(vec![(ServiceStatus::Approved, 3)]));
        mocks
            .bookings
            .expect_count_by_status()
            .returning(|| Ok(vec![(BookingStatus::Completed, 4), (BookingStatus::Pending, 1)]));
        mocks
            .payments
            .expect_succeeded_volume()
            .returning(|| Ok(vec![("SAR".to_owned(), 100_000)]));
        let svc = mocks.build();

        let dashboard = svc.dashboard(admin()).await.expect("dashboard");
        assert_eq!(
            dashboard.users_by_role,
            vec![
                StatusCount { status: "client".into(), count: 5 },
                StatusCount { status: "provider".into(), count: 2 },
            ]
        );
        assert_eq!(dashboard.bookings_by_status[0].status, "completed");
        assert_eq!(dashboard.payment_volume[0].amount_minor(), 100_000);
    }
}
