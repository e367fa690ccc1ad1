//! In-process store implementing every repository port.
//!
//! Used when no database URL is configured and by the integration suite.
//! All tables sit behind one `RwLock`, so multi-record mutations such as an
//! application approval are atomic.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::ports::{
    ApplicationRepository, BookingRepository, NotificationRepository, PaymentRepository,
    RepositoryError, ReviewRepository, ServiceRepository, UserRepository,
};
use crate::domain::{
    ApplicationId, ApplicationStatus, Booking, BookingId, BookingParty, BookingStatus, Decision,
    Email, Notification, NotificationId, Payment, PaymentId, PaymentStatus, ProviderApplication,
    Review, Role, Service, ServiceCursorKey, ServiceFilter, ServiceId, ServiceStatus, StoredUser,
    User, UserId,
};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, StoredUser>,
    services: HashMap<ServiceId, Service>,
    bookings: HashMap<BookingId, Booking>,
    payments: HashMap<PaymentId, Payment>,
    reviews: Vec<Review>,
    notifications: Vec<Notification>,
    applications: Vec<ProviderApplication>,
}

/// Shared in-memory tables. Cloning shares the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn tally<K: Eq + std::hash::Hash + Copy>(keys: impl Iterator<Item = K>) -> Vec<(K, u64)> {
    let mut counts: HashMap<K, u64> = HashMap::new();
    for key in keys {
        *counts.entry(key).or_default() += 1;
    }
    counts.into_iter().collect()
}

/// Refuse to store `payment` as a second succeeded payment for its booking.
fn ensure_single_success(
    payments: &HashMap<PaymentId, Payment>,
    payment: &Payment,
) -> Result<(), RepositoryError> {
    if payment.status != PaymentStatus::Succeeded {
        return Ok(());
    }
    let clash = payments.values().any(|p| {
        p.id != payment.id
            && p.booking_id == payment.booking_id
            && p.status == PaymentStatus::Succeeded
    });
    if clash {
        return Err(RepositoryError::conflict(format!(
            "booking {} is already paid",
            payment.booking_id
        )));
    }
    Ok(())
}

fn replace<K, V>(map: &mut HashMap<K, V>, key: K, value: &V, what: &str) -> Result<(), RepositoryError>
where
    K: Eq + std::hash::Hash + std::fmt::Display,
    V: Clone,
{
    match map.get_mut(&key) {
        Some(slot) => {
            *slot = value.clone();
            Ok(())
        }
        None => Err(RepositoryError::missing(format!("{what} {key}"))),
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: &StoredUser) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .values()
            .any(|existing| existing.user.email == user.user.email)
        {
            return Err(RepositoryError::conflict("email already registered"));
        }
        tables.users.insert(user.user.id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&id).map(|stored| stored.user.clone()))
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<StoredUser>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|stored| &stored.user.email == email)
            .cloned())
    }

    async fn update_profile(&self, user: &User) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .users
            .get_mut(&user.id)
            .ok_or_else(|| RepositoryError::missing(format!("user {}", user.id)))?;
        stored.user = user.clone();
        Ok(())
    }

    async fn list(&self, role: Option<Role>) -> Result<Vec<User>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables
            .users
            .values()
            .map(|stored| stored.user.clone())
            .filter(|user| role.is_none_or(|r| user.role == r))
            .collect();
        users.sort_by_key(|user| (user.created_at, *user.id.as_uuid()));
        Ok(users)
    }

    async fn count_by_role(&self) -> Result<Vec<(Role, u64)>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tally(tables.users.values().map(|stored| stored.user.role)))
    }
}

#[async_trait]
impl ServiceRepository for MemoryStore {
    async fn insert(&self, service: &Service) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.services.contains_key(&service.id) {
            return Err(RepositoryError::conflict(format!("service {}", service.id)));
        }
        tables.services.insert(service.id, service.clone());
        Ok(())
    }

    async fn update(&self, service: &Service) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        replace(&mut tables.services, service.id, service, "service")
    }

    async fn find_by_id(&self, id: ServiceId) -> Result<Option<Service>, RepositoryError> {
        Ok(self.tables.read().await.services.get(&id).cloned())
    }

    async fn search(
        &self,
        filter: &ServiceFilter,
        after: Option<ServiceCursorKey>,
        limit: usize,
    ) -> Result<Vec<Service>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut matches: Vec<Service> = tables
            .services
            .values()
            .filter(|s| s.status == ServiceStatus::Approved && s.matches(filter))
            .filter(|s| after.as_ref().is_none_or(|key| key.precedes(s)))
            .cloned()
            .collect();
        matches.sort_by(|a, b| {
            (b.created_at, b.id.as_uuid()).cmp(&(a.created_at, a.id.as_uuid()))
        });
        matches.truncate(limit);
        Ok(matches)
    }

    async fn list_by_provider(&self, provider: UserId) -> Result<Vec<Service>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut services: Vec<Service> = tables
            .services
            .values()
            .filter(|s| s.provider_id == provider)
            .cloned()
            .collect();
        services.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(services)
    }

    async fn list_by_status(&self, status: ServiceStatus) -> Result<Vec<Service>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut services: Vec<Service> = tables
            .services
            .values()
            .filter(|s| s.status == status)
            .cloned()
            .collect();
        services.sort_by_key(|s| s.updated_at);
        Ok(services)
    }

    async fn count_by_status(&self) -> Result<Vec<(ServiceStatus, u64)>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tally(tables.services.values().map(|s| s.status)))
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn insert(&self, booking: &Booking) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        tables.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn update(
        &self,
        booking: &Booking,
        expected: BookingStatus,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .bookings
            .get_mut(&booking.id)
            .ok_or_else(|| RepositoryError::missing(format!("booking {}", booking.id)))?;
        if stored.status != expected {
            return Err(RepositoryError::conflict(format!(
                "booking {} is no longer {}",
                booking.id,
                expected.as_str()
            )));
        }
        *stored = booking.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: BookingId) -> Result<Option<Booking>, RepositoryError> {
        Ok(self.tables.read().await.bookings.get(&id).cloned())
    }

    async fn list_for(
        &self,
        user: UserId,
        party: BookingParty,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut bookings: Vec<Booking> = tables
            .bookings
            .values()
            .filter(|b| match party {
                BookingParty::Client => b.client_id == user,
                BookingParty::Provider => b.provider_id == user,
            })
            .filter(|b| status.is_none_or(|s| b.status == s))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.scheduled_at.cmp(&a.scheduled_at));
        Ok(bookings)
    }

    async fn count_by_status(&self) -> Result<Vec<(BookingStatus, u64)>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tally(tables.bookings.values().map(|b| b.status)))
    }
}

#[async_trait]
impl PaymentRepository for MemoryStore {
    async fn insert(&self, payment: &Payment) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        ensure_single_success(&tables.payments, payment)?;
        tables.payments.insert(payment.id, payment.clone());
        Ok(())
    }

    async fn update(&self, payment: &Payment) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        ensure_single_success(&tables.payments, payment)?;
        replace(&mut tables.payments, payment.id, payment, "payment")
    }

    async fn find_by_id(&self, id: PaymentId) -> Result<Option<Payment>, RepositoryError> {
        Ok(self.tables.read().await.payments.get(&id).cloned())
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<Payment>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .payments
            .values()
            .find(|p| p.provider_reference.as_deref() == Some(reference))
            .cloned())
    }

    async fn list_for_booking(&self, booking: BookingId) -> Result<Vec<Payment>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut payments: Vec<Payment> = tables
            .payments
            .values()
            .filter(|p| p.booking_id == booking)
            .cloned()
            .collect();
        payments.sort_by_key(|p| p.created_at);
        Ok(payments)
    }

    async fn list(&self, payer: Option<UserId>) -> Result<Vec<Payment>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut payments: Vec<Payment> = tables
            .payments
            .values()
            .filter(|p| payer.is_none_or(|id| p.payer_id == id))
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(payments)
    }

    async fn succeeded_volume(&self) -> Result<Vec<(String, i64)>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut volume: HashMap<String, i64> = HashMap::new();
        for payment in tables
            .payments
            .values()
            .filter(|p| p.status == PaymentStatus::Succeeded)
        {
            *volume
                .entry(payment.amount.currency().to_owned())
                .or_default() += payment.amount.amount_minor();
        }
        let mut rows: Vec<(String, i64)> = volume.into_iter().collect();
        rows.sort();
        Ok(rows)
    }
}

#[async_trait]
impl ReviewRepository for MemoryStore {
    async fn insert(&self, review: &Review) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.reviews.iter().any(|r| r.booking_id == review.booking_id) {
            return Err(RepositoryError::conflict(format!(
                "booking {} already reviewed",
                review.booking_id
            )));
        }
        tables.reviews.push(review.clone());
        Ok(())
    }

    async fn find_by_booking(&self, booking: BookingId) -> Result<Option<Review>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .reviews
            .iter()
            .find(|r| r.booking_id == booking)
            .cloned())
    }

    async fn list_for_service(&self, service: ServiceId) -> Result<Vec<Review>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut reviews: Vec<Review> = tables
            .reviews
            .iter()
            .filter(|r| r.service_id == service)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }
}

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn insert(&self, notification: &Notification) -> Result<(), RepositoryError> {
        self.tables
            .write()
            .await
            .notifications
            .push(notification.clone());
        Ok(())
    }

    async fn list_for(
        &self,
        user: UserId,
        unread_only: bool,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut notifications: Vec<Notification> = tables
            .notifications
            .iter()
            .filter(|n| n.user_id == user && !(unread_only && n.read))
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notifications)
    }

    async fn mark_read(
        &self,
        id: NotificationId,
        user: UserId,
    ) -> Result<Option<Notification>, RepositoryError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user)
            .map(|n| {
                n.read = true;
                n.clone()
            }))
    }

    async fn mark_all_read(&self, user: UserId) -> Result<u64, RepositoryError> {
        let mut tables = self.tables.write().await;
        let mut changed = 0;
        for notification in tables
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == user && !n.read)
        {
            notification.read = true;
            changed += 1;
        }
        Ok(changed)
    }
}

#[async_trait]
impl ApplicationRepository for MemoryStore {
    async fn insert(&self, application: &ProviderApplication) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.applications.iter().any(|a| {
            a.user_id == application.user_id && a.status == ApplicationStatus::Pending
        }) {
            return Err(RepositoryError::conflict("application already pending"));
        }
        tables.applications.push(application.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: ApplicationId,
    ) -> Result<Option<ProviderApplication>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.applications.iter().find(|a| a.id == id).cloned())
    }

    async fn latest_for_user(
        &self,
        user: UserId,
    ) -> Result<Option<ProviderApplication>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .applications
            .iter()
            .filter(|a| a.user_id == user)
            .max_by_key(|a| a.created_at)
            .cloned())
    }

    async fn list(
        &self,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<ProviderApplication>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut applications: Vec<ProviderApplication> = tables
            .applications
            .iter()
            .filter(|a| status.is_none_or(|s| a.status == s))
            .cloned()
            .collect();
        applications.sort_by_key(|a| a.created_at);
        Ok(applications)
    }

    async fn decide(
        &self,
        id: ApplicationId,
        decision: &Decision,
        reviewer: UserId,
        at: DateTime<Utc>,
    ) -> Result<ProviderApplication, RepositoryError> {
        let mut tables = self.tables.write().await;
        let Tables {
            users,
            applications,
            ..
        } = &mut *tables;
        let application = applications
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| RepositoryError::missing(format!("application {id}")))?;
        if application.status != ApplicationStatus::Pending {
            return Err(RepositoryError::conflict(format!(
                "application {id} is {}",
                application.status.as_str()
            )));
        }
        match decision {
            Decision::Approve => {
                let applicant = users.get_mut(&application.user_id).ok_or_else(|| {
                    RepositoryError::missing(format!("user {}", application.user_id))
                })?;
                applicant.user.role = Role::Provider;
                application.status = ApplicationStatus::Approved;
            }
            Decision::Reject { reason } => {
                application.status = ApplicationStatus::Rejected;
                application.rejection_reason = Some(reason.clone());
            }
        }
        application.reviewed_by = Some(reviewer);
        application.reviewed_at = Some(at);
        Ok(application.clone())
    }
}

#[cfg(test)]
mod tests;
