//! Shared fixtures and doubles for unit tests.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::{
    Booking, BookingId, BookingStatus, Category, DisplayName, Email, Locale, LocalizedText, Money,
    Role, Service, ServiceId, ServiceStatus, User, UserId,
};

/// Fixed instant every unit test treats as "now".
pub fn fixture_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

/// Clock that only moves when told to.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance_seconds(&self, seconds: i64) {
        *self.lock_clock() += TimeDelta::seconds(seconds);
    }

    fn lock_clock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Clock frozen at [`fixture_now`].
pub fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(MutableClock::new(fixture_now()))
}

/// Account with `role` created at [`fixture_now`].
pub fn sample_user(role: Role) -> User {
    User {
        id: UserId::random(),
        email: Email::new(format!("{}@example.com", role.as_str())).expect("email"),
        display_name: DisplayName::new("Sample User").expect("display name"),
        role,
        locale: Locale::En,
        phone: None,
        created_at: fixture_now(),
    }
}

/// Approved cleaning listing owned by `provider`.
pub fn sample_service(provider: UserId) -> Service {
    Service {
        id: ServiceId::random(),
        provider_id: provider,
        title: LocalizedText::from_pair("Deep home cleaning", "تنظيف عميق للمنزل"),
        description: LocalizedText::from_pair("All rooms, three cleaners.", "جميع الغرف."),
        category: Category::new("cleaning").expect("category"),
        price: Money::new(25_000, "SAR").expect("price"),
        duration_minutes: 180,
        status: ServiceStatus::Approved,
        rejection_reason: None,
        created_at: fixture_now(),
        updated_at: fixture_now(),
    }
}

/// Booking of `service` by `client` in `status`, scheduled a day ahead.
pub fn sample_booking(service: &Service, client: UserId, status: BookingStatus) -> Booking {
    Booking {
        id: BookingId::random(),
        service_id: service.id,
        client_id: client,
        provider_id: service.provider_id,
        scheduled_at: fixture_now() + TimeDelta::days(1),
        notes: None,
        price: service.price.clone(),
        status,
        cancellation: None,
        created_at: fixture_now(),
        updated_at: fixture_now(),
    }
}
