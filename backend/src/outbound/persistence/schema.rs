//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Registered accounts.
    users (id) {
        id -> Uuid,
        /// Lower-cased, unique.
        email -> Varchar,
        /// Self-describing Argon2 hash.
        password_hash -> Text,
        display_name -> Varchar,
        /// One of `client`, `provider`, `admin`.
        role -> Varchar,
        locale -> Varchar,
        phone -> Nullable<Varchar>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Service listings with bilingual copy.
    services (id) {
        id -> Uuid,
        provider_id -> Uuid,
        title_en -> Varchar,
        title_ar -> Nullable<Varchar>,
        description_en -> Text,
        description_ar -> Nullable<Text>,
        category -> Varchar,
        price_minor -> Int8,
        currency -> Bpchar,
        duration_minutes -> Int4,
        status -> Varchar,
        rejection_reason -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Bookings with a snapshot of the listing price.
    bookings (id) {
        id -> Uuid,
        service_id -> Uuid,
        client_id -> Uuid,
        provider_id -> Uuid,
        scheduled_at -> Timestamptz,
        notes -> Nullable<Text>,
        price_minor -> Int8,
        currency -> Bpchar,
        status -> Varchar,
        /// Set together with `cancel_reason`.
        cancelled_by -> Nullable<Uuid>,
        cancel_reason -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Payment attempts against bookings.
    payments (id) {
        id -> Uuid,
        booking_id -> Uuid,
        payer_id -> Uuid,
        amount_minor -> Int8,
        currency -> Bpchar,
        method -> Varchar,
        status -> Varchar,
        /// Gateway session or charge identifier; unique when present.
        provider_reference -> Nullable<Varchar>,
        checkout_url -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// One review per completed booking.
    reviews (id) {
        id -> Uuid,
        booking_id -> Uuid,
        service_id -> Uuid,
        client_id -> Uuid,
        rating -> Int2,
        comment -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Per-user notification inbox.
    notifications (id) {
        id -> Uuid,
        user_id -> Uuid,
        kind -> Varchar,
        title_en -> Text,
        title_ar -> Nullable<Text>,
        body_en -> Text,
        body_ar -> Nullable<Text>,
        reference_id -> Nullable<Uuid>,
        read -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Requests to become a provider. At most one pending row per user.
    provider_applications (id) {
        id -> Uuid,
        user_id -> Uuid,
        business_name -> Varchar,
        bio -> Nullable<Text>,
        categories -> Array<Text>,
        phone -> Varchar,
        status -> Varchar,
        rejection_reason -> Nullable<Text>,
        reviewed_by -> Nullable<Uuid>,
        reviewed_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(services -> users (provider_id));
diesel::joinable!(bookings -> services (service_id));
diesel::joinable!(payments -> bookings (booking_id));
diesel::joinable!(reviews -> bookings (booking_id));
diesel::joinable!(notifications -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    services,
    bookings,
    payments,
    reviews,
    notifications,
    provider_applications,
);
