//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly.

diesel::table! {
    /// Named cohorts users can belong to.
    segments (slug) {
        /// Word-token identifier, at most 32 characters.
        slug -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Users known to the segment store.
    users (id) {
        id -> Int8,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Membership rows; one per (user, segment) pair.
    users_segments (user_id, slug) {
        user_id -> Int8,
        slug -> Varchar,
        /// `NULL` for permanent memberships.
        expires_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Append-only membership change history.
    audit_log (id) {
        id -> Int8,
        user_id -> Int8,
        slug -> Varchar,
        /// `add` or `delete`.
        operation -> Varchar,
        recorded_at -> Timestamptz,
    }
}

diesel::joinable!(users_segments -> segments (slug));
diesel::joinable!(users_segments -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(audit_log, segments, users, users_segments);
