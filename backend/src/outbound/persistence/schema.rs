//! Diesel table definitions. Keep in sync with `backend/migrations`.

diesel::table! {
    users (id) {
        id -> Int8,
        username -> Text,
        email -> Text,
        password_hash -> Text,
        role -> Text,
        expiration -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    devices (id) {
        id -> Int4,
        hostname -> Text,
        is_turn_on -> Bool,
        owner -> Nullable<Int8>,
    }
}

diesel::joinable!(devices -> users (owner));
diesel::allow_tables_to_appear_in_same_query!(devices, users);
