diesel::table! {
    identities (id) {
        id -> Uuid,
        email -> Varchar,
        password_hash -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    profiles (user_id) {
        user_id -> Uuid,
        gamertag -> Varchar,
        full_name -> Varchar,
        email -> Varchar,
        dob -> Date,
        phone -> Nullable<Varchar>,
        role -> Varchar,
        is_admin -> Bool,
        is_superadmin -> Bool,
        experience_years -> Nullable<Int4>,
        platforms -> Array<Text>,
        game_title -> Nullable<Varchar>,
        followers_instagram -> Nullable<Int4>,
        followers_twitch -> Nullable<Int4>,
        bio -> Nullable<Text>,
        is_minor -> Bool,
        guardian_name -> Nullable<Varchar>,
        guardian_phone -> Nullable<Varchar>,
        photo_path -> Nullable<Varchar>,
        applied_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    support_tickets (id) {
        id -> Uuid,
        owner_id -> Uuid,
        subject -> Varchar,
        message -> Text,
        category -> Varchar,
        status -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    ticket_feedback (id) {
        id -> Uuid,
        ticket_id -> Uuid,
        author_id -> Uuid,
        author_name -> Varchar,
        author_role -> Varchar,
        content -> Text,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(ticket_feedback -> support_tickets (ticket_id));
diesel::allow_tables_to_appear_in_same_query!(identities, profiles, support_tickets, ticket_feedback);
