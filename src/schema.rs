// Kept in sync with migrations/m0001_initial.rs by hand.

diesel::table! {
    videos (video_id) {
        video_id -> Text,
        status -> Text,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    comments (id) {
        id -> Integer,
        video_id -> Text,
        comment_id -> Text,
        comment_parent_id -> Nullable<Text>,
        text -> Text,
        votes -> BigInt,
        replies -> BigInt,
        time_posted_raw -> Text,
        time_posted -> Nullable<Text>,
        status -> Text,
        sentiment -> Nullable<Text>,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(videos, comments);
