//! Diesel ORM models for database tables.
//!
//! Timestamps are stored as RFC 3339 text and statuses as their lowercase
//! names; conversion to domain types happens in the repositories.

use diesel::prelude::*;

use crate::schema;

/// Video record from the database.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::videos)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct VideoRecord {
    pub video_id: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

/// New video for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::videos)]
pub struct NewVideo<'a> {
    pub video_id: &'a str,
    pub status: &'a str,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

/// Comment record from the database.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::comments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CommentRecord {
    pub id: i32,
    pub video_id: String,
    pub comment_id: String,
    pub comment_parent_id: Option<String>,
    pub text: String,
    pub votes: i64,
    pub replies: i64,
    pub time_posted_raw: String,
    pub time_posted: Option<String>,
    pub status: String,
    pub sentiment: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// New comment for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::comments)]
pub struct NewComment<'a> {
    pub video_id: &'a str,
    pub comment_id: &'a str,
    pub comment_parent_id: Option<&'a str>,
    pub text: &'a str,
    pub votes: i64,
    pub replies: i64,
    pub time_posted_raw: &'a str,
    pub time_posted: Option<&'a str>,
    pub status: &'a str,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}
