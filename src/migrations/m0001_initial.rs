use cetane::prelude::*;

pub fn migration() -> Migration {
    Migration::new("0001_initial_schema")
        .operation(RunSql::portable().for_backend(
            "sqlite",
            r#"CREATE TABLE videos (
    video_id TEXT PRIMARY KEY NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)"#,
        ))
        .operation(RunSql::portable().for_backend(
            "sqlite",
            "CREATE INDEX idx_videos_status ON videos(status)",
        ))
        .operation(RunSql::portable().for_backend(
            "sqlite",
            r#"CREATE TABLE comments (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    video_id TEXT NOT NULL,
    comment_id TEXT NOT NULL,
    comment_parent_id TEXT,
    text TEXT NOT NULL DEFAULT '',
    votes BIGINT NOT NULL DEFAULT 0,
    replies BIGINT NOT NULL DEFAULT 0,
    time_posted_raw TEXT NOT NULL DEFAULT '',
    time_posted TEXT,
    status TEXT NOT NULL DEFAULT 'pending',
    sentiment TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)"#,
        ))
        .operation(RunSql::portable().for_backend(
            "sqlite",
            "CREATE UNIQUE INDEX idx_comments_video_comment ON comments(video_id, comment_id)",
        ))
        .operation(RunSql::portable().for_backend(
            "sqlite",
            "CREATE INDEX idx_comments_video_status ON comments(video_id, status)",
        ))
}
