use std::sync::Arc;

use sqlx::SqlitePool;

use crate::db::{CourseRepository, SqliteCourseRepository};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub courses: Arc<dyn CourseRepository>,
}

impl AppState {
    /// State backed by the SQLite course repository on `db`.
    pub fn new(db: SqlitePool) -> Self {
        let courses = Arc::new(SqliteCourseRepository::new(db.clone()));
        Self { db, courses }
    }
}
