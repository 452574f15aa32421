use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::db::category::{replace_course_categories, resolve_categories};
use crate::error::AppError;
use crate::models::{Course, NewCourse};

/// Column list shared across course queries.
const COLUMNS: &str = "id, title, organizer, contact_person, start_date, end_date, course_form, \
    course_type, execution_type, address, target_audience, description, price, link";

/// Storage contract for courses.
///
/// Soft-deleted rows are invisible to every operation except
/// [`CourseRepository::soft_delete_by_id`], which is always a successful no-op
/// for unknown or already deleted ids.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn get_by_id(&self, id: i64) -> Result<Option<Course>, AppError>;
    async fn list_all(&self) -> Result<Vec<Course>, AppError>;
    async fn insert(&self, course: NewCourse) -> Result<Course, AppError>;
    async fn update_by_id(&self, id: i64, course: NewCourse) -> Result<Option<Course>, AppError>;
    async fn soft_delete_by_id(&self, id: i64) -> Result<(), AppError>;
}

pub struct SqliteCourseRepository {
    db: SqlitePool,
}

impl SqliteCourseRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CourseRepository for SqliteCourseRepository {
    async fn get_by_id(&self, id: i64) -> Result<Option<Course>, AppError> {
        let query = format!("SELECT {COLUMNS} FROM courses WHERE id = ?1 AND deleted = 0");
        let Some(mut course) = sqlx::query_as::<_, Course>(&query)
            .bind(id)
            .fetch_optional(&self.db)
            .await?
        else {
            debug!("course {} not found", id);
            return Ok(None);
        };

        course.category_names = sqlx::query_scalar::<_, String>(
            r#"
            SELECT c.name
            FROM course_categories cc
            JOIN categories c ON c.id = cc.category_id
            WHERE cc.course_id = ?1
            ORDER BY cc.position
            "#,
        )
        .bind(id)
        .fetch_all(&self.db)
        .await?;

        Ok(Some(course))
    }

    async fn list_all(&self) -> Result<Vec<Course>, AppError> {
        let query = format!("SELECT {COLUMNS} FROM courses WHERE deleted = 0 ORDER BY id");
        let mut courses = sqlx::query_as::<_, Course>(&query)
            .fetch_all(&self.db)
            .await?;

        let links = sqlx::query_as::<_, (i64, String)>(
            r#"
            SELECT cc.course_id, c.name
            FROM course_categories cc
            JOIN categories c ON c.id = cc.category_id
            JOIN courses co ON co.id = cc.course_id
            WHERE co.deleted = 0
            ORDER BY cc.course_id, cc.position
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let mut names_by_course: HashMap<i64, Vec<String>> = HashMap::new();
        for (course_id, name) in links {
            names_by_course.entry(course_id).or_default().push(name);
        }
        for course in &mut courses {
            course.category_names = names_by_course.remove(&course.id).unwrap_or_default();
        }

        debug!("listed {} courses", courses.len());
        Ok(courses)
    }

    async fn insert(&self, mut course: NewCourse) -> Result<Course, AppError> {
        let mut tx = self.db.begin().await?;

        let id = sqlx::query(
            r#"
            INSERT INTO courses
                (title, organizer, contact_person, start_date, end_date, course_form,
                course_type, execution_type, address, target_audience, description,
                price, link, deleted)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, 0)
            "#,
        )
        .bind(&course.title)
        .bind(&course.organizer)
        .bind(&course.contact_person)
        .bind(course.start_date)
        .bind(course.end_date)
        .bind(course.course_form)
        .bind(course.course_type)
        .bind(course.execution_type)
        .bind(&course.address)
        .bind(&course.target_audience)
        .bind(&course.description)
        .bind(&course.price)
        .bind(&course.link)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        let categories = resolve_categories(&mut tx, &course.category_names).await?;
        replace_course_categories(&mut tx, id, &categories).await?;

        tx.commit().await?;

        course.category_names = categories.into_iter().map(|c| c.name).collect();
        info!("created course {}", id);
        Ok(course.into_course(id))
    }

    async fn update_by_id(&self, id: i64, mut course: NewCourse) -> Result<Option<Course>, AppError> {
        let mut tx = self.db.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE courses
            SET title = ?1,
                organizer = ?2,
                contact_person = ?3,
                start_date = ?4,
                end_date = ?5,
                course_form = ?6,
                course_type = ?7,
                execution_type = ?8,
                address = ?9,
                target_audience = ?10,
                description = ?11,
                price = ?12,
                link = ?13
            WHERE id = ?14 AND deleted = 0
            "#,
        )
        .bind(&course.title)
        .bind(&course.organizer)
        .bind(&course.contact_person)
        .bind(course.start_date)
        .bind(course.end_date)
        .bind(course.course_form)
        .bind(course.course_type)
        .bind(course.execution_type)
        .bind(&course.address)
        .bind(&course.target_audience)
        .bind(&course.description)
        .bind(&course.price)
        .bind(&course.link)
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            debug!("course {} not updated: unknown or deleted", id);
            return Ok(None);
        }

        let categories = resolve_categories(&mut tx, &course.category_names).await?;
        replace_course_categories(&mut tx, id, &categories).await?;

        tx.commit().await?;

        course.category_names = categories.into_iter().map(|c| c.name).collect();
        info!("updated course {}", id);
        Ok(Some(course.into_course(id)))
    }

    async fn soft_delete_by_id(&self, id: i64) -> Result<(), AppError> {
        let affected = sqlx::query("UPDATE courses SET deleted = 1 WHERE id = ?1 AND deleted = 0")
            .bind(id)
            .execute(&self.db)
            .await?
            .rows_affected();

        if affected > 0 {
            info!("soft-deleted course {}", id);
        } else {
            debug!("soft delete of course {} was a no-op", id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_test_db;
    use crate::models::{CourseForm, CourseType, ExecutionType};

    fn new_course(title: &str) -> NewCourse {
        NewCourse {
            title: title.to_string(),
            organizer: "Norbert Neuorganizer".to_string(),
            contact_person: Some("Oskar NeuContactPerson".to_string()),
            start_date: Some("2020-01-03T21:00:00Z".parse().unwrap()),
            end_date: Some("2020-01-03T22:00:00Z".parse().unwrap()),
            course_form: Some(CourseForm::Certification),
            course_type: CourseType::External,
            execution_type: Some(ExecutionType::Remote),
            address: Some("Rochusstraße 2-4, 53123 Bonn".to_string()),
            target_audience: Some("Alle".to_string()),
            description: Some("Eine Veranstaltung".to_string()),
            price: Some("100€".to_string()),
            link: Some("http://tarent.de".to_string()),
            category_names: vec!["good category".to_string()],
        }
    }

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let repo = SqliteCourseRepository::new(setup_test_db().await);

        let created = repo.insert(new_course("Created")).await.unwrap();
        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.category_names, vec!["good category"]);
        assert_eq!(fetched.course_form, Some(CourseForm::Certification));
    }

    #[tokio::test]
    async fn ids_are_not_reused() {
        let repo = SqliteCourseRepository::new(setup_test_db().await);

        let first = repo.insert(new_course("first")).await.unwrap();
        repo.soft_delete_by_id(first.id).await.unwrap();
        let second = repo.insert(new_course("second")).await.unwrap();

        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn soft_deleted_course_is_hidden_but_kept() {
        let db = setup_test_db().await;
        let repo = SqliteCourseRepository::new(db.clone());

        let created = repo.insert(new_course("Doomed")).await.unwrap();
        repo.soft_delete_by_id(created.id).await.unwrap();
        repo.soft_delete_by_id(created.id).await.unwrap();

        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
        assert!(repo.list_all().await.unwrap().is_empty());
        assert!(
            repo.update_by_id(created.id, new_course("Revived"))
                .await
                .unwrap()
                .is_none()
        );

        let (title, deleted): (String, bool) =
            sqlx::query_as("SELECT title, deleted FROM courses WHERE id = ?1")
                .bind(created.id)
                .fetch_one(&db)
                .await
                .unwrap();
        assert_eq!(title, "Doomed");
        assert!(deleted);
    }

    #[tokio::test]
    async fn soft_delete_of_unknown_id_succeeds() {
        let repo = SqliteCourseRepository::new(setup_test_db().await);
        assert!(repo.soft_delete_by_id(123456789).await.is_ok());
    }

    #[tokio::test]
    async fn update_replaces_fields_and_categories() {
        let repo = SqliteCourseRepository::new(setup_test_db().await);
        let created = repo.insert(new_course("Before")).await.unwrap();

        let mut change = new_course("After");
        change.link = None;
        change.category_names = vec!["second".to_string(), "first".to_string()];
        let updated = repo.update_by_id(created.id, change).await.unwrap().unwrap();

        assert_eq!(updated.id, created.id);
        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "After");
        assert_eq!(fetched.link, None);
        assert_eq!(fetched.category_names, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn update_of_unknown_id_returns_none() {
        let repo = SqliteCourseRepository::new(setup_test_db().await);
        assert!(
            repo.update_by_id(123456789, new_course("x"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn list_all_attaches_categories_per_course() {
        let repo = SqliteCourseRepository::new(setup_test_db().await);

        let mut a = new_course("a");
        a.category_names = vec!["x".to_string(), "y".to_string()];
        let mut b = new_course("b");
        b.category_names = vec![];
        repo.insert(a).await.unwrap();
        repo.insert(b).await.unwrap();

        let courses = repo.list_all().await.unwrap();
        assert_eq!(courses.len(), 2);
        assert_eq!(courses[0].category_names, vec!["x", "y"]);
        assert!(courses[1].category_names.is_empty());
    }
}
