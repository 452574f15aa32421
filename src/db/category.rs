use sqlx::SqliteConnection;
use tracing::debug;

use crate::models::Category;

/// Maps `names` to stored categories, creating the missing ones.
///
/// Output order follows the first occurrence of each name in `names`. Relies on
/// the unique constraint on `categories.name`, so concurrent callers never
/// produce duplicates.
pub async fn resolve_categories(
    conn: &mut SqliteConnection,
    names: &[String],
) -> Result<Vec<Category>, sqlx::Error> {
    let mut categories: Vec<Category> = Vec::with_capacity(names.len());

    for name in names {
        if categories.iter().any(|c| &c.name == name) {
            continue;
        }

        let created = sqlx::query("INSERT INTO categories (name) VALUES (?1) ON CONFLICT(name) DO NOTHING")
            .bind(name)
            .execute(&mut *conn)
            .await?
            .rows_affected();
        if created > 0 {
            debug!("created category {:?}", name);
        }

        let category = sqlx::query_as::<_, Category>("SELECT id, name FROM categories WHERE name = ?1")
            .bind(name)
            .fetch_one(&mut *conn)
            .await?;
        categories.push(category);
    }

    Ok(categories)
}

/// Replaces the category associations of a course, keeping the given order.
pub async fn replace_course_categories(
    conn: &mut SqliteConnection,
    course_id: i64,
    categories: &[Category],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM course_categories WHERE course_id = ?1")
        .bind(course_id)
        .execute(&mut *conn)
        .await?;

    for (position, category) in categories.iter().enumerate() {
        sqlx::query(
            "INSERT INTO course_categories (course_id, category_id, position) VALUES (?1, ?2, ?3)",
        )
        .bind(course_id)
        .bind(category.id)
        .bind(position as i64)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}
