use crate::{
    models::{Category, CategoryOverview, Department, DepartmentOverview, Location, LocationOverview},
    PGPool,
};

fn pattern(q: Option<&str>) -> Option<String> {
    q.map(str::trim).filter(|q| !q.is_empty()).map(|q| format!("%{}%", q))
}

pub async fn list_departments(q: Option<&str>, pool: &PGPool) -> Result<Vec<DepartmentOverview>, sqlx::Error> {
    sqlx::query_as::<_, DepartmentOverview>(
        "SELECT d.id, d.name, \
         (SELECT COUNT(*) FROM events e WHERE e.department_id = d.id) AS events_count, \
         (SELECT COUNT(*) FROM users u WHERE u.department_id = d.id) AS users_count \
         FROM departments d \
         WHERE ($1::TEXT IS NULL OR d.name ILIKE $1) \
         ORDER BY d.name",
    )
    .bind(pattern(q))
    .fetch_all(pool)
    .await
}

pub async fn get_department(id: i64, pool: &PGPool) -> Result<Option<Department>, sqlx::Error> {
    sqlx::query_as::<_, Department>("SELECT id, name FROM departments WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn create_department(name: &str, pool: &PGPool) -> Result<Department, sqlx::Error> {
    sqlx::query_as::<_, Department>("INSERT INTO departments (name) VALUES ($1) RETURNING id, name")
        .bind(name)
        .fetch_one(pool)
        .await
}

pub async fn update_department(id: i64, name: &str, pool: &PGPool) -> Result<Option<Department>, sqlx::Error> {
    sqlx::query_as::<_, Department>("UPDATE departments SET name = $2 WHERE id = $1 RETURNING id, name")
        .bind(id)
        .bind(name)
        .fetch_optional(pool)
        .await
}

pub async fn delete_department(id: i64, pool: &PGPool) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("DELETE FROM departments WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn list_categories(q: Option<&str>, pool: &PGPool) -> Result<Vec<CategoryOverview>, sqlx::Error> {
    sqlx::query_as::<_, CategoryOverview>(
        "SELECT c.id, c.name, c.color, c.description, \
         (SELECT COUNT(*) FROM events e WHERE e.category_id = c.id) AS events_count \
         FROM categories c \
         WHERE ($1::TEXT IS NULL OR c.name ILIKE $1 OR c.description ILIKE $1) \
         ORDER BY c.name",
    )
    .bind(pattern(q))
    .fetch_all(pool)
    .await
}

pub async fn get_category(id: i64, pool: &PGPool) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>("SELECT id, name, color, description FROM categories WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn create_category(category: &Category, pool: &PGPool) -> Result<Category, sqlx::Error> {
    sqlx::query_as::<_, Category>(
        "INSERT INTO categories (name, color, description) VALUES ($1, $2, $3) \
         RETURNING id, name, color, description",
    )
    .bind(&category.name)
    .bind(&category.color)
    .bind(&category.description)
    .fetch_one(pool)
    .await
}

pub async fn update_category(category: &Category, pool: &PGPool) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(
        "UPDATE categories SET name = $2, color = $3, description = $4 WHERE id = $1 \
         RETURNING id, name, color, description",
    )
    .bind(category.id)
    .bind(&category.name)
    .bind(&category.color)
    .bind(&category.description)
    .fetch_optional(pool)
    .await
}

pub async fn delete_category(id: i64, pool: &PGPool) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn list_locations(q: Option<&str>, pool: &PGPool) -> Result<Vec<LocationOverview>, sqlx::Error> {
    sqlx::query_as::<_, LocationOverview>(
        "SELECT l.id, l.name, l.address, l.description, \
         (SELECT COUNT(*) FROM event_locations el WHERE el.location_id = l.id) AS events_count \
         FROM locations l \
         WHERE ($1::TEXT IS NULL OR l.name ILIKE $1 OR l.address ILIKE $1 OR l.description ILIKE $1) \
         ORDER BY l.name",
    )
    .bind(pattern(q))
    .fetch_all(pool)
    .await
}

/// Plain rows, used for name matching during legacy import.
pub async fn all_locations(pool: &PGPool) -> Result<Vec<Location>, sqlx::Error> {
    sqlx::query_as::<_, Location>("SELECT id, name, address, description FROM locations ORDER BY name")
        .fetch_all(pool)
        .await
}

pub async fn get_location(id: i64, pool: &PGPool) -> Result<Option<Location>, sqlx::Error> {
    sqlx::query_as::<_, Location>("SELECT id, name, address, description FROM locations WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn create_location(location: &Location, pool: &PGPool) -> Result<Location, sqlx::Error> {
    sqlx::query_as::<_, Location>(
        "INSERT INTO locations (name, address, description) VALUES ($1, $2, $3) \
         RETURNING id, name, address, description",
    )
    .bind(&location.name)
    .bind(&location.address)
    .bind(&location.description)
    .fetch_one(pool)
    .await
}

pub async fn update_location(location: &Location, pool: &PGPool) -> Result<Option<Location>, sqlx::Error> {
    sqlx::query_as::<_, Location>(
        "UPDATE locations SET name = $2, address = $3, description = $4 WHERE id = $1 \
         RETURNING id, name, address, description",
    )
    .bind(location.id)
    .bind(&location.name)
    .bind(&location.address)
    .bind(&location.description)
    .fetch_optional(pool)
    .await
}

pub async fn delete_location(id: i64, pool: &PGPool) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("DELETE FROM locations WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}
