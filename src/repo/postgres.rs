use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgExecutor, PgPool};
use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use super::{Course, NewCourse, NewStudent, Repository, Student};
use crate::{config::DatabaseConfig, error::AppError};

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgRepository {
    db: PgPool,
}

impl PgRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(config.connect_options()?)
            .await
            .context("connect to database")?;
        info!("database connected");
        Ok(Self::new(db))
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .context("run migrations")?;
        info!("database migrations applied");
        Ok(())
    }
}

/// Turns a unique-key violation into `ConstraintViolation`; anything else is a store failure.
fn unique_or_store(err: sqlx::Error, message: impl FnOnce() -> String) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::ConstraintViolation(message())
        }
        _ => AppError::Store(err),
    }
}

async fn courses_of<'e, E: PgExecutor<'e>>(
    exec: E,
    student_id: Uuid,
) -> Result<Vec<Course>, AppError> {
    let rows = sqlx::query_as::<_, Course>(
        r#"
        SELECT c.id, c.active, c.created_at, c.updated_at, c.deleted_at,
               c.title, c.price, c.description, c.instructor, c.category
          FROM courses c
          JOIN student_courses sc ON sc.course_id = c.id
         WHERE sc.student_id = $1 AND c.deleted_at IS NULL
         ORDER BY c.title
        "#,
    )
    .bind(student_id)
    .fetch_all(exec)
    .await?;
    Ok(rows)
}

async fn students_of<'e, E: PgExecutor<'e>>(
    exec: E,
    course_id: Uuid,
) -> Result<Vec<Student>, AppError> {
    let rows = sqlx::query_as::<_, Student>(
        r#"
        SELECT s.id, s.active, s.created_at, s.updated_at, s.deleted_at,
               s.first_name, s.last_name, s.email
          FROM students s
          JOIN student_courses sc ON sc.student_id = s.id
         WHERE sc.course_id = $1 AND s.deleted_at IS NULL
         ORDER BY s.email
        "#,
    )
    .bind(course_id)
    .fetch_all(exec)
    .await?;
    Ok(rows)
}

#[async_trait]
impl Repository for PgRepository {
    async fn create_student(&self, new: NewStudent) -> Result<Student, AppError> {
        let email = new.email.clone();
        let student = sqlx::query_as::<_, Student>(
            r#"
            INSERT INTO students (id, first_name, last_name, email)
            VALUES ($1, $2, $3, $4)
            RETURNING id, active, created_at, updated_at, deleted_at,
                      first_name, last_name, email
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.email)
        .fetch_one(&self.db)
        .await
        .map_err(|e| unique_or_store(e, || format!("email {} is already registered", email)))?;
        Ok(student)
    }

    async fn create_course(&self, new: NewCourse) -> Result<Course, AppError> {
        let title = new.title.clone();
        let course = sqlx::query_as::<_, Course>(
            r#"
            INSERT INTO courses (id, title, price, description, instructor, category)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, active, created_at, updated_at, deleted_at,
                      title, price, description, instructor, category
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.title)
        .bind(new.price)
        .bind(&new.description)
        .bind(&new.instructor)
        .bind(&new.category)
        .fetch_one(&self.db)
        .await
        .map_err(|e| unique_or_store(e, || format!("course {} already exists", title)))?;
        Ok(course)
    }

    async fn get_student(&self, email: &str) -> Result<Option<Student>, AppError> {
        let student = sqlx::query_as::<_, Student>(
            r#"
            SELECT id, active, created_at, updated_at, deleted_at,
                   first_name, last_name, email
              FROM students
             WHERE email = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;

        let Some(mut student) = student else {
            return Ok(None);
        };
        student.courses = courses_of(&self.db, student.record.id).await?;
        Ok(Some(student))
    }

    async fn get_course(&self, title: &str) -> Result<Option<Course>, AppError> {
        let course = sqlx::query_as::<_, Course>(
            r#"
            SELECT id, active, created_at, updated_at, deleted_at,
                   title, price, description, instructor, category
              FROM courses
             WHERE title = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(title)
        .fetch_optional(&self.db)
        .await?;

        let Some(mut course) = course else {
            return Ok(None);
        };
        course.students = students_of(&self.db, course.record.id).await?;
        Ok(Some(course))
    }

    async fn assign_course_to_student(
        &self,
        email: &str,
        title: &str,
    ) -> Result<Student, AppError> {
        let mut tx = self.db.begin().await?;

        // Row lock serializes concurrent assignments for the same student.
        let mut student = sqlx::query_as::<_, Student>(
            r#"
            SELECT id, active, created_at, updated_at, deleted_at,
                   first_name, last_name, email
              FROM students
             WHERE email = $1 AND deleted_at IS NULL
             FOR UPDATE
            "#,
        )
        .bind(email)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("student"))?;

        let course = sqlx::query_as::<_, Course>(
            r#"
            SELECT id, active, created_at, updated_at, deleted_at,
                   title, price, description, instructor, category
              FROM courses
             WHERE title = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(title)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("course"))?;

        student.courses = courses_of(&mut *tx, student.record.id).await?;
        if student.has_course(course.record.id) {
            return Err(AppError::already_assigned(course.record.id, student.record.id));
        }

        let (student_id, course_id) = (student.record.id, course.record.id);
        sqlx::query(
            r#"
            INSERT INTO student_courses (student_id, course_id)
            VALUES ($1, $2)
            "#,
        )
        .bind(student_id)
        .bind(course_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| match unique_or_store(e, String::new) {
            AppError::ConstraintViolation(_) => AppError::already_assigned(course_id, student_id),
            other => other,
        })?;

        let updated_at = sqlx::query_scalar::<_, OffsetDateTime>(
            r#"
            UPDATE students SET updated_at = now()
             WHERE id = $1
            RETURNING updated_at
            "#,
        )
        .bind(student_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(%student_id, %course_id, "student_courses row written");

        student.record.updated_at = updated_at;
        student.courses.push(course);
        student.courses.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(student)
    }

    async fn close(&self) {
        self.db.close().await;
    }
}
