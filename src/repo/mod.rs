use async_trait::async_trait;

use crate::error::AppError;

pub mod memory;
pub mod postgres;
pub mod repo_types;

pub use memory::MemoryRepository;
pub use postgres::PgRepository;
pub use repo_types::{Course, NewCourse, NewStudent, Record, Student};

/// Read/write contract the use cases depend on.
///
/// Lookups skip soft-deleted rows. A missing entity is `Ok(None)`, never an error.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Stores a student under a fresh identity. A taken email is a `ConstraintViolation`.
    async fn create_student(&self, student: NewStudent) -> Result<Student, AppError>;

    /// Stores a course under a fresh identity. A taken title is a `ConstraintViolation`.
    async fn create_course(&self, course: NewCourse) -> Result<Course, AppError>;

    /// Student by exact email, with its courses.
    async fn get_student(&self, email: &str) -> Result<Option<Student>, AppError>;

    /// Course by exact title, with its students.
    async fn get_course(&self, title: &str) -> Result<Option<Course>, AppError>;

    /// Links the course to the student as one atomic unit: resolve the student,
    /// resolve the course, reject an existing link with `Conflict`, write the link.
    /// Returns the student including the new course.
    async fn assign_course_to_student(&self, email: &str, title: &str)
        -> Result<Student, AppError>;

    /// Releases the underlying store handle.
    async fn close(&self) {}
}
