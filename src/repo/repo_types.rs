use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Identity, timestamps and soft-delete marker shared by every entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Record {
    pub id: Uuid,
    pub active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub deleted_at: Option<OffsetDateTime>,
}

impl Record {
    /// Fresh identity stamped with the current time.
    pub fn new() -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4(),
            active: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Student {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub record: Record,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    #[sqlx(skip)]
    pub courses: Vec<Course>,
}

impl Student {
    pub fn has_course(&self, course_id: Uuid) -> bool {
        self.courses.iter().any(|c| c.record.id == course_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Course {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub record: Record,
    pub title: String,
    pub price: i64,
    pub description: String,
    pub instructor: String,
    pub category: String,
    #[serde(default)]
    #[sqlx(skip)]
    pub students: Vec<Student>,
}

/// Validated fields for a student about to be stored.
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl NewStudent {
    pub fn into_student(self, record: Record) -> Student {
        Student {
            record,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            courses: Vec::new(),
        }
    }
}

/// Validated fields for a course about to be stored.
#[derive(Debug, Clone)]
pub struct NewCourse {
    pub title: String,
    pub price: i64,
    pub description: String,
    pub instructor: String,
    pub category: String,
}

impl NewCourse {
    pub fn into_course(self, record: Record) -> Course {
        Course {
            record,
            title: self.title,
            price: self.price,
            description: self.description,
            instructor: self.instructor,
            category: self.category,
            students: Vec::new(),
        }
    }
}
