use std::collections::BTreeSet;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{Course, NewCourse, NewStudent, Record, Repository, Student};
use crate::error::AppError;

#[derive(Default)]
struct Tables {
    students: Vec<Student>,
    courses: Vec<Course>,
    /// (student_id, course_id)
    links: BTreeSet<(Uuid, Uuid)>,
}

impl Tables {
    fn student_index(&self, email: &str) -> Option<usize> {
        self.students
            .iter()
            .position(|s| s.email == email && !s.record.is_deleted())
    }

    fn course_by_title(&self, title: &str) -> Option<&Course> {
        self.courses
            .iter()
            .find(|c| c.title == title && !c.record.is_deleted())
    }

    fn courses_of(&self, student_id: Uuid) -> Vec<Course> {
        let mut courses: Vec<Course> = self
            .courses
            .iter()
            .filter(|c| !c.record.is_deleted() && self.links.contains(&(student_id, c.record.id)))
            .cloned()
            .collect();
        courses.sort_by(|a, b| a.title.cmp(&b.title));
        courses
    }

    fn students_of(&self, course_id: Uuid) -> Vec<Student> {
        let mut students: Vec<Student> = self
            .students
            .iter()
            .filter(|s| !s.record.is_deleted() && self.links.contains(&(s.record.id, course_id)))
            .cloned()
            .collect();
        students.sort_by(|a, b| a.email.cmp(&b.email));
        students
    }
}

/// Process-local store. Every operation runs under one lock, so the
/// assignment sequence is atomic.
#[derive(Default)]
pub struct MemoryRepository {
    tables: Mutex<Tables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the student deleted without removing the row.
    #[cfg(test)]
    pub async fn soft_delete_student(&self, email: &str) -> bool {
        let mut tables = self.tables.lock().await;
        match tables.student_index(email) {
            Some(i) => {
                tables.students[i].record.deleted_at = Some(OffsetDateTime::now_utc());
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn create_student(&self, new: NewStudent) -> Result<Student, AppError> {
        let mut tables = self.tables.lock().await;
        // The unique index covers soft-deleted rows too.
        if tables.students.iter().any(|s| s.email == new.email) {
            return Err(AppError::ConstraintViolation(format!(
                "email {} is already registered",
                new.email
            )));
        }
        let student = new.into_student(Record::new());
        tables.students.push(student.clone());
        Ok(student)
    }

    async fn create_course(&self, new: NewCourse) -> Result<Course, AppError> {
        let mut tables = self.tables.lock().await;
        if tables.courses.iter().any(|c| c.title == new.title) {
            return Err(AppError::ConstraintViolation(format!(
                "course {} already exists",
                new.title
            )));
        }
        let course = new.into_course(Record::new());
        tables.courses.push(course.clone());
        Ok(course)
    }

    async fn get_student(&self, email: &str) -> Result<Option<Student>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.student_index(email).map(|i| {
            let mut student = tables.students[i].clone();
            student.courses = tables.courses_of(student.record.id);
            student
        }))
    }

    async fn get_course(&self, title: &str) -> Result<Option<Course>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.course_by_title(title).map(|c| {
            let mut course = c.clone();
            course.students = tables.students_of(course.record.id);
            course
        }))
    }

    async fn assign_course_to_student(
        &self,
        email: &str,
        title: &str,
    ) -> Result<Student, AppError> {
        let mut tables = self.tables.lock().await;

        let index = tables.student_index(email).ok_or(AppError::NotFound("student"))?;
        let course_id = tables
            .course_by_title(title)
            .map(|c| c.record.id)
            .ok_or(AppError::NotFound("course"))?;

        let mut student = tables.students[index].clone();
        student.courses = tables.courses_of(student.record.id);
        if student.has_course(course_id) {
            return Err(AppError::already_assigned(course_id, student.record.id));
        }

        tables.links.insert((student.record.id, course_id));
        let now = OffsetDateTime::now_utc();
        tables.students[index].record.updated_at = now;

        student.record.updated_at = now;
        student.courses = tables.courses_of(student.record.id);
        Ok(student)
    }
}
