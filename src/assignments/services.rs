use tracing::{info, warn};

use super::dto::AssignCourseRequest;
use crate::{
    error::AppError,
    repo::{Repository, Student},
    validate::required,
};

/// Links an existing course to an existing student exactly once.
///
/// Both inputs are checked before the store is touched. The student must have
/// signed up before buying a course, so an unknown email is `NotFound` rather
/// than an implicit signup. A repeated assignment is `Conflict`.
pub async fn assign_course_to_student(
    repo: &dyn Repository,
    req: AssignCourseRequest,
) -> Result<Student, AppError> {
    let email = required(&req.email, "student's email")?;
    let title = required(&req.course_title, "course's title")?;

    match repo.assign_course_to_student(&email, &title).await {
        Ok(student) => {
            info!(student_id = %student.record.id, %email, %title, "course assigned");
            Ok(student)
        }
        Err(e @ (AppError::NotFound(_) | AppError::Conflict(_))) => {
            warn!(error = %e, %email, %title, "course assignment refused");
            Err(e)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::{MemoryRepository, NewCourse, NewStudent};

    async fn seeded() -> (MemoryRepository, Student) {
        let repo = MemoryRepository::new();
        let student = repo
            .create_student(NewStudent {
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                email: "ada@x.io".into(),
            })
            .await
            .unwrap();
        repo.create_course(NewCourse {
            title: "Algorithms".into(),
            price: 20,
            description: "d".into(),
            instructor: "i".into(),
            category: "c".into(),
        })
        .await
        .unwrap();
        (repo, student)
    }

    fn request(email: &str, title: &str) -> AssignCourseRequest {
        AssignCourseRequest {
            email: email.into(),
            course_title: title.into(),
        }
    }

    #[tokio::test]
    async fn assigns_exactly_once() {
        let (repo, student) = seeded().await;

        let updated = assign_course_to_student(&repo, request("ada@x.io", "Algorithms"))
            .await
            .unwrap();
        assert_eq!(updated.record.id, student.record.id);
        assert_eq!(updated.courses.len(), 1);
        assert_eq!(updated.courses[0].title, "Algorithms");

        let err = assign_course_to_student(&repo, request("ada@x.io", "Algorithms"))
            .await
            .unwrap_err();
        match err {
            AppError::Conflict(msg) => {
                assert!(msg.contains(&student.record.id.to_string()));
                assert!(msg.contains(&updated.courses[0].record.id.to_string()));
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_student_is_not_found_whatever_the_course() {
        let (repo, _) = seeded().await;
        for title in ["Algorithms", "Compilers"] {
            let err = assign_course_to_student(&repo, request("ghost@x.io", title))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::NotFound("student")));
        }
    }

    #[tokio::test]
    async fn unknown_course_is_not_found() {
        let (repo, _) = seeded().await;
        let err = assign_course_to_student(&repo, request("ada@x.io", "Compilers"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound("course")));
    }

    #[tokio::test]
    async fn blank_inputs_are_rejected_before_lookup() {
        let repo = MemoryRepository::new();
        for (email, title) in [("", "Algorithms"), ("ada@x.io", " ")] {
            let err = assign_course_to_student(&repo, request(email, title))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
    }
}
