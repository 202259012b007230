//! Database seeding with fake teachers, students, class periods,
//! announcements and a day of attendance records.

use chrono::Utc;
use fake::Fake;
use fake::faker::name::en::*;
use sqlx::PgPool;

use crate::modules::accounts::model::Role;
use crate::modules::accounts::service::AccountService;
use crate::modules::announcements::model::CreateAnnouncementDto;
use crate::modules::announcements::service::AnnouncementService;
use crate::modules::attendance::model::{AttendanceStatus, CreateAttendanceDto};
use crate::modules::attendance::service::AttendanceService;
use crate::modules::class_periods::model::CreateClassPeriodDto;
use crate::modules::class_periods::service::ClassPeriodService;
use crate::modules::students::model::CreateStudentDto;
use crate::modules::students::service::StudentService;

pub struct SeedConfig {
    pub teachers: usize,
    pub students_per_teacher: usize,
    pub announcements_per_teacher: usize,
}

pub async fn seed_database(
    db: &PgPool,
    config: SeedConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🌱 Seeding database...");
    println!("   - Teachers: {}", config.teachers);
    println!("   - Students per teacher: {}", config.students_per_teacher);

    let today = Utc::now().date_naive();
    let departments = ["Science", "Math", "English", "History", "Art"];

    for t in 0..config.teachers {
        let first_name: String = FirstName().fake();
        let last_name: String = LastName().fake();
        let email = seeded_email(&first_name, &last_name, t);

        let teacher = AccountService::insert_account(
            db,
            &email,
            &first_name,
            &last_name,
            Role::Teacher,
            None,
            Some(departments[t % departments.len()]),
        )
        .await
        .map_err(|e| e.error.to_string())?;

        let class_period = ClassPeriodService::create_class_period(
            db,
            CreateClassPeriodDto {
                name: format!("Period {}", t + 1),
                teacher_id: teacher.id,
                room_number: format!("{}", 100 + t),
                capacity: Some(30),
                current_enrollment: Some(config.students_per_teacher as i32),
            },
        )
        .await
        .map_err(|e| e.error.to_string())?;

        for s in 0..config.students_per_teacher {
            let student_first: String = FirstName().fake();
            let student_last: String = LastName().fake();
            let hcpss_email = seeded_email(&student_first, &student_last, t * 1000 + s);

            let student = StudentService::create_student(
                db,
                CreateStudentDto {
                    name: format!("{} {}", student_first, student_last),
                    grade: 9 + (s % 4) as i32,
                    hcpss_email,
                    account_email: None,
                    phone_num: None,
                    theme: None,
                    notifications_enabled: None,
                    teacher_id: teacher.id,
                },
            )
            .await
            .map_err(|e| e.error.to_string())?;

            AttendanceService::create_attendance(
                db,
                CreateAttendanceDto {
                    student_id: student.id,
                    class_period_id: class_period.id,
                    date: today,
                    status: AttendanceStatus::Present,
                    notes: None,
                },
                teacher.id,
            )
            .await
            .map_err(|e| e.error.to_string())?;
        }

        for a in 0..config.announcements_per_teacher {
            AnnouncementService::create_announcement(
                db,
                CreateAnnouncementDto {
                    title: format!("Announcement {} from {} {}", a + 1, first_name, last_name),
                    body: "Seeded announcement body.".to_string(),
                    teacher_id: Some(teacher.id),
                    target_grade: None,
                    is_urgent: Some(a == 0),
                },
                &teacher,
            )
            .await
            .map_err(|e| e.error.to_string())?;
        }
    }

    println!("✅ Seeding complete");
    Ok(())
}

fn seeded_email(first_name: &str, last_name: &str, n: usize) -> String {
    format!(
        "{}.{}.{}@inst.hcpss.org",
        first_name.to_ascii_lowercase(),
        last_name.to_ascii_lowercase(),
        n
    )
}
