use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::accounts::controller::verify_user,
        crate::modules::accounts::controller::verify_google_token,
        crate::modules::students::controller::create_student,
        crate::modules::students::controller::get_students,
        crate::modules::students::controller::get_student,
        crate::modules::students::controller::get_student_by_email,
        crate::modules::students::controller::update_student,
        crate::modules::students::controller::delete_student,
        crate::modules::class_periods::controller::create_class_period,
        crate::modules::class_periods::controller::get_class_periods,
        crate::modules::class_periods::controller::get_class_period,
        crate::modules::class_periods::controller::update_class_period,
        crate::modules::class_periods::controller::delete_class_period,
        crate::modules::attendance::controller::create_attendance,
        crate::modules::attendance::controller::get_attendance,
        crate::modules::attendance::controller::get_attendance_record,
        crate::modules::attendance::controller::update_attendance,
        crate::modules::announcements::controller::create_announcement,
        crate::modules::announcements::controller::get_announcements,
        crate::modules::announcements::controller::get_announcement,
        crate::modules::announcements::controller::delete_announcement,
    ),
    components(schemas(
        crate::modules::accounts::model::Account,
        crate::modules::accounts::model::Role,
        crate::modules::accounts::model::VerifyRequest,
        crate::modules::accounts::model::VerifyTokenRequest,
        crate::modules::accounts::model::VerifySuccess,
        crate::modules::accounts::model::TokenVerifySuccess,
        crate::modules::accounts::model::VerifyFailure,
        crate::modules::students::model::Student,
        crate::modules::students::model::CreateStudentDto,
        crate::modules::students::model::UpdateStudentDto,
        crate::modules::class_periods::model::ClassPeriod,
        crate::modules::class_periods::model::CreateClassPeriodDto,
        crate::modules::class_periods::model::UpdateClassPeriodDto,
        crate::modules::attendance::model::AttendanceRecord,
        crate::modules::attendance::model::AttendanceStatus,
        crate::modules::attendance::model::CreateAttendanceDto,
        crate::modules::attendance::model::UpdateAttendanceDto,
        crate::modules::announcements::model::Announcement,
        crate::modules::announcements::model::CreateAnnouncementDto,
        crate::utils::errors::FieldViolation,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Accounts", description = "Verification and account lockout"),
        (name = "Students", description = "Student profiles"),
        (name = "Class Periods", description = "Class period management"),
        (name = "Attendance", description = "Attendance records"),
        (name = "Announcements", description = "Teacher announcements")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
