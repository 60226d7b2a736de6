use crate::models::{AppFile, DashboardStats, InstitutionReport, InstitutionType, ReportDraft, TypeCount};
use crate::validate::FormField;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::list_reports,
        crate::routes::create_report,
        crate::routes::get_report,
        crate::routes::update_report,
        crate::routes::delete_report,
        crate::routes::report_months,
        crate::routes::new_report_form,
        crate::routes::edit_report_form,
        crate::routes::export_pdf,
        crate::routes::export_xlsx,
        crate::routes::get_dashboard_stats,
        crate::routes::list_files,
        crate::routes::upload_files,
        crate::routes::delete_file,
        crate::routes::get_file_content,
    ),
    components(schemas(
        InstitutionReport, ReportDraft, InstitutionType, AppFile,
        DashboardStats, TypeCount, FormField, crate::routes::DeleteOutcome
    )),
    tags(
        (name = "reports", description = "Institution report store, filters and exports"),
        (name = "dashboard", description = "Aggregate statistics"),
        (name = "files", description = "Uploaded file registry"),
    )
)]
pub struct ApiDoc;
