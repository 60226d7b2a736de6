use std::sync::Arc;

use actix_multipart::{Field, Multipart};
use actix_web::http::header::ContentDisposition;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use futures_util::TryStreamExt as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{error, info, warn};
use utoipa::{IntoParams, ToSchema};

use crate::error::ApiError;
use crate::export::{self, FontSource};
use crate::filter::{self, ReportQuery, ReportQueryParams};
use crate::models::*;
use crate::repo::Repo;
use crate::stats::dashboard_stats;
use crate::storage::BlobStore;
use crate::validate::{ReportForm, Submission};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(
                web::resource("/reports")
                    .route(web::get().to(list_reports))
                    .route(web::post().to(create_report)),
            )
            // fixed paths before `/reports/{id}`
            .service(web::resource("/reports/months").route(web::get().to(report_months)))
            .service(web::resource("/reports/form").route(web::get().to(new_report_form)))
            .service(web::resource("/reports/export/pdf").route(web::get().to(export_pdf)))
            .service(web::resource("/reports/export/xlsx").route(web::get().to(export_xlsx)))
            .service(
                web::resource("/reports/{id}")
                    .route(web::get().to(get_report))
                    .route(web::put().to(update_report))
                    .route(web::delete().to(delete_report)),
            )
            .service(web::resource("/reports/{id}/form").route(web::get().to(edit_report_form)))
            .service(web::resource("/dashboard/stats").route(web::get().to(get_dashboard_stats)))
            .service(
                web::resource("/files")
                    .route(web::get().to(list_files))
                    .route(web::post().to(upload_files)),
            )
            .service(web::resource("/files/{id}").route(web::delete().to(delete_file)))
            .service(web::resource("/files/{id}/content").route(web::get().to(get_file_content))),
    );
}

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repo>,
    pub blob_store: Arc<dyn BlobStore>,
    pub fonts: FontSource,
    /// Per-file upload ceiling in bytes.
    pub upload_limit: usize,
}

/// Submits the form and hands an accepted draft to the report store.
async fn commit(data: &AppState, mut form: ReportForm) -> Result<HttpResponse, ApiError> {
    let submission = form.submit().map_err(|errors| ApiError::Validation(errors.clone()))?;
    Ok(match submission {
        Submission::Create(draft) => HttpResponse::Created().json(data.repo.add_report(draft).await?),
        Submission::Update(report) => HttpResponse::Ok().json(data.repo.update_report(report).await?),
    })
}

// ---------------- Reports ---------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/reports",
    params(ReportQueryParams),
    responses(
        (status = 200, description = "Filtered reports in store order", body = [InstitutionReport])
    )
)]
pub async fn list_reports(data: web::Data<AppState>, query: web::Query<ReportQueryParams>) -> Result<HttpResponse, ApiError> {
    let query = ReportQuery::from(query.into_inner());
    let reports = data.repo.list_reports().await?;
    Ok(HttpResponse::Ok().json(query.apply(&reports)))
}

#[utoipa::path(
    post,
    path = "/api/v1/reports",
    request_body = ReportDraft,
    responses(
        (status = 201, description = "Report created and placed first", body = InstitutionReport),
        (status = 422, description = "Validation failed; `fields` maps field to message")
    )
)]
pub async fn create_report(data: web::Data<AppState>, payload: web::Json<ReportDraft>) -> Result<HttpResponse, ApiError> {
    commit(&data, ReportForm::open_new().with_draft(payload.into_inner())).await
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/{id}",
    params(("id" = Id, Path, description = "Report id")),
    responses(
        (status = 200, description = "Report", body = InstitutionReport),
        (status = 404, description = "Report not found")
    )
)]
pub async fn get_report(data: web::Data<AppState>, path: web::Path<Id>) -> Result<HttpResponse, ApiError> {
    let report = data.repo.get_report(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(report))
}

#[utoipa::path(
    put,
    path = "/api/v1/reports/{id}",
    request_body = ReportDraft,
    params(("id" = Id, Path, description = "Report id")),
    responses(
        (status = 200, description = "Report replaced in place", body = InstitutionReport),
        (status = 404, description = "Report not found"),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn update_report(
    data: web::Data<AppState>,
    path: web::Path<Id>,
    payload: web::Json<ReportDraft>,
) -> Result<HttpResponse, ApiError> {
    let existing = data.repo.get_report(path.into_inner()).await?;
    commit(&data, ReportForm::open_edit(&existing).with_draft(payload.into_inner())).await
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeleteQuery {
    /// Must be `true`; anything else is treated as a declined confirmation.
    pub confirm: Option<String>,
}

impl DeleteQuery {
    fn confirmed(&self) -> bool {
        self.confirm.as_deref() == Some("true")
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteOutcome {
    pub deleted: bool,
}

#[utoipa::path(
    delete,
    path = "/api/v1/reports/{id}",
    params(("id" = Id, Path, description = "Report id"), DeleteQuery),
    responses(
        (status = 204, description = "Confirmed; report removed if it existed"),
        (status = 200, description = "Confirmation declined, nothing changed", body = DeleteOutcome)
    )
)]
pub async fn delete_report(
    data: web::Data<AppState>,
    path: web::Path<Id>,
    query: web::Query<DeleteQuery>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    if !query.confirmed() {
        info!(id, "report deletion not confirmed");
        return Ok(HttpResponse::Ok().json(DeleteOutcome { deleted: false }));
    }
    data.repo.remove_report(id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/months",
    responses((status = 200, description = "Distinct report months, newest first", body = [String]))
)]
pub async fn report_months(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let reports = data.repo.list_reports().await?;
    Ok(HttpResponse::Ok().json(filter::month_options(&reports)))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/form",
    responses((status = 200, description = "Default draft for a new report"))
)]
pub async fn new_report_form() -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(ReportForm::open_new()))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/{id}/form",
    params(("id" = Id, Path, description = "Report id")),
    responses(
        (status = 200, description = "Draft seeded from the stored report"),
        (status = 404, description = "Report not found")
    )
)]
pub async fn edit_report_form(data: web::Data<AppState>, path: web::Path<Id>) -> Result<HttpResponse, ApiError> {
    let report = data.repo.get_report(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ReportForm::open_edit(&report)))
}

// ---------------- Exports ---------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/reports/export/pdf",
    params(ReportQueryParams),
    responses(
        (status = 200, description = "PDF table of the filtered reports"),
        (status = 503, description = "PDF fonts unavailable")
    )
)]
pub async fn export_pdf(data: web::Data<AppState>, query: web::Query<ReportQueryParams>) -> Result<HttpResponse, ApiError> {
    let query = ReportQuery::from(query.into_inner());
    let reports = query.apply(&data.repo.list_reports().await?);
    let table = export::document_table(&reports);
    let fonts = data.fonts.clone();
    let bytes = web::block(move || export::render_pdf(&table, &fonts))
        .await
        .map_err(|e| {
            error!("pdf export task failed: {e}");
            ApiError::Internal
        })??;
    info!(rows = reports.len(), size = bytes.len(), "pdf export rendered");
    Ok(HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header(ContentDisposition::attachment(export::PDF_FILE_NAME))
        .body(bytes))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/export/xlsx",
    params(ReportQueryParams),
    responses((status = 200, description = "Workbook of the filtered reports"))
)]
pub async fn export_xlsx(data: web::Data<AppState>, query: web::Query<ReportQueryParams>) -> Result<HttpResponse, ApiError> {
    let query = ReportQuery::from(query.into_inner());
    let rows = export::spreadsheet_rows(&query.apply(&data.repo.list_reports().await?));
    let row_count = rows.len();
    let bytes = web::block(move || export::render_xlsx(&rows))
        .await
        .map_err(|e| {
            error!("xlsx export task failed: {e}");
            ApiError::Internal
        })??;
    info!(rows = row_count, size = bytes.len(), "xlsx export rendered");
    Ok(HttpResponse::Ok()
        .content_type("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")
        .insert_header(ContentDisposition::attachment(export::XLSX_FILE_NAME))
        .body(bytes))
}

// ---------------- Dashboard -------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/stats",
    responses((status = 200, description = "Statistics over the whole store", body = DashboardStats))
)]
pub async fn get_dashboard_stats(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let reports = data.repo.list_reports().await?;
    Ok(HttpResponse::Ok().json(dashboard_stats(&reports)))
}

// ---------------- Files -----------------------------------------------

/// Upload types the dashboard offers in its picker. Not enforced.
const ACCEPTED_MIME_PREFIXES: &[&str] = &["image/", "application/pdf"];

fn is_accepted(mime: &str) -> bool {
    ACCEPTED_MIME_PREFIXES.iter().any(|p| mime.starts_with(p))
}

async fn read_field(field: &mut Field, limit: usize) -> Result<Vec<u8>, ApiError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(|e| {
        error!("multipart stream read error: {e}");
        ApiError::BadRequest("malformed multipart body".into())
    })? {
        if bytes.len() + chunk.len() > limit {
            return Err(ApiError::PayloadTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

#[utoipa::path(
    get,
    path = "/api/v1/files",
    responses((status = 200, description = "Registered files, oldest first", body = [AppFile]))
)]
pub async fn list_files(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(data.repo.list_files().await?))
}

/// Multipart batch upload. Every `file` part is one file; an optional
/// `lastModified` text part (epoch millis) applies to the next `file` part.
#[utoipa::path(
    post,
    path = "/api/v1/files",
    responses(
        (status = 201, description = "Files registered in upload order", body = [AppFile]),
        (status = 400, description = "No file parts"),
        (status = 413, description = "A file exceeds the upload limit")
    )
)]
pub async fn upload_files(data: web::Data<AppState>, mut payload: Multipart) -> Result<HttpResponse, ApiError> {
    let mut pending_last_modified: Option<i64> = None;
    let mut batch: Vec<(NewFile, Vec<u8>)> = Vec::new();

    while let Some(mut field) = payload.try_next().await.map_err(|e| {
        error!("multipart error: {e}");
        ApiError::BadRequest("malformed multipart body".into())
    })? {
        let part = field.content_disposition().get_name().unwrap_or_default().to_string();
        match part.as_str() {
            "lastModified" => {
                let raw = read_field(&mut field, 32).await?;
                pending_last_modified = String::from_utf8_lossy(&raw).trim().parse().ok();
            }
            "file" => {
                let name = field
                    .content_disposition()
                    .get_filename()
                    .map(str::to_string)
                    .unwrap_or_else(|| "berkas".to_string());
                let declared = field.content_type().map(|m| m.essence_str().to_string());
                let bytes = read_field(&mut field, data.upload_limit).await?;
                let mime_type = infer::get(&bytes)
                    .map(|t| t.mime_type().to_string())
                    .or(declared)
                    .unwrap_or_else(|| "application/octet-stream".into());
                if !is_accepted(&mime_type) {
                    warn!(name = %name, mime_type = %mime_type, "upload outside the advised image/pdf types");
                }
                let checksum = format!("{:x}", Sha256::digest(&bytes));
                let last_modified = pending_last_modified.take().unwrap_or_else(|| Utc::now().timestamp_millis());
                let meta = NewFile { name, mime_type, size: bytes.len() as u64, last_modified, checksum };
                batch.push((meta, bytes));
            }
            _ => continue,
        }
    }

    if batch.is_empty() {
        return Err(ApiError::BadRequest("no file parts in upload".into()));
    }

    let (metas, contents): (Vec<NewFile>, Vec<Vec<u8>>) = batch.into_iter().unzip();
    let files = data.repo.add_files(metas).await?;
    for (file, bytes) in files.iter().zip(contents) {
        if let Err(e) = data.blob_store.put(&file.id, &file.mime_type, bytes).await {
            error!(id = %file.id, "blob store put failed: {e}");
            for f in &files {
                data.repo.remove_file(&f.id).await?;
                data.blob_store.release(&f.id).await?;
            }
            return Err(ApiError::Internal);
        }
    }
    Ok(HttpResponse::Created().json(files))
}

#[utoipa::path(
    delete,
    path = "/api/v1/files/{id}",
    params(("id" = String, Path, description = "File id")),
    responses((status = 204, description = "File removed and its bytes released (no-op if unknown)"))
)]
pub async fn delete_file(data: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    if data.repo.remove_file(&id).await?.is_some() {
        data.blob_store.release(&id).await?;
    }
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/v1/files/{id}/content",
    params(("id" = String, Path, description = "File id")),
    responses(
        (status = 200, description = "Stored bytes with their MIME type"),
        (status = 404, description = "File not found")
    )
)]
pub async fn get_file_content(data: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let file = data.repo.get_file(&id).await?;
    let blob = data.blob_store.get(&id).await?;
    Ok(HttpResponse::Ok()
        .content_type(blob.mime)
        .insert_header(ContentDisposition::attachment(file.name))
        .body(blob.bytes.to_vec()))
}
