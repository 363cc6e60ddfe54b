use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument};

use emr_domain::entities::{
    DocumentSummary, GeneratedDocument, MedicalReportRequest, OpinionRequest, PrescriptionDocumentRequest,
    TestRequestDocumentRequest,
};
use emr_domain::errors::ServiceError;
use emr_domain::services::DocumentServiceTrait;

use super::error::{service_error, ErrorResponse};
use super::extract::JsonBody;

/// Service type for dependency injection
pub type DocumentService = Arc<dyn DocumentServiceTrait + Send + Sync>;

fn created(result: Result<GeneratedDocument, ServiceError>) -> Result<(StatusCode, Json<GeneratedDocument>), ErrorResponse> {
    let document = result.map_err(service_error)?;
    info!("Generated document {} ({} bytes)", document.filename, document.size);
    Ok((StatusCode::CREATED, Json(document)))
}

/// Opinion and referral letter
#[utoipa::path(
    post,
    path = "/api/documents/opinion",
    request_body = OpinionRequest,
    responses(
        (status = 201, description = "Document generated", body = GeneratedDocument),
        (status = 400, description = "No patient given", body = ErrorResponse),
        (status = 404, description = "Patient not found", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
#[instrument(skip(service, request))]
pub async fn generate_opinion(
    State(service): State<DocumentService>,
    JsonBody(request): JsonBody<OpinionRequest>,
) -> Result<(StatusCode, Json<GeneratedDocument>), ErrorResponse> {
    created(service.generate_opinion(request).await)
}

/// SOAP medical report
#[utoipa::path(
    post,
    path = "/api/documents/medical-report",
    request_body = MedicalReportRequest,
    responses(
        (status = 201, description = "Document generated", body = GeneratedDocument),
        (status = 400, description = "No patient given", body = ErrorResponse),
        (status = 404, description = "Patient not found", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
#[instrument(skip(service, request))]
pub async fn generate_medical_report(
    State(service): State<DocumentService>,
    JsonBody(request): JsonBody<MedicalReportRequest>,
) -> Result<(StatusCode, Json<GeneratedDocument>), ErrorResponse> {
    created(service.generate_medical_report(request).await)
}

#[utoipa::path(
    post,
    path = "/api/documents/prescription",
    request_body = PrescriptionDocumentRequest,
    responses(
        (status = 201, description = "Document generated", body = GeneratedDocument),
        (status = 400, description = "No patient given", body = ErrorResponse),
        (status = 404, description = "Patient not found", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
#[instrument(skip(service, request))]
pub async fn generate_prescription(
    State(service): State<DocumentService>,
    JsonBody(request): JsonBody<PrescriptionDocumentRequest>,
) -> Result<(StatusCode, Json<GeneratedDocument>), ErrorResponse> {
    created(service.generate_prescription(request).await)
}

#[utoipa::path(
    post,
    path = "/api/documents/test-request",
    request_body = TestRequestDocumentRequest,
    responses(
        (status = 201, description = "Document generated", body = GeneratedDocument),
        (status = 400, description = "No patient given", body = ErrorResponse),
        (status = 404, description = "Patient not found", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
#[instrument(skip(service, request))]
pub async fn generate_test_request(
    State(service): State<DocumentService>,
    JsonBody(request): JsonBody<TestRequestDocumentRequest>,
) -> Result<(StatusCode, Json<GeneratedDocument>), ErrorResponse> {
    created(service.generate_test_request(request).await)
}

/// Metadata of every stored document, newest first
#[utoipa::path(
    get,
    path = "/api/documents",
    responses((status = 200, description = "Stored documents", body = [DocumentSummary])),
    security(("bearer" = [])),
    tag = "documents"
)]
#[instrument(skip(service))]
pub async fn list_documents(State(service): State<DocumentService>) -> Result<Json<Vec<DocumentSummary>>, ErrorResponse> {
    let documents = service.list_documents().await.map_err(service_error)?;
    Ok(Json(documents))
}

#[utoipa::path(
    get,
    path = "/api/documents/{filename}",
    params(("filename" = String, Path, description = "Document file name")),
    responses(
        (status = 200, description = "Document with content", body = GeneratedDocument),
        (status = 404, description = "Document not found", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
#[instrument(skip(service))]
pub async fn get_document(
    State(service): State<DocumentService>,
    Path(filename): Path<String>,
) -> Result<Json<GeneratedDocument>, ErrorResponse> {
    let document = service.get_document(&filename).await.map_err(service_error)?;
    Ok(Json(document))
}

#[utoipa::path(
    delete,
    path = "/api/documents/{filename}",
    params(("filename" = String, Path, description = "Document file name")),
    responses(
        (status = 204, description = "Document deleted"),
        (status = 404, description = "Document not found", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
#[instrument(skip(service))]
pub async fn delete_document(
    State(service): State<DocumentService>,
    Path(filename): Path<String>,
) -> Result<StatusCode, ErrorResponse> {
    service.delete_document(&filename).await.map_err(service_error)?;
    info!("Deleted document {}", filename);
    Ok(StatusCode::NO_CONTENT)
}
