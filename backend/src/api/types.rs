//! REST API types for the uploader page.

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{PipelineError, ResolveError};
use crate::export::{ExportBundle, ExportKind};
use crate::models::FieldMapping;
use crate::transform::pipeline::DatasetInfo;

/// Response sent after an upload has been transformed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Job id used in download URLs
    pub job_id: String,

    /// Always "ready" for a successful upload
    pub status: String,

    /// One entry per generated workbook
    pub workbooks: Vec<WorkbookSummary>,

    pub metadata: ResponseMetadata,
}

/// A generated workbook and where to fetch it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkbookSummary {
    pub kind: ExportKind,
    pub file_name: String,
    pub sheets: Vec<String>,
    pub rows: u32,
    pub download_url: String,
}

/// What was read from the upload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub row_count: usize,
    pub columns: Vec<String>,
    /// Logical field name to the header it was bound to
    pub resolved_fields: Vec<ResolvedField>,
    pub source: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedField {
    pub field: String,
    pub column: String,
}

impl UploadResponse {
    pub fn new(
        job_id: &str,
        tag: &str,
        info: &DatasetInfo,
        mapping: &FieldMapping,
        bundle: &ExportBundle,
    ) -> Self {
        let workbooks = bundle
            .iter()
            .map(|(kind, wb)| WorkbookSummary {
                kind,
                file_name: kind.file_name(tag),
                sheets: wb.sheet_names().into_iter().map(str::to_string).collect(),
                rows: wb.body_rows(),
                download_url: download_url(job_id, kind),
            })
            .collect();

        UploadResponse {
            job_id: job_id.to_string(),
            status: "ready".to_string(),
            workbooks,
            metadata: ResponseMetadata {
                row_count: info.row_count,
                columns: info.headers.clone(),
                resolved_fields: mapping
                    .iter()
                    .map(|(field, header)| ResolvedField {
                        field: field.to_string(),
                        column: header.to_string(),
                    })
                    .collect(),
                source: serde_json::to_value(&info.format).unwrap_or(Value::Null),
            },
        }
    }
}

pub fn download_url(job_id: &str, kind: ExportKind) -> String {
    format!("/api/jobs/{}/{}", job_id, kind.slug())
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "status": "error",
        "error": error,
        "workbooks": [],
    })
}

/// Error body for a pipeline failure; a missing field also names the field
/// and the headers that were tried.
pub fn pipeline_error_response(err: &PipelineError) -> Value {
    let mut body = error_response(&err.to_string());
    if let PipelineError::Resolve(ResolveError::MissingField { field, candidates }) = err {
        body["field"] = json!(field);
        body["candidates"] = json!(candidates);
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::Workbook;
    use crate::models::LogicalField;
    use crate::parser::SourceFormat;
    use crate::transform::resolver::resolve_fields;

    #[test]
    fn test_upload_response_shape() {
        let headers: Vec<String> = [
            "UserID", "Nickname", "Phone", "Percentage", "Locale", "Requested", "Coin_Reward",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let mapping = resolve_fields(&headers).unwrap();
        let info = DatasetInfo {
            format: SourceFormat::Workbook { sheet: "Sheet1".into() },
            headers,
            row_count: 0,
        };
        let mut sms = Workbook::new();
        sms.add_sheet("ka");
        let bundle = ExportBundle {
            percentages: Workbook::new(),
            sms,
            deposits: Workbook::new(),
        };

        let response = UploadResponse::new("job-1", "10.18-090000", &info, &mapping, &bundle);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["jobId"], "job-1");
        assert_eq!(json["workbooks"][1]["kind"], "sms");
        assert_eq!(json["workbooks"][1]["fileName"], "SMS-10.18-090000.xlsx");
        assert_eq!(json["workbooks"][1]["sheets"][0], "ka");
        assert_eq!(json["workbooks"][1]["downloadUrl"], "/api/jobs/job-1/sms");
        assert_eq!(json["metadata"]["resolvedFields"][3]["field"], "percent");
        assert_eq!(json["metadata"]["resolvedFields"][3]["column"], "Percentage");
        assert_eq!(json["metadata"]["source"]["type"], "workbook");
    }

    #[test]
    fn test_missing_field_error_body() {
        let err = PipelineError::from(ResolveError::MissingField {
            field: LogicalField::Locale,
            candidates: vec!["localecode".into(), "locale".into()],
        });
        let body = pipeline_error_response(&err);
        assert_eq!(body["status"], "error");
        assert_eq!(body["field"], "locale");
        assert_eq!(body["candidates"][1], "locale");
    }
}
