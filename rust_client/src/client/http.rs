//! reqwest implementation of [`AnalysisService`].

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

use super::config::ClientConfig;
use super::error::{ClientError, ClientResult, ErrorContext};
use super::service::AnalysisService;
use crate::api::{AvailableDatesResponse, DateDataResponse, MergeResponse};
use crate::models::upload::CSV_MIME;
use crate::models::FileRef;

/// Multipart field carrying each uploaded file.
pub const FILES_FIELD: &str = "files";

pub const MERGE_CSVS: &str = "/merge-csvs";
pub const AVAILABLE_DATES: &str = "/available-dates";
pub const DATA_BY_DATE: &str = "/data-by-date";
pub const CLEAR_DATA: &str = "/clear-data";

/// HTTP client for the merge service.
#[derive(Clone)]
pub struct HttpAnalysisService {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpAnalysisService {
    /// Build a client honouring the configured timeout.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            ClientError::configuration(format!("Failed to build HTTP client: {}", e))
        })?;
        Ok(Self { client, config })
    }

    fn url(&self, endpoint: &str) -> String {
        self.config.endpoint_url(endpoint)
    }

    async fn build_form(files: &[FileRef], context: &ErrorContext) -> ClientResult<Form> {
        let mut form = Form::new();
        for file in files {
            let bytes = file.read_bytes().await.map_err(|e| {
                ClientError::io(
                    format!("{}: {}", file.name, e),
                    context.clone().with_details(file.name.clone()),
                )
            })?;
            let mime = file.declared_type.as_deref().unwrap_or(CSV_MIME);
            let part = Part::bytes(bytes)
                .file_name(file.name.clone())
                .mime_str(mime)
                .map_err(|e| ClientError::from_reqwest(e, context.clone()))?;
            form = form.part(FILES_FIELD, part);
        }
        Ok(form)
    }

    /// Fail on anything but `expected`, keeping the status line for the user.
    fn check_status(
        response: &Response,
        expected: impl Fn(StatusCode) -> bool,
        context: &ErrorContext,
    ) -> ClientResult<()> {
        let status = response.status();
        if expected(status) {
            return Ok(());
        }
        Err(ClientError::status(
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
            context.clone(),
        ))
    }

    async fn decode<T: DeserializeOwned>(
        response: Response,
        context: &ErrorContext,
    ) -> ClientResult<T> {
        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::from_reqwest(e, context.clone()))?;
        let de = &mut serde_json::Deserializer::from_slice(&body);
        serde_path_to_error::deserialize(de).map_err(|e| {
            ClientError::decode(
                format!("{} at `{}`", e.inner(), e.path()),
                context.clone(),
            )
        })
    }
}

#[async_trait]
impl AnalysisService for HttpAnalysisService {
    async fn merge_csvs(&self, files: &[FileRef]) -> ClientResult<MergeResponse> {
        let context = ErrorContext::new("merge_csvs")
            .with_endpoint(MERGE_CSVS)
            .with_details(format!("{} files", files.len()));
        let form = Self::build_form(files, &context).await?;

        log::debug!("POST {} with {} files", self.url(MERGE_CSVS), files.len());
        let response = self
            .client
            .post(self.url(MERGE_CSVS))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(e, context.clone()))?;

        // Only 200 carries the merge result
        Self::check_status(&response, |s| s == StatusCode::OK, &context)?;
        Self::decode(response, &context).await
    }

    async fn available_dates(&self) -> ClientResult<Vec<String>> {
        let context = ErrorContext::new("available_dates").with_endpoint(AVAILABLE_DATES);
        let response = self
            .client
            .get(self.url(AVAILABLE_DATES))
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(e, context.clone()))?;

        Self::check_status(&response, |s| s.is_success(), &context)?;
        let body: AvailableDatesResponse = Self::decode(response, &context).await?;
        Ok(body.available_dates)
    }

    async fn data_by_date(&self, date: &str) -> ClientResult<DateDataResponse> {
        let context = ErrorContext::new("data_by_date")
            .with_endpoint(DATA_BY_DATE)
            .with_details(format!("date={}", date));
        let response = self
            .client
            .get(self.url(DATA_BY_DATE))
            .query(&[("date", date)])
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(e, context.clone()))?;

        Self::check_status(&response, |s| s.is_success(), &context)?;
        Self::decode(response, &context).await
    }

    async fn clear_data(&self) -> ClientResult<()> {
        let context = ErrorContext::new("clear_data").with_endpoint(CLEAR_DATA);
        let response = self
            .client
            .delete(self.url(CLEAR_DATA))
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(e, context.clone()))?;

        Self::check_status(&response, |s| s.is_success(), &context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_use_prefix() {
        let service = HttpAnalysisService::new(ClientConfig::default()).unwrap();
        assert_eq!(
            service.url(MERGE_CSVS),
            "http://127.0.0.1:8000/api/py/merge-csvs"
        );
        assert_eq!(
            service.url(CLEAR_DATA),
            "http://127.0.0.1:8000/api/py/clear-data"
        );
    }

    #[tokio::test]
    async fn test_build_form_reports_unreadable_file() {
        let missing = FileRef::from_path("/no/such/dir/day.csv");
        let err = HttpAnalysisService::build_form(&[missing], &ErrorContext::new("merge_csvs"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Io { .. }));
        assert!(err.user_message().contains("day.csv"));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_network_error() {
        let mut config = ClientConfig::default();
        // Port 9 (discard) is closed on test machines
        config.service.base_url = "http://127.0.0.1:9".into();
        let service = HttpAnalysisService::new(config).unwrap();
        let err = service.available_dates().await.unwrap_err();
        assert!(err.is_retryable());
    }
}
