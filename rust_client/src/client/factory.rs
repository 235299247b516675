//! Service factory for dependency injection.
//!
//! Creates the [`AnalysisService`] implementation selected by configuration.

use std::str::FromStr;
use std::sync::Arc;

use super::config::ClientConfig;
use super::error::ClientResult;
#[cfg(feature = "http-client")]
use super::http::HttpAnalysisService;
use super::local::LocalAnalysisService;
use super::service::AnalysisService;

/// Service implementation selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceType {
    /// reqwest-backed client for the remote merge service
    Http,
    /// In-memory service
    Local,
}

impl FromStr for ServiceType {
    type Err = String;

    /// Parse service type from string ("http", "local").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "http" | "remote" => Ok(Self::Http),
            "local" | "memory" => Ok(Self::Local),
            _ => Err(format!("Unknown service type: {}", s)),
        }
    }
}

/// Factory for creating service instances.
///
/// # Example
/// ```no_run
/// use data_handler::client::{ClientConfig, ServiceFactory};
///
/// let config = ClientConfig::from_env().unwrap();
/// let service = ServiceFactory::from_config(&config).unwrap();
/// ```
pub struct ServiceFactory;

impl ServiceFactory {
    /// Create a service of the given type.
    pub fn create(
        service_type: ServiceType,
        config: &ClientConfig,
    ) -> ClientResult<Arc<dyn AnalysisService>> {
        match service_type {
            ServiceType::Http => Self::create_http(config),
            ServiceType::Local => Ok(Self::create_local()),
        }
    }

    /// Create the service named by `config.service.type`.
    pub fn from_config(config: &ClientConfig) -> ClientResult<Arc<dyn AnalysisService>> {
        let service_type = config.service_type()?;
        log::info!("Creating {:?} analysis service", service_type);
        Self::create(service_type, config)
    }

    /// Create an empty in-memory service.
    pub fn create_local() -> Arc<dyn AnalysisService> {
        Arc::new(LocalAnalysisService::new())
    }

    #[cfg(feature = "http-client")]
    fn create_http(config: &ClientConfig) -> ClientResult<Arc<dyn AnalysisService>> {
        Ok(Arc::new(HttpAnalysisService::new(config.clone())?))
    }

    #[cfg(not(feature = "http-client"))]
    fn create_http(_config: &ClientConfig) -> ClientResult<Arc<dyn AnalysisService>> {
        Err(super::error::ClientError::configuration(
            "HTTP service requested but the `http-client` feature is disabled",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_type_from_str() {
        assert_eq!("http".parse::<ServiceType>().unwrap(), ServiceType::Http);
        assert_eq!("HTTP".parse::<ServiceType>().unwrap(), ServiceType::Http);
        assert_eq!("local".parse::<ServiceType>().unwrap(), ServiceType::Local);
        assert!("sftp".parse::<ServiceType>().is_err());
    }

    #[tokio::test]
    async fn test_create_local_starts_empty() {
        let service = ServiceFactory::create_local();
        assert!(service.available_dates().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_from_config_local() {
        let mut config = ClientConfig::default();
        config.service.service_type = "local".into();
        let service = ServiceFactory::from_config(&config).unwrap();
        service.clear_data().await.unwrap();
    }
}
