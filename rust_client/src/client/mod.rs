//! Access to the remote merge/analysis service.
//!
//! The rest of the crate only talks to the [`AnalysisService`] trait, so the
//! backing implementation can be swapped:
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │  services (upload manager, analysis session)     │
//! └───────────────────┬──────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────┐
//! │  AnalysisService trait (service.rs)              │
//! └───────────────────┬──────────────────────────────┘
//!                     │
//!      ┌──────────────┴──────────────┐
//!      │ HttpAnalysisService         │ LocalAnalysisService
//!      │ (reqwest, /api/py)          │ (in-memory)
//!      └─────────────────────────────┘
//! ```
//!
//! - `config`: TOML/env configuration
//! - `factory`: picks the implementation from configuration
//! - `error`: [`ClientError`] with structured context

pub mod config;
pub mod error;
pub mod factory;
#[cfg(feature = "http-client")]
pub mod http;
pub mod local;
pub mod service;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult, ErrorContext};
pub use factory::{ServiceFactory, ServiceType};
#[cfg(feature = "http-client")]
pub use http::HttpAnalysisService;
pub use local::LocalAnalysisService;
pub use service::AnalysisService;
