#![forbid(unsafe_code)]

pub mod app_services;
pub mod autosave;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod session;

pub use careplan_core::Clock;

pub use app_services::AppServices;
pub use autosave::{AutosaveScheduler, SaveStatus, SaveStatusTracker};
pub use config::{ApiConfig, AutosaveConfig};
pub use error::{AppServicesError, ConfigError, FormSessionError, GatewayError};
pub use gateway::{DocumentExporter, RepositoryGateway, ResponseGateway};
pub use http::HttpGateway;
pub use session::FormSession;
