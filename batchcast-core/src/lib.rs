pub mod auth;
pub mod checkpoint;
pub mod client;
pub mod config;
pub mod container;
pub mod error;
pub mod ingest;
pub mod source;
pub mod validate;

pub use auth::{AuthError, AuthResult, BearerToken, TokenCache};
pub use checkpoint::{CheckpointError, CheckpointResult, CheckpointStore};
pub use client::{
    ApiError, ApiResult, IngestRequest, IngestSource, MediaObject, PlatformClient, Receipt,
    VideoMetadata, VideoPlatform,
};
pub use config::{
    load_config, BatchcastConfig, Credentials, IngestMode, IngestSection, PathsSection,
    PlatformSection,
};
pub use container::{registration_request, ContainerError, ContainerKind, RemoteRegistration};
pub use error::{ConfigError, Result};
pub use ingest::{IngestError, IngestResult, Ingestor, RowOutcome, RunSummary};
pub use source::{CsvRowSource, SourceError, SourceResult, VideoRow};
pub use validate::{normalize_tags, validate_video_url, ValidationError};
