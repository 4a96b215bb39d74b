pub mod analytics;
pub mod api;
pub mod catalog;
pub mod jwt;
pub mod login;
pub mod server_config;
pub mod session;

pub use self::analytics::{
    ChartDataset, ChartSeries, MAX_STREAM_COUNT, StreamBatch, StreamFilter, StreamRecord, StreamRecordInput,
};
pub use self::api::{ErrorResponse, SuccessResponse};
pub use self::catalog::{Artist, ArtistInput, Release, ReleaseInput, ReleaseType, ValidRelease, ValidationError};
pub use self::jwt::SessionClaims;
pub use self::login::{LoginData, LoginError, LoginResponse};
pub use self::server_config::{AppConfig, AuthConfig, ConfigError, GateConfig, PathsConfig, ServerConfig};
pub use self::session::{AdminVerification, AuthStatus};
