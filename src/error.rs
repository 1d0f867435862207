use derive_more::Display;
use salvo::{prelude::StatusError, writer::Json, Piece, Response};

use self::http::ErrorResponse;

pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Display)]
pub struct UnknownError(BoxedError);

impl std::error::Error for UnknownError {}

impl UnknownError {
    pub fn new(err: BoxedError) -> Self {
        Self(err)
    }
}

impl From<BoxedError> for UnknownError {
    fn from(err: BoxedError) -> Self {
        Self::new(err)
    }
}

impl From<sqlx::error::Error> for UnknownError {
    fn from(err: sqlx::error::Error) -> Self {
        Self::new(err.into())
    }
}

impl From<reqwest::Error> for UnknownError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err.into())
    }
}

impl Piece for UnknownError {
    fn render(self, res: &mut Response) {
        let status = StatusError::internal_server_error();
        res.render(Json(ErrorResponse::from_status_error(&status, &self)));
        res.set_status_code(status.code);
    }
}

pub mod app {
    use derive_more::Display;
    use salvo::{prelude::StatusError, writer::Json, Piece};

    use super::{
        http::ErrorResponse, persistence::PersistenceError, resource::NotFoundError,
        upload::UploadError,
    };

    #[derive(Debug, Display)]
    pub enum ApplicationError {
        Upload(UploadError),
        NotFound(NotFoundError),
        Persistence(PersistenceError),
    }

    impl std::error::Error for ApplicationError {}

    impl From<UploadError> for ApplicationError {
        fn from(err: UploadError) -> Self {
            Self::Upload(err)
        }
    }

    impl From<NotFoundError> for ApplicationError {
        fn from(err: NotFoundError) -> Self {
            Self::NotFound(err)
        }
    }

    impl From<PersistenceError> for ApplicationError {
        fn from(err: PersistenceError) -> Self {
            Self::Persistence(err)
        }
    }

    impl ApplicationError {
        pub fn status(&self) -> StatusError {
            match self {
                ApplicationError::Upload(UploadError::TooLarge { .. }) => {
                    StatusError::payload_too_large()
                }
                ApplicationError::Upload(UploadError::Unreadable(_)) => {
                    StatusError::internal_server_error()
                }
                ApplicationError::Upload(_) => StatusError::bad_request(),
                ApplicationError::NotFound(_) => StatusError::not_found(),
                ApplicationError::Persistence(_) => StatusError::service_unavailable(),
            }
        }
    }

    impl Piece for ApplicationError {
        fn render(self, res: &mut salvo::Response) {
            let status = self.status();
            match &self {
                ApplicationError::Persistence(err) => {
                    tracing::error!("persistence failure: {err}");
                }
                ApplicationError::Upload(UploadError::Unreadable(err)) => {
                    tracing::error!("failed to read uploaded image: {err}");
                }
                _ => tracing::debug!("request rejected: {self}"),
            }
            res.render(Json(ErrorResponse::from_status_error(&status, &self)));
            res.set_status_code(status.code);
        }
    }
}

pub mod service {
    use derive_more::Display;

    use crate::error::UnknownError;

    /// Failure of an outbound call to a remote service.
    #[derive(Debug, Display)]
    pub enum DispatchError {
        #[display(fmt = "Dispatched operation timed out in {_0:?}")]
        Timeout(Option<std::time::Duration>),
        #[display(fmt = "Remote service responded with status {_0}: {_1}")]
        Status(u16, String),
        #[display(fmt = "Invalid reply from remote service: {_0}")]
        InvalidReply(String),
        #[display(fmt = "IO error dispatching {_0}")]
        IO(std::io::Error),
        #[display(fmt = "Unknown dispatch error {_0}")]
        Unknown(UnknownError),
    }

    impl std::error::Error for DispatchError {}

    impl From<reqwest::Error> for DispatchError {
        fn from(err: reqwest::Error) -> Self {
            if err.is_timeout() {
                return Self::Timeout(None);
            }
            if err.is_connect() {
                return Self::IO(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    err.to_string(),
                ));
            }
            if err.is_decode() {
                return Self::InvalidReply(err.to_string());
            }
            if let Some(status) = err.status() {
                return Self::Status(status.as_u16(), err.to_string());
            }
            Self::Unknown(err.into())
        }
    }
}

pub mod persistence {
    use std::io;

    use derive_more::Display;

    use super::{service::DispatchError, UnknownError};

    pub type SqlState = String;

    #[derive(Debug, Display)]
    pub enum PersistenceError {
        #[display(fmt = "database persistence error: SQLSTATE {_0:?}")]
        Database(Option<SqlState>),
        #[display(fmt = "persistence layer connection error: {_0}")]
        Connection(DispatchError),
        #[display(fmt = "PersistenceError data not found")]
        NotFound,
        #[display(fmt = "PersistenceError decoding data")]
        DecodeData,
        #[display(fmt = "PersistenceError data migration")]
        DataMigration,
        #[display(fmt = "unknown persistence error: {_0}")]
        Unknown(UnknownError),
    }

    impl std::error::Error for PersistenceError {}

    type SqlxError = sqlx::error::Error;

    impl From<SqlxError> for PersistenceError {
        fn from(err: SqlxError) -> Self {
            match err {
                SqlxError::Configuration(_) => {
                    Self::Connection(DispatchError::IO(io::ErrorKind::InvalidInput.into()))
                }
                SqlxError::Database(db) => Self::Database(db.code().map(|code| code.into())),
                SqlxError::Io(io) => Self::Connection(DispatchError::IO(io)),
                SqlxError::Tls(_) => {
                    Self::Connection(DispatchError::IO(io::ErrorKind::ConnectionRefused.into()))
                }
                SqlxError::Protocol(msg) => Self::Connection(DispatchError::IO(io::Error::new(
                    io::ErrorKind::InvalidData,
                    msg,
                ))),
                SqlxError::RowNotFound => Self::NotFound,
                SqlxError::TypeNotFound { .. } => Self::DecodeData,
                SqlxError::ColumnIndexOutOfBounds { .. } => Self::DecodeData,
                SqlxError::ColumnNotFound(_) => Self::DecodeData,
                SqlxError::ColumnDecode { .. } => Self::DecodeData,
                SqlxError::Decode(_) => Self::DecodeData,
                SqlxError::PoolTimedOut => Self::Connection(DispatchError::Timeout(None)),
                SqlxError::PoolClosed => {
                    Self::Connection(DispatchError::IO(io::ErrorKind::NotConnected.into()))
                }
                SqlxError::Migrate(_) => Self::DataMigration,
                _ => PersistenceError::Unknown(err.into()),
            }
        }
    }

    impl From<serde_json::Error> for PersistenceError {
        fn from(_: serde_json::Error) -> Self {
            Self::DecodeData
        }
    }
}

pub mod upload {
    /// Reasons an uploaded file is rejected before analysis.
    #[derive(Debug)]
    pub enum UploadError {
        NoFile,
        EmptyFileName,
        InvalidType(String),
        TooLarge { size: u64, limit: u64 },
        Unreadable(std::io::Error),
    }

    impl std::fmt::Display for UploadError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                UploadError::NoFile | UploadError::EmptyFileName => f.write_str("No file selected"),
                UploadError::InvalidType(_) => f.write_str(
                    "Invalid file type. Please upload JPG, PNG, GIF, BMP, or WebP files.",
                ),
                UploadError::TooLarge { limit, .. } => {
                    write!(f, "File too large. Maximum size is {}.", ByteSize(*limit))
                }
                UploadError::Unreadable(_) => f.write_str("Failed to process image"),
            }
        }
    }

    impl std::error::Error for UploadError {}

    /// Byte count in the largest whole unit: `16MB`, `512KB` or `1000 bytes`.
    struct ByteSize(u64);

    impl std::fmt::Display for ByteSize {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            const KB: u64 = 1024;
            const MB: u64 = 1024 * KB;
            match self.0 {
                0 => f.write_str("0 bytes"),
                n if n % MB == 0 => write!(f, "{}MB", n / MB),
                n if n % KB == 0 => write!(f, "{}KB", n / KB),
                n => write!(f, "{n} bytes"),
            }
        }
    }
}

pub mod resource {
    use uuid::Uuid;

    use crate::base::ResourceID;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct NotFoundError {
        /// Name of the resource
        pub resource_type: &'static str,
        /// Requested resource id
        pub resource_id: Uuid,
    }

    impl NotFoundError {
        pub fn from_resource<R: ResourceID>(resource_id: Uuid) -> Self {
            Self {
                resource_type: R::resource_id(),
                resource_id,
            }
        }
    }

    impl std::fmt::Display for NotFoundError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{} not found", self.resource_type)
        }
    }

    impl std::error::Error for NotFoundError {}
}

pub mod http {
    use salvo::prelude::StatusError;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ErrorResponse {
        pub success: bool,
        pub title: String,
        pub error: String,
    }

    impl ErrorResponse {
        pub fn from_status_error(status: &StatusError, err: &impl std::fmt::Display) -> Self {
            Self {
                success: false,
                title: status.name.clone(),
                error: err.to_string(),
            }
        }
    }
}
