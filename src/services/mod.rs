pub mod access_policy;
pub use access_policy::{AccessDecision, DenialReason};

pub mod credentials;

pub mod file_service;
pub use file_service::{FileError, FileService, UploadRequest};

pub mod file_service_impl;
pub use file_service_impl::SeaOrmFileService;

pub mod user_service;
pub use user_service::{UserError, UserService};

pub mod user_service_impl;
pub use user_service_impl::SeaOrmUserService;
