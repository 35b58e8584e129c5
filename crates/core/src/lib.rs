//! hrdesk core types and utilities
//!
//! Wire types for the HR console backend, the access/refresh token record
//! with its lifecycle rules, and the durable key/value storage the session
//! layer persists into.

pub mod error;
pub mod storage;
pub mod token;
pub mod types;
pub mod validation;

pub use error::{CoreError, CoreResult};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageExt};
pub use token::{DEFAULT_REFRESH_LEAD_SECS, Token, TokenState, jwt_expiry, now_timestamp};
pub use types::{
    ActivationRequest, ActivationTokenStatus, ContractType, Gender, LoginRequest, LoginResponse,
    MaritalStatus, MenuItem, MenuResponse, MessageResponse, Page, ProfileUpdateRequest,
    RefreshRequest, RegisterRequest, RegistrationResponse, User, UserDetails, UserStats,
    UserStatus, UserSummary,
};
pub use validation::ValidateConfig;
