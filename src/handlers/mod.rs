pub mod gate;
pub mod health;
pub mod password_reset;
pub mod profile;
pub mod register;
pub mod session;

pub use gate::require_identity;
pub use health::{health_check, welcome};
pub use password_reset::{request_password_reset, reset_password};
pub use profile::{current_user, profile};
pub use register::register;
pub use session::{login, logout};

use crate::error::AppError;

/// garde のバリデーション結果を AppError に変換
pub(crate) fn validate_request<T>(request: &T) -> Result<(), AppError>
where
    T: garde::Validate,
    T::Context: Default,
{
    request
        .validate()
        .map_err(|report| AppError::Validation(report.to_string()))
}
