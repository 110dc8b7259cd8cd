pub mod user;

pub use user::{StoreError, UserRepository};
