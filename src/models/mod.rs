pub mod user;

pub use user::{LookupField, User, UserUpdate};
