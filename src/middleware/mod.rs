pub mod auth;

pub use auth::{authenticate_jwt, Admin, CurrentUser, LoggedIn};
