//! Domain services built on the HTTP adapter

pub mod models;
pub mod users;

pub use models::{Address, Company, Geo, User};
pub use users::{ApiRequestStatus, CreateUserParams, UserState, UsersService, USERS_ENDPOINT};
