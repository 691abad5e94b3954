//! `warden-api`: HTTP surface for the Warden session authority.

pub mod app;
pub mod authz;
pub mod config;
pub mod context;
pub mod middleware;
pub mod validator;

pub use app::build_app;
pub use context::CurrentIdentity;
pub use middleware::{Gate, GateError};
pub use validator::{LocalValidator, RemoteValidator, TokenValidator, ValidatorError};
