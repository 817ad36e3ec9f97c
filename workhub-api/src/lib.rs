//! workhub-api: service layer for the workhub collaboration backend
//!
//! Orchestrates the repositories in `workhub-core` into the user and
//! workspace flows, issues authentication tokens, and shapes failures into
//! the domain errors an outer HTTP layer consumes.

pub mod auth;
pub mod error;
pub mod services;

pub use auth::{Claims, TokenIssuer};
pub use error::{ApiError, ApiResult};
pub use services::{CreateWorkspace, SignedInUser, UserService, WorkspaceService};
