//! Credential handling: password hashing, access tokens and the request
//! gate that turns a bearer token into a stored user.

pub mod gate;
pub mod password;
pub mod token;

pub use gate::{authenticate, CurrentUser};
pub use token::{InvalidToken, IssueError, TokenService};
