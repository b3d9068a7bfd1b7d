//! GitHub REST implementations of the waymark collaborator traits.
//!
//! `GithubCommentClient` is the comment store (list, create, update with
//! bounded retries) and `ActionsEventResolver` resolves the issue or pull
//! request a workflow run is attached to.

pub mod actions_event;
pub mod github_comment_client;
mod transport;

pub use actions_event::ActionsEventResolver;
pub use github_comment_client::{GithubCommentClient, DEFAULT_API_BASE};
