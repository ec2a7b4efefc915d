//! Authorization Operations

pub mod issue_token;

pub use issue_token::{
    IssueTokenCommand,
    IssueTokenUseCase,
    IssueTokenResult,
};
