//! Account Operations

pub mod provision;

pub use provision::{
    ProvisionAccountCommand,
    ProvisionAccountUseCase,
    ProvisionAccountResult,
};
