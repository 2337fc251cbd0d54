//! Integration-style tests for the publication pipeline, driven through mock
//! collaborators.

pub mod mocks;
