//! Shared integration-test harness

#![allow(dead_code)]

pub mod credentials;
pub mod mock_upstream;
