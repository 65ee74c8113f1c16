//! Integration tests for the reportbox CLI against a fake container runtime.

mod common;

#[cfg(unix)]
mod invoke_tests;
#[cfg(unix)]
mod load_tests;
#[cfg(unix)]
mod package_tests;
