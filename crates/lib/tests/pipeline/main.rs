//! End-to-end pipeline tests: stage, build, export, load and invoke the
//! sales demo engine through a fake container runtime, and compile the
//! staged engine for real.

#[cfg(unix)]
mod engine_build_tests;
#[cfg(unix)]
mod pipeline_tests;
