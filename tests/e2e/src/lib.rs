//! End-to-End Test Framework for the ticket streamer
//!
//! Runs the whole chain, configuration file to beanstalkd job, against an
//! in-process fake server.

pub mod fixtures;
pub mod framework;

pub use fixtures::*;
pub use framework::TestPipeline;
