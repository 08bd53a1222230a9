//! Test suites for the node runtime.

mod support;
