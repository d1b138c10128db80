//! End-to-end tests: real HTTP transport against a local mock server.

mod integration;
