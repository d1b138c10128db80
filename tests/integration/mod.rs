//! Integration tests with mock HTTP server

pub mod engine;
pub mod mock_server;
pub mod paging;
