//! WebDriver BiDi ↔ Chrome DevTools Protocol mapper core.
//!
//! This crate is the gateway described in the crate-level design notes: it
//! accepts BiDi commands over a [`transport::BidiTransport`], drives a
//! Chromium-family browser over CDP through a [`conn::CdpConnection`], and
//! emits BiDi events back. [`mapper::Mapper`] ties the pieces together;
//! [`processor::BrowsingContextProcessor`] is the actual state machine.

pub mod bidi;
pub mod cdp;
pub mod config;
pub mod conn;
pub mod dispatcher;
pub mod domain;
pub mod error;
pub mod event_manager;
pub mod mapper;
pub mod processor;
pub mod transport;

pub use config::MapperConfig;
pub use error::{BidiError, CdpError, ErrorCode};
pub use mapper::Mapper;
pub use processor::BrowsingContextProcessor;
