//! ragprobe Client - query controller for a remote RAG endpoint
//!
//! This crate implements the interaction behind the question form:
//! - `QueryController`: draft editing, top-K clamping, and the
//!   idle/submitting/success/failed state machine
//! - `HttpTransport`: the JSON-over-HTTP request to the RAG service
//! - Notifiers that carry success/failure messages to a presentation
//!
//! Retrieval and answer generation happen behind the endpoint; this crate
//! only sends the question and reports what comes back.
//!
//! Author: hephaex@gmail.com

pub mod controller;
pub mod http;
pub mod notify;

pub use controller::QueryController;
pub use http::HttpTransport;
pub use notify::{ChannelNotifier, TracingNotifier};
