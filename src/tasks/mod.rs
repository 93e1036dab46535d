//! Background Tasks Module
//!
//! Contains the background workers that mutate the recency list.
//!
//! # Tasks
//! - Inserter: links new entries at the head
//! - Evictor: removes the tail once capacity is exceeded
//! - Repositioner: promotes entries read through `get`

mod pipeline;

pub use pipeline::Pipeline;
