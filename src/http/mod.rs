//! HTTP/1.1 echo service.
//!
//! # Architecture
//!
//! - **`connection`**: per-connection request/response state machine
//! - **`parser`**: request head parsing and body framing (length or chunked)
//! - **`request`**: request representation with canonical header names
//! - **`response`**: response representation with builder pattern
//! - **`writer`**: serializes and writes responses to the client
//! - **`handlers`**: routing, the hello page and the body echo
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Wait for a full request, body included
//!        └──────┬──────┘
//!               │ Request received (or rejected as malformed)
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← Route to hello or echo
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Send response to client
//!        └──────┬───────────┘
//!               │ Response sent
//!               ├─ Keep-Alive → Reading (same connection)
//!               └─ Close → Closed
//! ```

pub mod connection;
pub mod handlers;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
