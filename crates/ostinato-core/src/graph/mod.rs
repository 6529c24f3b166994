//! Pipeline graph: components, buffers and pipelines under one registry.
//!
//! ```text
//!   ┌────────────┐   sinks    ┌──────────┐   sources   ┌────────────┐
//!   │ component  │ ─────────▶ │  buffer  │ ──────────▶ │ component  │
//!   │  (core 0)  │            │ (core 0) │             │  (core 1)  │
//!   └────────────┘            └──────────┘             └────────────┘
//!                                  │ inter_core: the consuming component
//!                                  │ was promoted to shared memory
//! ```
//!
//! Entries reference each other by [`EntryId`](crate::EntryId) only; the
//! registry resolves ids on every traversal, so freeing an entry never
//! leaves a dangling pointer behind.

mod entry;
mod registry;

pub use entry::{Entry, EntryHeader, EntryKind, EntrySummary};
pub use registry::{COMP_OBJ_SIZE, EndpointSide, GraphRegistry};
