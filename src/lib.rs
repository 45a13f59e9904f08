//! # rankset — typed ordered sets over Redis-compatible stores
//!
//! A set of unique members, each carrying a floating-point score, addressable
//! both by **rank** (position in score order) and by **score** (value ranges),
//! with weighted union/intersection and cursor-based enumeration. Every
//! operation maps onto a single command of the backing store.
//!
//! ## Features
//!
//! - **Typed members**: text, integer and float members with one byte-order
//!   identity (see [`Member`])
//! - **Range queries**: by rank or score bound, either direction, optional
//!   `LIMIT` window (see [`Sortable`])
//! - **Set algebra**: weighted `ZUNIONSTORE`/`ZINTERSTORE` with SUM/MIN/MAX
//! - **Cursor scans**: single pages or a lazy [`MemberScan`] iterator
//! - **Counters**: integer and float scalar keys
//! - **Backends**: a blocking TCP [`Client`] or the in-process
//!   [`MemoryBackend`]
//!
//! ## Quick Start
//!
//! ```
//! use rankset::{Backend, MemoryBackend, Order, ScoreBound, Sortable};
//!
//! fn main() -> rankset::Result<()> {
//!     let db = MemoryBackend::new();
//!     let scores = db.sorted_set("scores");
//!     scores.insert_batch([("ann", 31.0), ("bo", 12.5), ("cy", 27.0)])?;
//!
//!     let podium = scores.select_by_rank(0, 2, true, Order::Descending)?;
//!     assert_eq!(podium[0].member.to_string(), "ann");
//!
//!     let mid = scores.count_by_score(ScoreBound::exclusive(12.5), 30.0)?;
//!     assert_eq!(mid, 1);
//!     Ok(())
//! }
//! ```
//!
//! Against a server, swap the backend:
//!
//! ```no_run
//! use rankset::{Backend, Client};
//!
//! let client = Client::connect("127.0.0.1", 6379)?;
//! client.sorted_set("scores").insert("ann", 31.0)?;
//! # Ok::<(), rankset::Error>(())
//! ```

pub mod backend;
pub mod client;
pub mod config;
pub mod connection;
pub mod element;
pub mod error;
pub mod member;
pub mod memory;
pub mod resp;
pub mod scalar;
pub mod sorted_set;
pub mod types;

// ── Re-exports for ergonomic top-level usage ────────────────────────────────

pub use backend::Backend;
pub use client::Client;
pub use config::{Config, ConnectionConfig};
pub use element::Element;
pub use error::{Error, Result};
pub use member::{Entry, Limit, Member, Order, ScoreBound};
pub use memory::MemoryBackend;
pub use scalar::{Counter, FloatCounter};
pub use sorted_set::{Aggregate, MemberScan, ScanPage, Sortable, SortedSet};
pub use types::{ToArg, Value};
