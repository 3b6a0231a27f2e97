//! Real-time staff dashboard
//!
//! Periodically summarizes the site's collections and pushes the result to
//! every connected staff subscriber.

pub mod aggregator;
pub mod broadcast;
pub mod error;
pub mod memory;
pub mod registry;
pub mod snapshot;
pub mod source;

pub use aggregator::Aggregator;
pub use broadcast::{BroadcastConfig, BroadcastLoop, BroadcastSummary, LoopState, PushChannel};
pub use error::{PushError, StoreError};
pub use memory::MemorySource;
pub use registry::SubscriberRegistry;
pub use snapshot::Snapshot;
pub use source::{DashboardSource, DashboardView, PgDashboardSource};
