#![forbid(unsafe_code)]

pub mod ceiling;
pub mod clock;
pub mod context;
pub mod coordinator;
pub mod engine;
mod error;
pub mod fetch;
pub mod metrics;
pub mod netlog;
pub mod resources;

pub use ceiling::FetchCeiling;
pub use coordinator::{CycleCoordinator, CycleObserver, Ticket};
pub use engine::{ControlEvent, CycleReport, GridEngine, Services};
pub use error::Error;
pub use metrics::{MetricsAggregator, MetricsState, Phase};
pub use resources::ResourceSet;
