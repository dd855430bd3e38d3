pub mod cloud;
pub mod config;
pub mod fleet;
pub mod metrics;
pub mod runner;
pub mod schedule;

// Re-export commonly used types
pub use cloud::{CloudApi, GatewayClient};
pub use config::{Config, ConfigManager};
pub use fleet::FleetTransitionController;
pub use metrics::MetricsSink;
pub use runner::{CycleReport, RegionReport, ScheduleRunner};
pub use schedule::{ScheduleDefaults, ScheduleDescriptor, Verdict, WindowEvaluator};
