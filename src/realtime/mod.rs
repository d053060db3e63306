pub mod market_state;
pub mod scheduler;
pub mod zone_monitor;

pub use market_state::{MarketState, MarketStateClassifier};
pub use scheduler::Scheduler;
pub use zone_monitor::{RunOutcome, RunRecord, ZoneMonitor};
