//! Collection engine: the control loops binding the scheduler, the
//! upstream client, and the store.

pub mod enrich;
pub mod maintenance;
pub mod refresh;
pub mod sample;

pub use enrich::EnrichJob;
pub use maintenance::{PurgeDailyJob, PurgeHourlyJob, RollupDailyJob, RollupHourlyJob};
pub use refresh::{seed_watchlist, RefreshJob};
pub use sample::SampleJob;
