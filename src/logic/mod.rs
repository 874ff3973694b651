pub mod backfill;
pub mod heat;
pub mod milestones;
pub mod series;
pub mod window;

pub use backfill::{BackfillReport, BackfillService, BlockOutcome};
pub use milestones::SeasonMilestones;
pub use window::AccumulationWindow;
