/// Chart view models.
///
/// Each view owns only its selection state and derives a fresh, serializable
/// snapshot from the shared records on every `derive` call; drawing the
/// snapshot is left to whatever renders it.

pub mod leaders;
pub mod timeline;
pub mod trials;

pub use leaders::{Dashboard, LeaderDashboard, Side};
pub use timeline::{DisasterTimelineView, Timeline};
pub use trials::{TrialAccuracy, TrialAccuracyView};
