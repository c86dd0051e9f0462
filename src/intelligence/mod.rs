pub mod position_tracker;
pub mod reputation;
pub mod scorer;

pub use position_tracker::PositionTracker;
pub use reputation::{compute_reputation, ReputationEngine};
pub use scorer::{score_at, score_signal, Grade, SignalScore};
