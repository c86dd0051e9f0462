pub mod decision_refresher;
pub mod dispatcher;
pub mod fee_monitor;
pub mod notifier;
