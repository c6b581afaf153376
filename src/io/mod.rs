/// CSV export of run reports.
pub mod export;
