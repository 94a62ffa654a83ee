pub mod track;
pub mod track_ledger;
pub mod tracking_error;
pub mod trajectory;
