// Ingestion: the resilient fetch loop and the pieces it is built from.

pub mod backoff;
pub mod clock;
pub mod ledger;
pub mod worker;
