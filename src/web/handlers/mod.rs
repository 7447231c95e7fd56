pub mod events;
pub mod keywords;
pub mod records;
pub mod stats;
