// Ranking: word frequencies, recent history and the shared hub that
// serializes access to them.

pub mod frequency;
pub mod history;
pub mod hub;
