// Lexical extraction: cleaning, script-class segmentation and heuristic
// part-of-speech classification for Japanese post text.

pub mod clean;
pub mod heuristic;
pub mod rules;
pub mod segment;
pub mod traits;
