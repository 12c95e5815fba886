//! Text shaping between the recognizer, the dialogue service and the speaker

mod accents;
mod markup;

pub use accents::{capitalize_first, normalize};
pub use markup::strip_markup;
