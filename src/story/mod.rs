//! Story text presentation: splitting narrative into display-sized segments
//! and revealing them with a typewriter effect.
//!
//! - [`segmenter`] - pure text splitting
//! - [`reveal`] - reveal state machine and listener-driven session
//! - [`driver`] - tokio task pacing a session with a tick interval

pub mod driver;
pub mod reveal;
pub mod segmenter;

pub use reveal::{RevealController, RevealEvent, RevealListener, RevealPhase, RevealSession};
pub use segmenter::{segment, Segmenter};
