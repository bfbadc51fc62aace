//! mjcast match control
//!
//! Drives the `mjcast-engine` state machine against a record store for a
//! broadcast control surface: match creation with generated codes, round
//! commands, history and standings, overlay snapshots, seeded rehearsal
//! matches and a parallel audit of stored histories.

pub mod audit;
pub mod codes;
pub mod history;
pub mod overlay;
pub mod rehearsal;
pub mod session;
pub mod settings;
pub mod store;

pub use mjcast_engine as engine;
pub use session::MatchSession;
pub use settings::MatchSettings;
pub use store::{MemoryStore, RecordStore};
