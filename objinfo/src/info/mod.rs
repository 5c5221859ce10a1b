//! Map and program metadata
//!
//! - [`MapInfo`] / [`ProgramInfo`]: immutable results, identical whichever
//!   backend produced them
//! - [`Resolver`]: picks the backend and performs the query

pub mod map;
pub mod program;
pub mod resolver;

pub use map::MapInfo;
pub use program::ProgramInfo;
pub use crate::domain::Backend;
pub use resolver::{map_info, program_info, Resolver};
