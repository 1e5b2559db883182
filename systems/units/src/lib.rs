#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Concrete gameplay entities: buildable plateaus, walking enemies, towers
//! and the shots they fire.
//!
//! Every unit keeps its mutable state in interior cells so that one entity's
//! tick can act on another entity obtained from a registry query. Visual state
//! is published to a dedicated drawable after each change; the drawables never
//! reach back into gameplay state.

mod enemy;
mod plateau;
mod shot;
mod tower;

pub use enemy::Enemy;
pub use plateau::Plateau;
pub use shot::Shot;
pub use tower::{Tower, TowerSpec};
