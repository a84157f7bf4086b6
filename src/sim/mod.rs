//! Deterministic shot physics
//!
//! Everything here is pure and single-threaded: no clocks, no randomness, and
//! a stable scan order (by ball id, then cushion and pocket index), so the same
//! scene and strike always produce the same paths and events.

pub mod collision;
pub mod path;
pub mod plan;
pub mod poly;
pub mod resolve;
pub mod simulate;
pub mod state;
pub mod table;

pub use collision::{EventHorizon, ball_ball_time, ball_cushion_time, ball_pocket_time};
pub use path::{Kinematics, Motion, Path, PathSegment};
pub use plan::plan_rolling_shot;
pub use poly::Roots;
pub use simulate::simulate;
pub use state::{Ball, Coefficients, Frame, Scene, Shot, ShotEvent, ShotEventKind, ShotVerdict, Strike};
pub use table::{Cushion, Pocket, Table};
