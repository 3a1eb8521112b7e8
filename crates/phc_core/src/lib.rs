//! Path-tracking and endgame core for numerical polynomial homotopy
//! continuation.
//!
//! Given a homotopy `H(x, t)` with `H(x, 1) = G(x)` (a start system with
//! known roots) and `H(x, 0) = F(x)` (the target system), this crate
//! follows a single solution path `x(t)` from `t = 1` down to `t = 0` and
//! classifies the endpoint: a regular finite solution, a singular finite
//! solution (with a winding number / multiplicity estimate), or a path
//! diverging to infinity.
//!
//! Symbolic input parsing, start-system construction, and the top-level
//! driver that aggregates many paths are out of scope here — see the
//! crate-level contracts in [`homotopy`] and [`vector`] for what this
//! core expects from those collaborators.
//!
//! Key components:
//! - [`homotopy::Homotopy`]: the evaluator contract (C1).
//! - [`predictor`]/[`corrector`]/[`step_control`]: the predictor-corrector
//!   stepper with adaptive step size (C2-C4).
//! - [`core_tracker::CoreTracker`]: orchestrates the stepper over a `t`
//!   interval (C5).
//! - [`valuation`]: Puiseux-valuation tracking used by the endgame (C6).
//! - [`cauchy::CauchyEndgame`]: Cauchy's integral formula endgame for
//!   singular endpoints (C7).
//! - [`path_tracker::PathTracker`]: wraps the core tracker, drives the
//!   endgame, and classifies the endpoint (C8).

pub mod blas;
pub mod cauchy;
pub mod core_tracker;
pub mod corrector;
pub mod error;
pub mod homotopy;
pub mod linalg;
pub mod path_tracker;
pub mod predictor;
pub mod result;
pub mod step_control;
pub mod types;
pub mod valuation;
pub mod vector;

pub use cauchy::{CauchyEndgame, CauchyOutcome};
pub use core_tracker::{CoreTracker, CoreTrackerState};
pub use error::TrackerError;
pub use homotopy::Homotopy;
pub use path_tracker::{PathTracker, VectorContract};
pub use result::PathResult;
pub use types::{CoreStatus, CoreTrackerOptions, PathStatus, PathTrackerOptions};
pub use vector::{HomogeneousGroup, TrackedVector};
