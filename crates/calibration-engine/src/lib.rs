//! Calibration Engine
//!
//! Turns raw backend scores for a single tweet into calibrated scores and a
//! final label. Every step is a pure function of the text and the backend
//! output; all tuning constants live in [`CalibrationPolicy`].

pub mod adjuster;
pub mod decision;
pub mod engine;
pub mod policy;
pub mod sarcasm;

pub use adjuster::{Adjusted, Correction, ScoreAdjuster};
pub use decision::{Decision, DecisionPath, DecisionRule};
pub use engine::{Calibration, CalibrationEngine};
pub use policy::{
    BackendProfile, CalibrationPolicy, DecisionPolicy, NeutralBiasPolicy, SarcasmCue,
    SarcasmPolicy,
};
pub use sarcasm::SarcasmDetector;
