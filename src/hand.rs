//! Hand detection, landmark estimation, and tracking.

pub mod detection;
pub mod landmark;
pub mod tracking;
