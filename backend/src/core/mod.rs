//! Core primitives: fixed-point money and the period clock

pub mod money;
pub mod time;
