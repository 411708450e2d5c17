//! UI module - reusable painters shared across tabs

pub mod components;
