//! HTTP surface

pub mod services;
