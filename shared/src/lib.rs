//! Configuration loading and the wire types shared by the soundfront
//! server and its tests.

pub mod config;
pub mod types;
