//! Priopool console library.
//!
//! This crate provides the command-line interface, the demo driver and the
//! interactive REPL that observe and control a `WorkerPool`.

pub mod cli;
pub mod commands;
pub mod display;
pub mod repl;
pub mod workload;
