//! osdd — OpenSDD command-line front end.
//!
//! Resolves a recipe's declared context into operator-supplied answers and
//! hands them, with the recipe, to the materialization step.

pub mod cli;
pub mod core;
pub mod journal;
pub mod prompt;
pub mod ui;
