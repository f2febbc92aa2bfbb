//! Typer Infer — type checks method bodies against a resolved state.
//!
//! Reads the symbol table only; diagnostics and query responses go through
//! the state's error queue, so many trees can be checked in parallel over
//! one shared snapshot.

pub mod checker;

pub use checker::check_tree;

#[cfg(test)]
mod tests;
