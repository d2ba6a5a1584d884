//! # Recipes Server
//!
//! Library half of the `server_recipes` binary: the recipe store, the
//! daily-recipe rotation job and the HTTP read API. Kept as a library so the
//! integration tests can drive the router and the rotator directly.

pub mod recipe_logic;
