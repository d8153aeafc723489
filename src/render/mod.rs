pub mod canvas;
pub mod history;
pub mod orchestrator;
pub mod palette;
pub mod recipe;
pub mod recipes;
pub mod registry;
pub mod state;
