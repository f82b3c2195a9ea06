pub mod agent;
pub mod errors;
pub mod explorer;
pub mod models;
pub mod prompts;
pub mod providers;
pub mod systems;
