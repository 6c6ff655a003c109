pub mod capture;
pub mod card;
pub mod config;
pub mod export;
pub mod gemini;
pub mod generation;
pub mod model;
pub mod orchestrator;
pub mod share;
pub mod social;
