pub mod components;
pub mod config;
pub mod display;
pub mod error;
pub mod menu;
pub mod startup;
