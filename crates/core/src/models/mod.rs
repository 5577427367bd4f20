pub mod balance;
pub mod group;
pub mod history;
pub mod market;
pub mod portfolio;
pub mod settings;
