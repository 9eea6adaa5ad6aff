pub mod commands;
pub mod databases;
pub mod display;
pub mod engine;
pub mod restore_workflow;
pub mod storage;
pub mod ui;
