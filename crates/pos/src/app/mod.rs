pub(crate) mod bootstrap;
mod commands;
mod config;
mod frontend;
pub(crate) mod loop_runner;
mod pos;
