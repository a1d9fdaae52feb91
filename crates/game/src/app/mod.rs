pub(crate) mod bootstrap;
mod demo_input;
mod gameplay;
mod level;
pub(crate) mod loop_runner;
