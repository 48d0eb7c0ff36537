//! swaphud command-line tool: settings editor and overlay launcher.

pub mod commands;
