//! Built-in tools

mod echo;

pub use echo::create_echo_tool;
