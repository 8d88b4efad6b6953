mod concurrency;
mod config_loading;
mod restart_recovery;
mod support;
mod tool_change;
