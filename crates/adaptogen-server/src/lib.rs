//! HTTP service that schedules shell commands on cron expressions and serves
//! their most recent cached result.

pub mod api;
pub mod lifecycle;
pub mod middleware;
pub mod orchestrator;
pub mod scheduler;
