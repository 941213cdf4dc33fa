pub mod actions;
pub mod cloudflare;
pub mod config;
pub mod errors;
pub mod github;
pub mod orchestrator;
pub mod poller;
pub mod report;
pub mod wrangler;
