pub mod aws_service;
pub mod cloud_compute;
pub mod instance_launcher;
pub mod instance_terminator;
pub mod network_resolver;
pub mod orchestrator;
