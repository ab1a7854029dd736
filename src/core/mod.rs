// Death-trigger core for the OpenShock control API.
//
// Architecture:
// - config.rs: settings.json loading and validation
// - request.rs: randomized shock request construction
// - dispatch.rs: outbound HTTP capability and its event channel
// - trigger.rs: per-death orchestration and host collaborator seams

pub mod config;
pub mod dispatch;
pub mod request;
pub mod trigger;
