/// Router Module Index
///
/// Routes are split by access level. Access control is applied per module with Axum
/// layers, so a protected endpoint cannot be exposed by forgetting a check in a handler.

/// Routes reachable without a session: health probes and the credential flow.
pub mod public;

/// Routes behind the authentication layer. Role and squad checks happen on top of it.
pub mod authenticated;
