//! HTTP handlers.
//!
//! Handlers stay thin: extract, validate the DTO, call the matching service, and shape
//! the response. Role requirements are declared through the extractor in the signature
//! (`AuthUser` or `CoachUser`); squad-level checks happen in the services.

pub mod auth;
pub mod fixtures;
pub mod health;
pub mod lineups;
pub mod squads;
pub mod users;
