//! Authentication and session core for the PeopleHub client.
//!
//! This crate provides:
//! - Identity-token claim decoding for optimistic UI bootstrap
//! - An HTTP gateway with bearer/tenant header injection and
//!   silent-refresh / rate-limit recovery policies
//! - A session orchestrator sequencing the challenge → credentials →
//!   token-exchange → user-info login handshake
//! - Explicit FSM-based session phase tracking
//! - The post-login landing-route policy

mod claims;
mod error;
mod events;
mod gateway;
mod routing;
mod session;
mod session_fsm;

pub use claims::{decode_claims, ClaimsError, IdentityClaims};
pub use error::{ApiError, AuthError, AuthResult, ErrorCode};
pub use events::{LogoutReason, SessionEvent, SessionEvents};
pub use gateway::{is_public_path, ApiGateway, OAuthClient};
pub use routing::{resolve_landing, Landing, ADMIN_ROLE};
pub use session::{
    ChallengeOutcome, ExchangeOutcome, LoginOutcome, Session, SessionManager,
};
pub use session_fsm::{SessionMachine, SessionMachineInput, SessionMachineState, SessionPhase};
