//! Session state machine using rust-fsm.
//!
//! Tracks the login handshake as an explicit finite state machine
//! instead of deriving phase from which storage keys happen to exist.
//!
//! ## State Diagram
//!
//! ```text
//! ┌─────────────────┐
//! │    SignedOut    │ (initial)
//! └────────┬────────┘
//!          │ ChallengeAccepted          SessionRestored / DirectLogin
//!          ▼                                     │
//! ┌─────────────────┐                            │
//! │ ChallengeIssued │──RedirectHandoff──►SignedOut
//! └────────┬────────┘                            │
//!          │ CredentialsAccepted                 │
//!          ▼                                     │
//! ┌──────────────────────┐                       │
//! │ CredentialsSubmitted │──RedirectHandoff──►SignedOut
//! └────────┬─────────────┘                       │
//!          │ TokensIssued                        │
//!          ▼                                     ▼
//! ┌─────────────────┐  IdentityResolved  ┌─────────────────┐
//! │ TokenExchanged  │ ─────────────────► │  Authenticated  │
//! └─────────────────┘                    └────────┬────────┘
//!                                                 │ LogoutRequested
//!                                                 ▼
//!                                        ┌─────────────────┐
//!                                        │   SigningOut    │──LogoutComplete──►SignedOut
//!                                        └─────────────────┘
//! ```
//!
//! Short-circuit edges exist because the server may collapse the
//! handshake: a challenge or credential response can carry tokens
//! directly (`TokensIssued`), or a complete identity (`DirectLogin`).

use rust_fsm::*;
use serde::{Deserialize, Serialize};

// Generates the `session_machine` module with State, Input and
// StateMachine types.
state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(SignedOut)

    SignedOut => {
        ChallengeAccepted => ChallengeIssued,
        TokensIssued => TokenExchanged,
        DirectLogin => Authenticated,
        SessionRestored => Authenticated
    },
    ChallengeIssued => {
        CredentialsAccepted => CredentialsSubmitted,
        // The challenge response may skip straight to tokens
        TokensIssued => TokenExchanged,
        DirectLogin => Authenticated,
        // The server sent the user to an external identity provider
        RedirectHandoff => SignedOut
    },
    CredentialsSubmitted => {
        TokensIssued => TokenExchanged,
        DirectLogin => Authenticated,
        RedirectHandoff => SignedOut
    },
    TokenExchanged => {
        IdentityResolved => Authenticated,
        SessionRevoked => SignedOut
    },
    Authenticated => {
        // A refresh re-enters the exchange phase
        TokensIssued => TokenExchanged,
        LogoutRequested => SigningOut,
        SessionRevoked => SignedOut
    },
    SigningOut => {
        LogoutComplete => SignedOut
    }
}

// Re-export the generated types with clearer names
pub use session_machine::Input as SessionMachineInput;
pub use session_machine::State as SessionMachineState;
pub use session_machine::StateMachine as SessionMachine;

/// Simplified view of the machine state for status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No session.
    SignedOut,
    /// A login challenge has been issued.
    ChallengeIssued,
    /// Credentials were accepted, waiting for tokens.
    CredentialsSubmitted,
    /// Tokens are in hand, identity not yet resolved.
    TokenExchanged,
    /// Fully signed in.
    Authenticated,
    /// Logout in progress.
    SigningOut,
}

impl SessionPhase {
    /// True only for a fully established session.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionPhase::Authenticated)
    }

    /// True while a handshake or teardown is in flight.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SessionPhase::ChallengeIssued
                | SessionPhase::CredentialsSubmitted
                | SessionPhase::TokenExchanged
                | SessionPhase::SigningOut
        )
    }
}

impl From<&SessionMachineState> for SessionPhase {
    fn from(state: &SessionMachineState) -> Self {
        match state {
            SessionMachineState::SignedOut => SessionPhase::SignedOut,
            SessionMachineState::ChallengeIssued => SessionPhase::ChallengeIssued,
            SessionMachineState::CredentialsSubmitted => SessionPhase::CredentialsSubmitted,
            SessionMachineState::TokenExchanged => SessionPhase::TokenExchanged,
            SessionMachineState::Authenticated => SessionPhase::Authenticated,
            SessionMachineState::SigningOut => SessionPhase::SigningOut,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_signed_out() {
        let machine = SessionMachine::new();
        assert_eq!(*machine.state(), SessionMachineState::SignedOut);
    }

    #[test]
    fn test_full_handshake() {
        let mut machine = SessionMachine::new();

        machine
            .consume(&SessionMachineInput::ChallengeAccepted)
            .unwrap();
        assert_eq!(*machine.state(), SessionMachineState::ChallengeIssued);

        machine
            .consume(&SessionMachineInput::CredentialsAccepted)
            .unwrap();
        assert_eq!(*machine.state(), SessionMachineState::CredentialsSubmitted);

        machine.consume(&SessionMachineInput::TokensIssued).unwrap();
        assert_eq!(*machine.state(), SessionMachineState::TokenExchanged);

        machine
            .consume(&SessionMachineInput::IdentityResolved)
            .unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Authenticated);
    }

    #[test]
    fn test_challenge_short_circuits_to_tokens() {
        let mut machine = SessionMachine::new();

        machine
            .consume(&SessionMachineInput::ChallengeAccepted)
            .unwrap();
        machine.consume(&SessionMachineInput::TokensIssued).unwrap();
        assert_eq!(*machine.state(), SessionMachineState::TokenExchanged);
    }

    #[test]
    fn test_direct_login_from_credentials() {
        let mut machine = SessionMachine::new();

        machine
            .consume(&SessionMachineInput::ChallengeAccepted)
            .unwrap();
        machine
            .consume(&SessionMachineInput::CredentialsAccepted)
            .unwrap();
        machine.consume(&SessionMachineInput::DirectLogin).unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Authenticated);
    }

    #[test]
    fn test_redirect_handoff_resets() {
        let mut machine = SessionMachine::new();

        machine
            .consume(&SessionMachineInput::ChallengeAccepted)
            .unwrap();
        machine
            .consume(&SessionMachineInput::RedirectHandoff)
            .unwrap();
        assert_eq!(*machine.state(), SessionMachineState::SignedOut);
    }

    #[test]
    fn test_session_restore() {
        let mut machine = SessionMachine::new();

        machine
            .consume(&SessionMachineInput::SessionRestored)
            .unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Authenticated);
    }

    #[test]
    fn test_refresh_reenters_exchange() {
        let mut machine = SessionMachine::new();

        machine
            .consume(&SessionMachineInput::SessionRestored)
            .unwrap();
        machine.consume(&SessionMachineInput::TokensIssued).unwrap();
        assert_eq!(*machine.state(), SessionMachineState::TokenExchanged);

        machine
            .consume(&SessionMachineInput::IdentityResolved)
            .unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Authenticated);
    }

    #[test]
    fn test_revocation_during_exchange() {
        let mut machine = SessionMachine::new();

        machine.consume(&SessionMachineInput::TokensIssued).unwrap();
        machine
            .consume(&SessionMachineInput::SessionRevoked)
            .unwrap();
        assert_eq!(*machine.state(), SessionMachineState::SignedOut);
    }

    #[test]
    fn test_logout_flow() {
        let mut machine = SessionMachine::new();

        machine
            .consume(&SessionMachineInput::SessionRestored)
            .unwrap();
        machine
            .consume(&SessionMachineInput::LogoutRequested)
            .unwrap();
        assert_eq!(*machine.state(), SessionMachineState::SigningOut);

        machine
            .consume(&SessionMachineInput::LogoutComplete)
            .unwrap();
        assert_eq!(*machine.state(), SessionMachineState::SignedOut);
    }

    #[test]
    fn test_invalid_transition_returns_error() {
        let mut machine = SessionMachine::new();

        // Can't log out before signing in
        assert!(machine
            .consume(&SessionMachineInput::LogoutRequested)
            .is_err());

        // Can't resolve identity without tokens
        assert!(machine
            .consume(&SessionMachineInput::IdentityResolved)
            .is_err());
    }

    #[test]
    fn test_phase_conversion() {
        assert_eq!(
            SessionPhase::from(&SessionMachineState::SignedOut),
            SessionPhase::SignedOut
        );
        assert_eq!(
            SessionPhase::from(&SessionMachineState::Authenticated),
            SessionPhase::Authenticated
        );
        assert_eq!(
            SessionPhase::from(&SessionMachineState::SigningOut),
            SessionPhase::SigningOut
        );
    }

    #[test]
    fn test_phase_predicates() {
        assert!(SessionPhase::Authenticated.is_authenticated());
        assert!(!SessionPhase::SignedOut.is_authenticated());
        assert!(!SessionPhase::TokenExchanged.is_authenticated());

        assert!(SessionPhase::ChallengeIssued.is_transient());
        assert!(SessionPhase::SigningOut.is_transient());
        assert!(!SessionPhase::SignedOut.is_transient());
        assert!(!SessionPhase::Authenticated.is_transient());
    }
}
