//! Loan Assistant Client
//!
//! Client-side core for a loan approval predictor with a companion chat
//! assistant:
//! - PredictionFlow: three-field applicant form, one prediction request per
//!   submission, a single replaceable result slot
//! - ChatFlow: append-only conversation log behind a toggleable panel
//! - Transport: one JSON POST per call against an injected base URL
//!
//! REQUEST LIFECYCLE:
//! INPUT → GATE (idle → pending) → SEND → APPLY (unless disposed) → IDLE

pub mod chat;
pub mod config;
pub mod error;
pub mod models;
pub mod prediction;
pub mod state;
pub mod transport;

pub use error::Result;

// Re-export common types
pub use chat::{ChatFlow, ChatView, SendOutcome};
pub use config::ClientConfig;
pub use error::{ClientError, ErrorKind};
pub use models::*;
pub use prediction::{PredictionFlow, PredictionView, SubmitOutcome};
pub use state::RequestState;
pub use transport::{HttpTransport, Transport};
