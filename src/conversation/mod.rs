pub mod intent;
pub mod machine;
pub mod parser;
pub mod report;
pub mod serving;
pub mod state;

pub use machine::{Orchestrator, TurnInput, TurnOutcome};
pub use state::{ClarificationKind, ClarificationRequest, ConversationState, Phase};
