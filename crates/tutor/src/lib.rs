//! The ThinkFirst tutor.
//!
//! Every user message goes through the same pipeline:
//!
//! 1. **Classify** the message against the previous context (topic,
//!    attempt count, learning or chat mode)
//! 2. **Look up** weather or news when the message asks for it
//! 3. **Instruct**: render the context into a system instruction that
//!    picks one guidance tier
//! 4. **Generate** via the configured provider
//! 5. **Parse** the structured reply
//!
//! The classifier and prompt builder are pure; only step 2 and step 4
//! touch the network. The new context is returned to the caller, never
//! stored here.

pub mod classifier;
pub mod error;
pub mod prompt;
pub mod recall;
pub mod reply;
pub mod time_travel;
pub mod tutor;

pub use classifier::{Classification, Classifier, ClassifierConfig, Rule, classify, extract_topic};
pub use error::TutorError;
pub use prompt::{GuidanceTier, Instruction, build_instruction};
pub use recall::{MemoryCheck, MemoryCheckRequest};
pub use reply::{ReplyMode, TutorReply, parse_reply};
pub use time_travel::{TimeTravelContext, unlocked_hints};
pub use tutor::{Tutor, TurnRequest, TurnResponse};
