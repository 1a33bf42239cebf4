//! Session credentials: the persisted token pair and sign-in/sign-out signalling.

pub mod session;
pub mod token_store;

pub use session::{SessionSignal, SessionState};
pub use token_store::{TokenPair, TokenStore};
