// Author: Dustin Pilgrim
// License: MIT

mod pointer;
mod session;

pub use session::{OutputChoice, Session, SessionError};
