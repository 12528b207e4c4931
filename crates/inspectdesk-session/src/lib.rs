//! Dashboard session: the five collections, the open form and the command
//! dispatcher that drives them.

mod command;
mod error;
mod session;

pub use command::{Command, Tab, parse_line};
pub use error::SessionError;
pub use session::{FormBody, LoadReport, Level, Notice, OpenForm, Outcome, Session};
