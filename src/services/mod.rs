pub mod dispatcher;

pub use dispatcher::{DispatchError, Outcome, StatementDispatcher, StatementResult};
