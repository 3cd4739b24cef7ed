use tracing::warn;

use crate::domain::{DeadLetterQueue, Error};

#[derive(Default, Debug)]
pub struct StdErrDLQ {}

impl DeadLetterQueue for StdErrDLQ {
    fn report(&self, error: &Error) {
        warn!(rejection = error.is_rejection(), "{}", error);
        eprintln!("DLQ Report - Error: {}", error);
    }
}
