use std::fmt::{Display, Formatter};

use super::Log;

impl<T: Display> Display for Log<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Log::None => Ok(()),
            Log::Default(s) | Log::Success(s) | Log::Result(s) | Log::Verbose(s) => {
                write!(f, "{}", s)
            }
        }
    }
}

impl<T> Log<T> {
    /// Function which return order of the log.
    pub fn order(&self) -> u8 {
        match self {
            Log::None => 0,
            Log::Default(_) => 1,
            Log::Success(_) => 2,
            Log::Result(_) => 3,
            Log::Verbose(_) => 4,
        }
    }
}

impl<TL: Display + Copy> Log<TL> {
    /// Print `message` under `cfg(debug_assertions)` when `self`'s level is
    /// at least `at`'s. Used by each compile phase (lex/shape/tree/fold/
    /// linearize) to trace itself without pulling in an external logging
    /// crate.
    pub fn trace(&self, at: Log<()>, phase: &str, message: impl Display) {
        #[cfg(debug_assertions)]
        if self.order() >= at.order() {
            println!("[{}; {}]: {}", self, phase, message);
        }
        #[cfg(not(debug_assertions))]
        let _ = (at, phase, message);
    }
}
