//! User-facing output, kept apart from logging.

#[cfg(test)]
use std::cell::RefCell;

/// Destination of command output.
pub trait Console {
    /// A line of regular output.
    fn out(&self, line: &str);
    /// A line of error or warning output.
    fn err(&self, line: &str);
}

/// Standard output and standard error.
#[derive(Debug, Default, Clone, Copy)]
pub struct Terminal;

impl Console for Terminal {
    fn out(&self, line: &str) {
        println!("{}", line);
    }

    fn err(&self, line: &str) {
        eprintln!("{}", line);
    }
}

/// Collects output for inspection in tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct Recorder {
    pub out: RefCell<Vec<String>>,
    pub err: RefCell<Vec<String>>,
}

#[cfg(test)]
impl Recorder {
    pub fn out_lines(&self) -> Vec<String> {
        self.out.borrow().clone()
    }

    pub fn err_lines(&self) -> Vec<String> {
        self.err.borrow().clone()
    }
}

#[cfg(test)]
impl Console for Recorder {
    fn out(&self, line: &str) {
        self.out.borrow_mut().push(line.to_string());
    }

    fn err(&self, line: &str) {
        self.err.borrow_mut().push(line.to_string());
    }
}
