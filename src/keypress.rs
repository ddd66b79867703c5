//! Loop termination by keypress.
//!
//! The read loop checks a [`StopSignal`] between reads only; a read that is
//! already blocking in the driver is never interrupted.

/// Polled between reads to decide whether a read loop ends.
pub trait StopSignal {
    /// `true` once the loop should stop.
    fn should_stop(&mut self) -> bool;
}

/// Stops when input is pending on stdin.
///
/// Pending bytes are consumed. On a line-buffered terminal the key press is
/// seen once Enter is pressed. A closed stdin counts as a key press.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinKeypress;

impl StdinKeypress {
    /// Create a stdin poller.
    pub fn new() -> Self {
        Self
    }
}

impl StopSignal for StdinKeypress {
    fn should_stop(&mut self) -> bool {
        key_pressed()
    }
}

#[cfg(unix)]
#[allow(unsafe_code)]
fn key_pressed() -> bool {
    let mut fds = libc::pollfd {
        fd: libc::STDIN_FILENO,
        events: libc::POLLIN,
        revents: 0,
    };

    // SAFETY: fds is a valid pollfd array of length 1; timeout 0 never blocks
    let ready = unsafe { libc::poll(&mut fds, 1, 0) };
    if ready <= 0 || fds.revents & (libc::POLLIN | libc::POLLHUP) == 0 {
        return false;
    }

    if fds.revents & libc::POLLIN != 0 {
        let mut buf = [0u8; 64];
        // SAFETY: buf is valid for buf.len() bytes; poll reported data, so this does not block
        unsafe { libc::read(libc::STDIN_FILENO, buf.as_mut_ptr().cast(), buf.len()) };
    }
    true
}

#[cfg(not(unix))]
fn key_pressed() -> bool {
    false
}

/// Stops after a fixed number of polls.
#[derive(Debug, Clone, Copy)]
pub struct StopAfter {
    remaining: usize,
}

impl StopAfter {
    /// Let the loop continue `polls` times, then stop.
    pub fn new(polls: usize) -> Self {
        Self { remaining: polls }
    }
}

impl StopSignal for StopAfter {
    fn should_stop(&mut self) -> bool {
        if self.remaining == 0 {
            return true;
        }
        self.remaining -= 1;
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_after() {
        let mut stop = StopAfter::new(2);
        assert!(!stop.should_stop());
        assert!(!stop.should_stop());
        assert!(stop.should_stop());
        assert!(stop.should_stop());
    }
}
