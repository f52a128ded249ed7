//! Contains utility functions that are useful when working with the DW1000

/// How long to keep polling a non-blocking operation
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PollBudget {
    /// Keep polling until the operation completes, however long that takes
    Unbounded,

    /// Give up after this many attempts
    Attempts(u32),
}

/// The outcome of [`poll`]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Poll<T> {
    /// The operation completed with this value
    Ready(T),

    /// The budget ran out before the operation completed
    TimedOut,
}

/// Blocks on a non-blocking operation until it completes or the budget runs out
///
/// `op` is called at least once, unless the budget is `Attempts(0)`. An error
/// returned by `op` ends the polling immediately and is passed through.
pub fn poll<T, E, F>(budget: PollBudget, mut op: F) -> Result<Poll<T>, E>
where
    F: FnMut() -> nb::Result<T, E>,
{
    let mut attempts = 0;

    loop {
        if let PollBudget::Attempts(max) = budget {
            if attempts >= max {
                break Ok(Poll::TimedOut);
            }
        }
        attempts = attempts.saturating_add(1);

        match op() {
            Ok(result) => break Ok(Poll::Ready(result)),
            Err(nb::Error::WouldBlock) => (),
            Err(nb::Error::Other(error)) => break Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_value_is_returned() {
        let mut calls = 0;
        let result: Result<_, ()> = poll(PollBudget::Attempts(5), || {
            calls += 1;
            if calls < 3 {
                Err(nb::Error::WouldBlock)
            } else {
                Ok(calls)
            }
        });

        assert_eq!(result, Ok(Poll::Ready(3)));
    }

    #[test]
    fn budget_limits_attempts() {
        let mut calls = 0;
        let result: Result<Poll<()>, ()> = poll(PollBudget::Attempts(4), || {
            calls += 1;
            Err(nb::Error::WouldBlock)
        });

        assert_eq!(result, Ok(Poll::TimedOut));
        assert_eq!(calls, 4);
    }

    #[test]
    fn errors_end_polling() {
        let mut calls = 0;
        let result: Result<Poll<()>, &str> = poll(PollBudget::Unbounded, || {
            calls += 1;
            if calls == 2 {
                Err(nb::Error::Other("broken"))
            } else {
                Err(nb::Error::WouldBlock)
            }
        });

        assert_eq!(result, Err("broken"));
        assert_eq!(calls, 2);
    }

    #[test]
    fn zero_attempts_never_polls() {
        let result: Result<Poll<()>, ()> =
            poll(PollBudget::Attempts(0), || panic!("polled with an empty budget"));

        assert_eq!(result, Ok(Poll::TimedOut));
    }
}
