//! Runtime invariant checks with contract-test support
//!
//! Production code asserts session and scheduler invariants through
//! [`assert_invariant!`]; every check is recorded per thread so tests can
//! prove a code path actually exercised the invariants it relies on.
//!
//! ```rust,ignore
//! use crabface::assert_invariant;
//!
//! assert_invariant!(
//!     self.stream.is_none(),
//!     "Session holds at most one live stream",
//!     "MediaSession::start"
//! );
//!
//! #[test]
//! fn contract_session() {
//!     // ... drive a session ...
//!     contract_test("session", &["Session holds at most one live stream"]);
//! }
//! ```

use std::cell::RefCell;
use std::collections::BTreeSet;

thread_local! {
    static CHECKED: RefCell<BTreeSet<String>> = const { RefCell::new(BTreeSet::new()) };
}

/// Assert an invariant and record that it was checked.
///
/// # Panics
/// Panics with `INVARIANT VIOLATION` if the condition is false.
#[macro_export]
macro_rules! assert_invariant {
    ($condition:expr, $message:expr) => {
        $crate::invariant_ppt::__check($condition, $message, None)
    };
    ($condition:expr, $message:expr, $context:expr) => {
        $crate::invariant_ppt::__check($condition, $message, Some($context))
    };
}

#[doc(hidden)]
pub fn __check(condition: bool, message: &str, context: Option<&str>) {
    CHECKED.with(|checked| {
        checked.borrow_mut().insert(message.to_string());
    });

    if !condition {
        panic!(
            "INVARIANT VIOLATION [{}]: {}",
            context.unwrap_or("unknown"),
            message
        );
    }
}

/// Invariant messages checked on this thread so far
pub fn invariants_checked() -> Vec<String> {
    CHECKED.with(|checked| checked.borrow().iter().cloned().collect())
}

/// Fail unless every `required` invariant was checked on this thread.
pub fn contract_test(test_name: &str, required: &[&str]) {
    let missing: Vec<&str> = CHECKED.with(|checked| {
        let checked = checked.borrow();
        required
            .iter()
            .copied()
            .filter(|message| !checked.contains(*message))
            .collect()
    });

    if !missing.is_empty() {
        panic!(
            "CONTRACT FAILURE [{}]: invariants never checked:\n  - {}",
            test_name,
            missing.join("\n  - ")
        );
    }
}

pub fn clear_invariant_log() {
    CHECKED.with(|checked| checked.borrow_mut().clear());
}
