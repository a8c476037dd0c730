// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-title rewriting, so `ps` shows what each process is doing
//! instead of the raw invocation. Best-effort: platforms without `argv`
//! rewriting support simply see no change.

/// Set the process title to `"<app>: main"` for the supervisor itself.
pub fn set_main_title(app: &str) {
    setproctitle::set_title(format!("{app}: main"));
}

/// Render the `"<app>: <s1>[/<s2>]"` title a one-shot worker would carry.
///
/// The original design changes the process title per forked worker, since
/// each has its own `argv`. Heavy control requests here run as `tokio`
/// tasks sharing the supervisor's single process, so actually calling
/// `setproctitle::set_title` from one would stomp on every other task's
/// title and on the main title; this is kept as a pure formatter so
/// callers that do own a process (tests, or a future worker-pool-per-
/// process backend) can still produce the contractual string.
pub fn task_title(app: &str, s1: &str, s2: Option<&str>) -> String {
    match s2 {
        Some(s2) => format!("{app}: {s1}/{s2}"),
        None => format!("{app}: {s1}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_title_with_one_slot() {
        assert_eq!(task_title("pgmoneta", "primary", None), "pgmoneta: primary");
    }

    #[test]
    fn task_title_with_two_slots() {
        assert_eq!(
            task_title("pgmoneta", "primary", Some("b7")),
            "pgmoneta: primary/b7"
        );
    }
}
