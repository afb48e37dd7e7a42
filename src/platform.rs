//! Host platform detection.
//!
//! The engine picks its external commands (`du`/`rm` or PowerShell) from the
//! OS family and sizes its worker pool from the number of logical processors.

use std::env;

/// Processor count assumed when neither the OS nor the environment reports one.
pub const FALLBACK_CPU_COUNT: usize = 4;

/// Lower bound on the number of external commands kept in flight.
pub const MIN_JOBS: usize = 2;

/// Whether the host belongs to the Windows family.
#[must_use]
pub const fn is_windows_family() -> bool {
    cfg!(windows)
}

/// Number of logical processors available to this process.
///
/// Uses the count `num_cpus` reports, then the `NUMBER_OF_PROCESSORS`
/// environment hint, and finally falls back to [`FALLBACK_CPU_COUNT`].
/// Always returns at least 1.
#[must_use]
pub fn cpu_count() -> usize {
    resolve_cpu_count(
        Some(num_cpus::get()),
        env::var("NUMBER_OF_PROCESSORS").ok().as_deref(),
    )
}

/// Default worker-pool bound: `max(2, cpu_count())`.
#[must_use]
pub fn default_jobs() -> usize {
    cpu_count().max(MIN_JOBS)
}

fn resolve_cpu_count(reported: Option<usize>, hint: Option<&str>) -> usize {
    reported
        .filter(|&n| n > 0)
        .or_else(|| {
            hint.and_then(|h| h.trim().parse::<usize>().ok())
                .filter(|&n| n > 0)
        })
        .unwrap_or(FALLBACK_CPU_COUNT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reported_count_wins() {
        assert_eq!(resolve_cpu_count(Some(12), Some("3")), 12);
    }

    #[test]
    fn test_env_hint_used_when_os_unavailable() {
        assert_eq!(resolve_cpu_count(None, Some("6")), 6);
        assert_eq!(resolve_cpu_count(None, Some(" 8\n")), 8);
    }

    #[test]
    fn test_invalid_hint_falls_back() {
        assert_eq!(resolve_cpu_count(None, Some("lots")), FALLBACK_CPU_COUNT);
        assert_eq!(resolve_cpu_count(None, Some("0")), FALLBACK_CPU_COUNT);
        assert_eq!(resolve_cpu_count(None, None), FALLBACK_CPU_COUNT);
    }

    #[test]
    fn test_cpu_count_matches_num_cpus() {
        assert_eq!(cpu_count(), num_cpus::get().max(1));
    }

    #[test]
    fn test_host_values_are_sane() {
        assert!(cpu_count() >= 1);
        assert!(default_jobs() >= MIN_JOBS);
        assert_eq!(is_windows_family(), cfg!(windows));
    }
}
