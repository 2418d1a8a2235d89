use std::sync::{Mutex, MutexGuard, OnceLock};

/// Tests that read or mutate process environment serialize on this lock;
/// cargo runs tests in the same binary concurrently.
pub(crate) fn env_lock() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(())).lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub(crate) fn set_test_env() {
    std::env::set_var("CLASSMARK_ENV", "test");
    std::env::remove_var("CLASSMARK_STRICT_CONFIG");
    std::env::remove_var("GRADING_SCALE");
    std::env::remove_var("SUBMIT_GRACE_PERIOD_SECONDS");
    std::env::remove_var("DEADLINE_SWEEP_INTERVAL_SECONDS");
    std::env::remove_var("DATABASE_URL");
    std::env::remove_var("PROMETHEUS_ENABLED");
    std::env::remove_var("PROJECT_NAME");
    std::env::remove_var("BACKEND_CORS_ORIGINS");
}
