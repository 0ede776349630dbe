use regional_portal::{AppConfig, config::Env};
use serial_test::serial;
use std::{env, panic, time::Duration};

const CONFIG_VARS: [&str; 7] = [
    "APP_ENV",
    "DATABASE_URL",
    "BIND_ADDR",
    "ADMIN_DEFAULT_PASSWORD",
    "WRITE_MAX_ATTEMPTS",
    "WRITE_BACKOFF_MS",
    "DB_BUSY_TIMEOUT_MS",
];

// --- Setup/Teardown Utilities ---

/// Runs `test` with a clean configuration environment and restores it afterwards.
fn run_with_env<T, R>(test: T) -> R
where
    T: FnOnce() -> R + panic::UnwindSafe,
{
    let originals: Vec<(&str, Option<String>)> =
        CONFIG_VARS.iter().map(|&var| (var, env::var(var).ok())).collect();

    unsafe {
        for var in CONFIG_VARS {
            env::remove_var(var);
        }
    }

    let result = panic::catch_unwind(test);

    for (key, original_value) in originals {
        unsafe {
            match original_value {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }

    match result {
        Ok(value) => value,
        Err(e) => panic::resume_unwind(e),
    }
}

// --- Tests ---

#[test]
#[serial]
fn test_app_config_production_fail_fast() {
    let result = panic::catch_unwind(|| {
        run_with_env(|| {
            unsafe {
                env::set_var("APP_ENV", "production");
                env::set_var("DATABASE_URL", "sqlite:///var/lib/portal/portal.db");
            }
            // ADMIN_DEFAULT_PASSWORD is missing
            AppConfig::load()
        })
    });

    assert!(
        result.is_err(),
        "Production config loading should panic without an admin password"
    );
}

#[test]
#[serial]
fn test_app_config_local_env_defaults() {
    let config = run_with_env(|| {
        unsafe {
            env::set_var("APP_ENV", "local");
        }
        AppConfig::load()
    });

    assert_eq!(config.env, Env::Local);
    assert_eq!(config.db_url, "sqlite://portal.db?mode=rwc");
    assert_eq!(config.bind_addr, "0.0.0.0:8080");
    assert_eq!(config.admin_default_password, "123456");

    let policy = config.retry_policy();
    assert_eq!(policy.max_attempts, 3);
    assert_eq!(policy.base_backoff, Duration::from_millis(100));
    assert_eq!(config.db_busy_timeout, Duration::from_millis(10_000));
}

#[test]
#[serial]
fn test_app_config_write_policy_overrides() {
    let config = run_with_env(|| {
        unsafe {
            env::set_var("WRITE_MAX_ATTEMPTS", "5");
            env::set_var("WRITE_BACKOFF_MS", "20");
        }
        AppConfig::load()
    });

    let policy = config.retry_policy();
    assert_eq!(policy.max_attempts, 5);
    assert_eq!(policy.base_backoff, Duration::from_millis(20));
}

#[test]
#[serial]
fn test_app_config_rejects_non_numeric_bounds() {
    let result = panic::catch_unwind(|| {
        run_with_env(|| {
            unsafe {
                env::set_var("WRITE_MAX_ATTEMPTS", "many");
            }
            AppConfig::load()
        })
    });

    assert!(result.is_err());
}
