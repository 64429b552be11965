use restaurant_platform::config::{ConfigError, ConfigLoader};
use std::{
    env, fs,
    path::PathBuf,
    sync::{Mutex, MutexGuard, OnceLock},
};
use tempfile::TempDir;

const MANAGED_VARS: &[&str] = &[
    "RESTAURANT_PROFILE",
    "RESTAURANT_API_BIND_ADDR",
    "RESTAURANT_LOG_LEVEL",
    "RESTAURANT_JWT_SECRET",
    "RESTAURANT_CORS_ALLOWED_ORIGINS",
    "RESTAURANT_BREVO_API_KEY",
    "RESTAURANT_MAIL_WELCOME_TEMPLATE_ID",
    "RESTAURANT_BOOTSTRAP_ADMIN_EMAIL",
    "RESTAURANT_BOOTSTRAP_ADMIN_PASSWORD",
];

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

fn env_guard() -> MutexGuard<'static, ()> {
    env_lock()
        .lock()
        .unwrap_or_else(|poison| poison.into_inner())
}

fn clear_env() {
    for var in MANAGED_VARS {
        unsafe {
            env::remove_var(var);
        }
    }
}

fn write_env_file(dir: &TempDir, name: &str, contents: &str) {
    let path = dir.path().join(name);
    fs::write(path, contents).unwrap();
}

fn loader_for(dir: &TempDir) -> ConfigLoader {
    ConfigLoader::with_base_dir(PathBuf::from(dir.path()))
}

#[test]
fn loads_defaults_when_no_env_present() {
    let _guard = env_guard();
    clear_env();
    let temp_dir = TempDir::new().unwrap();

    let cfg = loader_for(&temp_dir)
        .load()
        .expect("config loads with defaults");

    assert_eq!(cfg.profile, "local");
    assert_eq!(cfg.api_bind_addr, "0.0.0.0:8080");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.jwt_expiration_hours, 24);
    assert!(!cfg.jwt_secret.is_empty(), "local profile gets a dev secret");
    assert!(cfg.mail.brevo_api_key.is_none());
    assert!(cfg.cors_allowed_origins.is_empty());
    cfg.bind_addr().expect("default bind addr parses");
    clear_env();
}

#[test]
fn layered_env_files_apply_in_order() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(
        &temp_dir,
        ".env",
        "RESTAURANT_API_BIND_ADDR=127.0.0.1:3000\nRESTAURANT_LOG_LEVEL=warn\n",
    );
    write_env_file(
        &temp_dir,
        ".env.test",
        "RESTAURANT_API_BIND_ADDR=192.168.0.10:5000\n",
    );
    write_env_file(
        &temp_dir,
        ".env.test.local",
        "RESTAURANT_API_BIND_ADDR=10.0.0.5:6000\n",
    );

    // Select profile via .env.local before profile-specific files load.
    write_env_file(
        &temp_dir,
        ".env.local",
        "RESTAURANT_PROFILE=test\nRESTAURANT_API_BIND_ADDR=127.0.0.1:4000\n",
    );

    let cfg = loader_for(&temp_dir)
        .load()
        .expect("config loads with layered env files");

    assert_eq!(cfg.profile, "test");
    assert_eq!(cfg.api_bind_addr, "10.0.0.5:6000");
    assert_eq!(cfg.log_level, "warn");
    clear_env();
}

#[test]
fn os_environment_has_highest_precedence() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(
        &temp_dir,
        ".env",
        "RESTAURANT_API_BIND_ADDR=127.0.0.1:3000\nRESTAURANT_MAIL_WELCOME_TEMPLATE_ID=7\n",
    );

    unsafe {
        env::set_var("RESTAURANT_API_BIND_ADDR", "0.0.0.0:9090");
        env::set_var("RESTAURANT_MAIL_WELCOME_TEMPLATE_ID", "12");
    }

    let cfg = loader_for(&temp_dir)
        .load()
        .expect("config loads with env override");
    assert_eq!(cfg.api_bind_addr, "0.0.0.0:9090");
    assert_eq!(cfg.mail.welcome_template_id, 12);

    clear_env();
}

#[test]
fn mail_bootstrap_and_cors_settings_are_read() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(
        &temp_dir,
        ".env",
        "RESTAURANT_BREVO_API_KEY=xkeysib-test\n\
         RESTAURANT_BOOTSTRAP_ADMIN_EMAIL=ops@platform.test\n\
         RESTAURANT_BOOTSTRAP_ADMIN_PASSWORD=S3cure-Start\n\
         RESTAURANT_CORS_ALLOWED_ORIGINS=https://app.example,,https://admin.example\n",
    );

    let cfg = loader_for(&temp_dir).load().expect("config loads");
    assert_eq!(cfg.mail.brevo_api_key.as_deref(), Some("xkeysib-test"));
    assert_eq!(cfg.bootstrap.admin_email, "ops@platform.test");
    assert_eq!(
        cfg.bootstrap.admin_password.as_deref(),
        Some("S3cure-Start")
    );
    assert_eq!(
        cfg.cors_allowed_origins,
        vec![
            "https://app.example".to_string(),
            "https://admin.example".to_string()
        ]
    );

    let redacted = cfg.redacted_json().unwrap();
    assert!(!redacted.contains("xkeysib-test"));
    assert!(!redacted.contains("S3cure-Start"));
    clear_env();
}

#[test]
fn production_profile_requires_jwt_secret() {
    let _guard = env_guard();
    clear_env();
    let temp_dir = TempDir::new().unwrap();

    unsafe {
        env::set_var("RESTAURANT_PROFILE", "production");
    }
    let err = loader_for(&temp_dir)
        .load()
        .expect_err("production without a secret fails");
    assert!(matches!(err, ConfigError::MissingJwtSecret));

    unsafe {
        env::set_var("RESTAURANT_JWT_SECRET", "too-short");
    }
    let err = loader_for(&temp_dir)
        .load()
        .expect_err("production with a short secret fails");
    assert!(matches!(err, ConfigError::WeakJwtSecret { length: 9 }));

    unsafe {
        env::set_var(
            "RESTAURANT_JWT_SECRET",
            "a-production-grade-secret-of-enough-length",
        );
    }
    let cfg = loader_for(&temp_dir).load().expect("long secret accepted");
    assert!(cfg.is_production());
    clear_env();
}

#[test]
fn invalid_bind_addr_returns_error() {
    let _guard = env_guard();
    clear_env();
    let temp_dir = TempDir::new().unwrap();

    unsafe {
        env::set_var("RESTAURANT_API_BIND_ADDR", "not-an-addr");
    }
    let err = loader_for(&temp_dir)
        .load()
        .expect_err("invalid bind addr should fail");
    assert!(format!("{}", err).contains("invalid api bind address"));

    clear_env();
}
