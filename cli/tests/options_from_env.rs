//! Layered configuration feeding the CLI's option resolution.

use std::io::Write;

use cli::{resolve, Overrides};
use config::GameDefaults;

#[test]
fn dotenv_values_become_session_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let mut f = std::fs::File::create(dir.path().join(".env")).unwrap();
    writeln!(f, "DEFAULT_MAX_STEPS=9").unwrap();
    writeln!(f, "MAX_DELAY=3").unwrap();
    writeln!(f, "QUESTLINE_BACKEND_URL=http://dotenv.example:8000").unwrap();
    drop(f);

    for key in ["DEFAULT_MAX_STEPS", "MAX_DELAY", "QUESTLINE_BACKEND_URL", "DEFAULT_DELAY"] {
        std::env::remove_var(key);
    }
    config::load_and_apply("questline-cli-options-test", Some(dir.path())).unwrap();

    let defaults = GameDefaults::from_env();
    let resolved = resolve(&defaults, &Overrides::default());
    assert_eq!(resolved.session.default_budget, 9);
    assert_eq!(resolved.settings.delay_secs, 2);
    assert_eq!(resolved.backend_url, "http://dotenv.example:8000");

    let flagged = resolve(
        &defaults,
        &Overrides {
            delay: Some(10),
            max_steps: Some(4),
            ..Default::default()
        },
    );
    assert_eq!(flagged.settings.delay_secs, 3);
    assert_eq!(flagged.session.default_budget, 4);
}
