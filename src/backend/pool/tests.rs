use super::*;

fn unique_user(tag: &str) -> String {
    format!("pool-{}-{}", std::process::id(), tag)
}

#[test]
fn acquire_and_release_refcounts() {
    let user = unique_user("refs");
    let config = BackendConfig::local(&user);
    let key = config.pool_key();

    let first = acquire(&config).unwrap();
    assert_eq!(ref_count(&key), 1);

    let second = acquire(&config).unwrap();
    assert_eq!(ref_count(&key), 2);
    assert!(Arc::ptr_eq(&first, &second));

    assert!(!release(&key));
    assert_eq!(ref_count(&key), 1);

    assert!(release(&key));
    assert_eq!(ref_count(&key), 0);
    assert!(!first.connected());
}

#[test]
fn release_of_unknown_key_is_noop() {
    assert!(!release("nobody:local"));
}

#[test]
fn different_users_get_different_backends() {
    let config_a = BackendConfig::local(unique_user("iso-a"));
    let config_b = BackendConfig::local(unique_user("iso-b"));

    let a = acquire(&config_a).unwrap();
    let b = acquire(&config_b).unwrap();
    assert!(!Arc::ptr_eq(&a, &b));

    release(&config_a.pool_key());
    release(&config_b.pool_key());
}

#[test]
fn user_backends_filters_by_prefix() {
    let user = unique_user("bulk");
    let other = unique_user("bulk-other");

    let config = BackendConfig::local(&user);
    let other_config = BackendConfig::local(&other);
    acquire(&config).unwrap();
    acquire(&other_config).unwrap();

    let mine = user_backends(&user);
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].user_id(), user);

    release(&config.pool_key());
    release(&other_config.pool_key());
}

#[test]
fn cleanup_user_destroys_everything() {
    let user = unique_user("cleanup");
    let config = BackendConfig::local(&user);

    let backend = acquire(&config).unwrap();
    acquire(&config).unwrap();
    assert_eq!(ref_count(&config.pool_key()), 2);

    assert_eq!(cleanup_user(&user), 1);
    assert_eq!(ref_count(&config.pool_key()), 0);
    assert!(!backend.connected());
    assert!(user_backends(&user).is_empty());
}

#[test]
fn empty_user_id_fails_acquire() {
    let config = BackendConfig::local("");
    let err = acquire(&config).unwrap_err();
    assert_eq!(err.code(), "INVALID_CONFIGURATION");
}
