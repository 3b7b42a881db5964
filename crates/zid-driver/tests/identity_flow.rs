use serde_json::json;
use zid_identity_core::{
    Context, Credentials, CredentialsType, Identity, IdentityError, PrivilegedPool,
    ManagerOptions, DEFAULT_SCHEMA_ID,
};

mod common;
use common::TestEnvironment;

fn new_identity(email: &str) -> Identity {
    let mut identity = Identity::new(DEFAULT_SCHEMA_ID).with_traits(json!({ "email": email }));
    identity.set_credentials(Credentials::new(
        CredentialsType::Password,
        vec![],
        json!({ "hashed_password": "$argon2id$v=19$m=65536,t=3,p=4$c2FsdA$aGFzaA" }),
    ));
    identity
}

#[tokio::test]
async fn test_registration_then_profile_edit() -> Result<(), Box<dyn std::error::Error>> {
    let env = TestEnvironment::start()?;
    let manager = &env.registry.identity_manager;
    let ctx = Context::background();

    let mut identity = new_identity("foo@example.com");
    manager
        .create(&ctx, &mut identity, ManagerOptions::default())
        .await?;

    let password = identity
        .get_credentials(&CredentialsType::Password)
        .ok_or("password credentials missing")?;
    assert_eq!(password.identifiers, vec!["foo@example.com".to_string()]);
    assert_eq!(identity.addresses().len(), 1);

    // Editing a non-protected trait passes the guard.
    manager
        .update_traits(
            &ctx,
            identity.id,
            json!({ "email": "foo@example.com", "name": "Foo" }).into(),
            ManagerOptions::default(),
        )
        .await?;

    let stored = env
        .registry
        .identity_pool
        .get_identity_confidential(identity.id)
        .await?;
    assert_eq!(stored.traits.pointer("/name"), Some(&json!("Foo")));
    assert_eq!(stored.credentials, identity.credentials);
    assert_eq!(stored.verifiable_addresses, identity.verifiable_addresses);

    Ok(())
}

#[tokio::test]
async fn test_email_change_requires_privilege() -> Result<(), Box<dyn std::error::Error>> {
    let env = TestEnvironment::start()?;
    let manager = &env.registry.identity_manager;
    let ctx = Context::background();

    let mut identity = new_identity("foo@example.com");
    manager
        .create(&ctx, &mut identity, ManagerOptions::default())
        .await?;

    let new_traits = json!({ "email": "bar@example.com" });
    let err = manager
        .update_traits(
            &ctx,
            identity.id,
            new_traits.clone().into(),
            ManagerOptions::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, IdentityError::ProtectedFieldModified));

    let stored = env
        .registry
        .identity_pool
        .get_identity_confidential(identity.id)
        .await?;
    assert_eq!(stored.traits.pointer("/email"), Some(&json!("foo@example.com")));

    manager
        .update_traits(&ctx, identity.id, new_traits.into(), ManagerOptions::privileged())
        .await?;

    let stored = env
        .registry
        .identity_pool
        .get_identity_confidential(identity.id)
        .await?;
    let password = stored
        .get_credentials(&CredentialsType::Password)
        .ok_or("password credentials missing")?;
    assert_eq!(password.identifiers, vec!["bar@example.com".to_string()]);
    assert_eq!(stored.addresses()[0].value, "bar@example.com");

    Ok(())
}

#[tokio::test]
async fn test_schema_violation_redacted_by_default() -> Result<(), Box<dyn std::error::Error>> {
    let env = TestEnvironment::start()?;
    let manager = &env.registry.identity_manager;
    let ctx = Context::background();

    let mut identity = Identity::new(DEFAULT_SCHEMA_ID).with_traits(json!({ "nickname": "x" }));
    let err = manager
        .create(&ctx, &mut identity, ManagerOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, IdentityError::BadRequest(_)));

    let err = manager
        .create(&ctx, &mut identity, ManagerOptions::exposing_validation_errors())
        .await
        .unwrap_err();
    match err {
        IdentityError::Validation(e) => assert!(!e.causes.is_empty()),
        other => panic!("expected structured validation error, got {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn test_refresh_verification_code() -> Result<(), Box<dyn std::error::Error>> {
    let env = TestEnvironment::start_with(&[("VERIFICATION_LINK_LIFESPAN_SECONDS", "600")])?;
    let manager = &env.registry.identity_manager;
    let ctx = Context::background();

    let mut identity = new_identity("foo@example.com");
    manager
        .create(&ctx, &mut identity, ManagerOptions::default())
        .await?;

    let mut address = identity.addresses()[0].clone();
    let old_code = address.code.clone();
    manager.refresh_verify_address(&ctx, &mut address).await?;

    assert_ne!(address.code, old_code);
    assert_eq!(address.code.len(), 32);
    let remaining = address.expires_at - chrono::Utc::now();
    assert!(remaining <= chrono::Duration::minutes(10));
    assert!(remaining > chrono::Duration::minutes(9));

    let stored = env
        .registry
        .identity_pool
        .get_verifiable_address(address.id)
        .await?;
    assert_eq!(stored.code, address.code);

    Ok(())
}
