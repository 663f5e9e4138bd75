mod common;

use std::sync::Arc;

use common::{FlakyFolders, Fixture};
use edm_admin::models::{Role, UserInput};
use edm_admin::services::{CompanyDeletion, CreateCompanyRequest, OperationKey, UpdateCompanyRequest};
use edm_admin::store::{AreaStore, CompanyStore, MemoryFolderStore};
use edm_admin::AdminError;
use edm_admin::models::DirectoryUser;

#[tokio::test]
async fn test_create_company_assigns_admin_and_folder() {
    let fx = Fixture::new().await;
    let refresh_before = fx.ctx.refresh.current();

    let company = fx.create_company("Acme", "Boss@Acme.com").await;

    assert_eq!(company.name, "Acme");
    assert_eq!(company.admin_email, "boss@acme.com");
    let boss = fx.user("boss@acme.com").await.unwrap();
    assert_eq!(boss.role, Role::CompanyAdmin);
    assert_eq!(boss.company_name.as_deref(), Some("Acme"));
    assert!(fx.folder(&["Acme"]).await.is_some());
    assert_eq!(fx.ctx.refresh.current(), refresh_before + 1);
    assert!(!fx.companies.status().current().loading);
}

#[tokio::test]
async fn test_admin_of_another_company_is_rejected() {
    let fx = Fixture::new().await;
    fx.create_company("Acme", "boss@acme.com").await;

    let err = fx
        .companies
        .create(CreateCompanyRequest {
            name: "Globex".to_string(),
            admin: Some(DirectoryUser::new("Boss", "boss@acme.com")),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AdminError::RoleRejected { .. }));
    assert_eq!(fx.backend.companies.list().await.unwrap().len(), 1);
    assert!(fx.folder(&["Globex"]).await.is_none());
    assert_eq!(
        fx.companies.status().current().error.as_deref(),
        Some(err.user_message().as_str())
    );
}

#[tokio::test]
async fn test_general_admin_cannot_administer_a_company() {
    let fx = Fixture::new().await;
    let err = fx
        .companies
        .create(CreateCompanyRequest {
            name: "Acme".to_string(),
            admin: Some(DirectoryUser::new("Root", common::ROOT)),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::RoleRejected { .. }));
}

#[tokio::test]
async fn test_duplicate_name_is_rejected_ignoring_accents() {
    let fx = Fixture::new().await;
    fx.create_company("Compañía Andina", "boss@andina.com").await;

    let err = fx
        .companies
        .create(CreateCompanyRequest {
            name: "compania andina".to_string(),
            admin: Some(DirectoryUser::new("Other", "other@andina.com")),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::Validation(_)));
}

#[tokio::test]
async fn test_delete_without_associations_is_immediate() {
    let fx = Fixture::new().await;
    let company = fx.raw_company("Solo").await;

    let outcome = fx.companies.delete(&company.id, false).await.unwrap();

    assert_eq!(
        outcome,
        CompanyDeletion::Deleted {
            company: "Solo".to_string(),
            users_reset: 0
        }
    );
    assert!(fx.backend.companies.get(&company.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_with_users_asks_first_then_resets_them() {
    let fx = Fixture::new().await;
    let company = fx.create_company("Acme", "boss@acme.com").await;
    fx.put_user(UserInput::company_admin("Deputy", "deputy@acme.com", "Acme")).await;

    let first = fx.companies.delete(&company.id, false).await.unwrap();
    assert_eq!(
        first,
        CompanyDeletion::ConfirmationRequired {
            company: "Acme".to_string(),
            users: vec!["boss@acme.com".to_string(), "deputy@acme.com".to_string()],
        }
    );
    // Nothing changed yet
    assert!(fx.backend.companies.get(&company.id).await.unwrap().is_some());
    assert_eq!(fx.user("boss@acme.com").await.unwrap().role, Role::CompanyAdmin);
    assert!(fx.companies.status().current().confirmation_pending);

    let second = fx.companies.delete(&company.id, true).await.unwrap();
    assert_eq!(
        second,
        CompanyDeletion::Deleted {
            company: "Acme".to_string(),
            users_reset: 2
        }
    );
    for email in ["boss@acme.com", "deputy@acme.com"] {
        let user = fx.user(email).await.unwrap();
        assert_eq!(user.role, Role::NoAccess);
        assert!(user.company_name.is_none());
        assert!(user.area_name.is_none());
    }
    assert!(fx.backend.companies.get(&company.id).await.unwrap().is_none());
    assert!(fx.folder(&["Acme"]).await.is_none());
    assert!(!fx.companies.status().current().confirmation_pending);
}

#[tokio::test]
async fn test_confirmed_call_without_prior_request_still_asks() {
    let fx = Fixture::new().await;
    let company = fx.create_company("Acme", "boss@acme.com").await;

    let outcome = fx.companies.delete(&company.id, true).await.unwrap();
    assert!(matches!(outcome, CompanyDeletion::ConfirmationRequired { .. }));
    assert!(fx.backend.companies.get(&company.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_changed_user_set_requires_new_confirmation() {
    let fx = Fixture::new().await;
    let company = fx.create_company("Acme", "boss@acme.com").await;
    fx.companies.delete(&company.id, false).await.unwrap();

    // Someone joins between the two calls
    fx.put_user(UserInput::company_admin("Late", "late@acme.com", "Acme")).await;

    let outcome = fx.companies.delete(&company.id, true).await.unwrap();
    match outcome {
        CompanyDeletion::ConfirmationRequired { users, .. } => assert_eq!(users.len(), 2),
        other => panic!("expected a new confirmation, got {:?}", other),
    }
    assert_eq!(fx.user("late@acme.com").await.unwrap().role, Role::CompanyAdmin);

    let outcome = fx.companies.delete(&company.id, true).await.unwrap();
    assert!(matches!(outcome, CompanyDeletion::Deleted { users_reset: 2, .. }));
}

#[tokio::test]
async fn test_company_with_areas_is_never_deleted() {
    let fx = Fixture::new().await;
    let company = fx.create_company("Acme", "boss@acme.com").await;
    fx.companies.delete(&company.id, false).await.unwrap();
    fx.raw_area("Acme", "Ventas").await;

    for confirmed in [true, false, true] {
        let err = fx.companies.delete(&company.id, confirmed).await.unwrap_err();
        assert!(matches!(err, AdminError::CompanyHasAreas { count: 1, .. }));
    }
    assert!(fx.backend.companies.get(&company.id).await.unwrap().is_some());
    assert_eq!(fx.user("boss@acme.com").await.unwrap().role, Role::CompanyAdmin);
}

#[tokio::test]
async fn test_rename_cascades_to_areas_users_and_folder() {
    let fx = Fixture::new().await;
    let company = fx.create_company("Acme", "boss@acme.com").await;
    let ventas = fx.create_area("Acme", "Ventas", Some("rosa@acme.com")).await;
    fx.put_user(UserInput::area_member("Ana", "ana@acme.com", "Acme", "Ventas")).await;

    let updated = fx
        .companies
        .update(
            &company.id,
            UpdateCompanyRequest {
                name: "Acme Corp".to_string(),
                admin: Some(DirectoryUser::new("Boss", "boss@acme.com")),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "Acme Corp");
    let stored = fx.backend.companies.get(&company.id).await.unwrap().unwrap();
    assert_eq!(stored.name, "Acme Corp");
    let area = fx.backend.areas.get(&ventas.id).await.unwrap().unwrap();
    assert_eq!(area.company_name, "Acme Corp");
    for email in ["boss@acme.com", "rosa@acme.com", "ana@acme.com"] {
        assert_eq!(
            fx.user(email).await.unwrap().company_name.as_deref(),
            Some("Acme Corp"),
            "{}",
            email
        );
    }
    assert_eq!(fx.user("ana@acme.com").await.unwrap().area_name.as_deref(), Some("Ventas"));
    assert!(fx.folder(&["Acme"]).await.is_none());
    assert!(fx.folder(&["Acme Corp", "Ventas"]).await.is_some());
}

#[tokio::test]
async fn test_rename_with_missing_folder_still_succeeds() {
    let fx = Fixture::new().await;
    let company = fx.raw_company("Acme").await;
    fx.put_user(UserInput::company_admin("Boss", "boss@acme.com", "Acme")).await;

    let updated = fx
        .companies
        .update(
            &company.id,
            UpdateCompanyRequest {
                name: "Acme Corp".to_string(),
                admin: Some(DirectoryUser::new("Boss", "boss@acme.com")),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "Acme Corp");
    assert!(fx.folder(&["Acme Corp"]).await.is_none());
}

#[tokio::test]
async fn test_admin_change_demotes_previous_admin() {
    let fx = Fixture::new().await;
    let company = fx.create_company("Acme", "boss@acme.com").await;

    fx.companies
        .update(
            &company.id,
            UpdateCompanyRequest {
                name: "Acme".to_string(),
                admin: Some(DirectoryUser::new("New Boss", "new@acme.com")),
            },
        )
        .await
        .unwrap();

    let old = fx.user("boss@acme.com").await.unwrap();
    assert_eq!(old.role, Role::NoAccess);
    assert!(old.company_name.is_none());
    let new = fx.user("new@acme.com").await.unwrap();
    assert_eq!(new.role, Role::CompanyAdmin);
    let stored = fx.backend.companies.get(&company.id).await.unwrap().unwrap();
    assert_eq!(stored.admin_email, "new@acme.com");
}

#[tokio::test]
async fn test_folder_failure_after_records_reports_partial_failure() {
    let folders = Arc::new(FlakyFolders::new(Arc::new(MemoryFolderStore::new())));
    let fx = Fixture::with_folders(folders.clone()).await;
    folders.break_now();

    let err = fx
        .companies
        .create(CreateCompanyRequest {
            name: "Acme".to_string(),
            admin: Some(DirectoryUser::new("Boss", "boss@acme.com")),
        })
        .await
        .unwrap_err();

    let AdminError::PartialFailure(failure) = err else {
        panic!("expected a partial failure, got {:?}", err);
    };
    assert_eq!(failure.failed_step, "create company folder");
    let completed: Vec<&str> = failure.completed.iter().map(|s| s.step.as_str()).collect();
    assert_eq!(completed, vec!["assign company administrator", "create company record"]);
    // Applied steps stay applied
    assert_eq!(fx.backend.companies.list().await.unwrap().len(), 1);
    assert_eq!(fx.user("boss@acme.com").await.unwrap().role, Role::CompanyAdmin);
}

#[tokio::test]
async fn test_failure_before_any_step_is_returned_as_is() {
    let folders = Arc::new(FlakyFolders::new(Arc::new(MemoryFolderStore::new())));
    let fx = Fixture::with_folders(folders.clone()).await;
    let company = fx.raw_company("Solo").await;

    // Create the folder while the store works, then break it
    let drive = fx.ctx.library.drive_id().await.unwrap();
    fx.ctx.folders.ensure_company(&drive, "Solo").await.unwrap();
    folders.break_now();

    let err = fx.companies.delete(&company.id, false).await.unwrap_err();
    assert!(matches!(err, AdminError::Transport(_)));
    assert!(fx.backend.companies.get(&company.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_duplicate_invocation_is_rejected_while_in_flight() {
    let fx = Fixture::new().await;
    let _held = fx.ctx.guard.acquire(OperationKey::company("ACME")).unwrap();

    let err = fx
        .companies
        .create(CreateCompanyRequest {
            name: "Acme".to_string(),
            admin: Some(DirectoryUser::new("Boss", "boss@acme.com")),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AdminError::OperationInProgress { .. }));
    assert!(fx.backend.companies.list().await.unwrap().is_empty());
    assert!(fx.user("boss@acme.com").await.is_none());
}
