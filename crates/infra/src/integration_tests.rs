//! Integration tests for the full request pipeline, minus HTTP.
//!
//! Tests: Identity → MutationDispatcher → InventoryLedger → InMemoryItemStore,
//! and CredentialIssuer → InMemoryCredentialStore / TokenSigner / notifier.
//!
//! Verifies:
//! - Purchases never oversell, sequentially or under contention
//! - Restocks are additive regardless of interleaving
//! - Role policy rejections leave the ledger untouched
//! - Login role checks and the password-reset exchange

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    use sweetshop_auth::{
        AccessGuard, Argon2PasswordHasher, CredentialIssuer, CredentialStore, Identity, NotifyError, ResetNotifier,
        Role, TokenSigner,
    };
    use sweetshop_core::{AccountId, DomainError, DomainResult, ItemId};
    use sweetshop_inventory::{
        InventoryCommand, InventoryItem, InventoryLedger, ItemPatch, ItemStore, NewItem, PurchaseOutcome,
    };

    use crate::command_dispatcher::{DispatchOutcome, MutationDispatcher};
    use crate::store::{InMemoryCredentialStore, InMemoryItemStore};

    const SECRET: &[u8] = b"integration-test-signing-secret";

    fn admin() -> Identity {
        Identity::new(AccountId::new(), Role::Admin)
    }

    fn user() -> Identity {
        Identity::new(AccountId::new(), Role::User)
    }

    fn setup() -> (MutationDispatcher, Arc<InMemoryItemStore>) {
        let store = Arc::new(InMemoryItemStore::new());
        let dispatcher = MutationDispatcher::new(InventoryLedger::new(store.clone()));
        (dispatcher, store)
    }

    fn ladoo(quantity: i64) -> NewItem {
        NewItem::new("Ladoo", "Traditional", Decimal::from(10)).with_quantity(quantity)
    }

    async fn create(dispatcher: &MutationDispatcher, input: NewItem) -> InventoryItem {
        match dispatcher
            .dispatch(&admin(), InventoryCommand::Create(input))
            .await
            .unwrap()
        {
            DispatchOutcome::Created(item) => item,
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    async fn purchase(dispatcher: &MutationDispatcher, id: ItemId) -> Result<InventoryItem, DomainError> {
        dispatcher
            .dispatch(&user(), InventoryCommand::Purchase { id })
            .await
            .map(|outcome| match outcome {
                DispatchOutcome::Updated(item) => item,
                other => panic!("unexpected outcome {other:?}"),
            })
    }

    async fn quantity_of(store: &InMemoryItemStore, id: ItemId) -> i64 {
        store.get(id).await.unwrap().unwrap().quantity
    }

    #[tokio::test]
    async fn ladoo_sells_out_after_two_purchases() {
        let (dispatcher, store) = setup();
        let item = create(&dispatcher, ladoo(2)).await;

        assert_eq!(purchase(&dispatcher, item.id).await.unwrap().quantity, 1);
        assert_eq!(purchase(&dispatcher, item.id).await.unwrap().quantity, 0);

        let err = purchase(&dispatcher, item.id).await.unwrap_err();
        assert_eq!(err, DomainError::conflict("Out of stock!"));
        assert_eq!(quantity_of(&store, item.id).await, 0);
    }

    #[tokio::test]
    async fn purchase_of_unknown_item_is_not_found() {
        let (dispatcher, _) = setup();
        let err = purchase(&dispatcher, ItemId::new()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_purchases_of_last_unit_yield_one_success() {
        let (dispatcher, store) = setup();
        let dispatcher = Arc::new(dispatcher);
        let item = create(&dispatcher, ladoo(1)).await;

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move { purchase(&dispatcher, item.id).await })
            })
            .collect();

        let mut successes = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(DomainError::Conflict(_)) => conflicts += 1,
                Err(other) => panic!("unexpected error {other:?}"),
            }
        }

        assert_eq!((successes, conflicts), (1, 1));
        assert_eq!(quantity_of(&store, item.id).await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn contended_purchases_never_oversell() {
        let (dispatcher, store) = setup();
        let dispatcher = Arc::new(dispatcher);
        let stock = 25;
        let callers = 64;
        let item = create(&dispatcher, ladoo(stock)).await;

        let handles: Vec<_> = (0..callers)
            .map(|_| {
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move { purchase(&dispatcher, item.id).await.is_ok() })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap() {
                successes += 1;
            }
        }

        assert_eq!(successes, stock.min(callers));
        assert_eq!(quantity_of(&store, item.id).await, (stock - successes).max(0));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn interleaved_restocks_are_additive() {
        let (dispatcher, store) = setup();
        let dispatcher = Arc::new(dispatcher);
        let item = create(&dispatcher, ladoo(3)).await;
        let amounts: Vec<i64> = (1..=20).collect();

        let handles: Vec<_> = amounts
            .iter()
            .map(|&amount| {
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move {
                    dispatcher
                        .dispatch(&admin(), InventoryCommand::Restock { id: item.id, amount })
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(quantity_of(&store, item.id).await, 3 + amounts.iter().sum::<i64>());
    }

    #[tokio::test]
    async fn user_cannot_restock_and_ledger_is_untouched() {
        let (dispatcher, store) = setup();
        let item = create(&dispatcher, ladoo(2)).await;

        let err = dispatcher
            .dispatch(&user(), InventoryCommand::Restock { id: item.id, amount: 5 })
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Forbidden(_)));
        assert_eq!(store.get(item.id).await.unwrap().unwrap(), item);
    }

    #[tokio::test]
    async fn users_are_forbidden_from_every_admin_operation() {
        let (dispatcher, store) = setup();
        let item = create(&dispatcher, ladoo(2)).await;

        let commands = vec![
            InventoryCommand::Create(ladoo(1)),
            InventoryCommand::UpdateFields {
                id: item.id,
                patch: ItemPatch {
                    name: Some("Peda".into()),
                    ..ItemPatch::default()
                },
            },
            InventoryCommand::Delete { id: item.id },
            // Unknown id: the policy check must still come first.
            InventoryCommand::Restock { id: ItemId::new(), amount: 1 },
        ];
        for command in commands {
            let err = dispatcher.dispatch(&user(), command).await.unwrap_err();
            assert!(matches!(err, DomainError::Forbidden(_)));
        }

        assert_eq!(store.list().await.unwrap(), vec![item]);
    }

    /// Stores prices at fixed two-place scale, the way a NUMERIC(12, 2) column does.
    struct CentScaleStore(InMemoryItemStore);

    #[async_trait]
    impl ItemStore for CentScaleStore {
        async fn list(&self) -> DomainResult<Vec<InventoryItem>> {
            self.0.list().await
        }
        async fn get(&self, id: ItemId) -> DomainResult<Option<InventoryItem>> {
            self.0.get(id).await
        }
        async fn insert(&self, mut item: InventoryItem) -> DomainResult<InventoryItem> {
            item.price.rescale(2);
            self.0.insert(item).await
        }
        async fn update_fields(&self, id: ItemId, patch: &ItemPatch) -> DomainResult<Option<InventoryItem>> {
            self.0.update_fields(id, patch).await
        }
        async fn increment_quantity(&self, id: ItemId, amount: i64) -> DomainResult<Option<InventoryItem>> {
            self.0.increment_quantity(id, amount).await
        }
        async fn decrement_if_in_stock(&self, id: ItemId) -> DomainResult<PurchaseOutcome> {
            self.0.decrement_if_in_stock(id).await
        }
        async fn delete(&self, id: ItemId) -> DomainResult<bool> {
            self.0.delete(id).await
        }
    }

    #[tokio::test]
    async fn create_answers_with_the_stored_row() {
        let store = Arc::new(CentScaleStore(InMemoryItemStore::new()));
        let dispatcher = MutationDispatcher::new(InventoryLedger::new(store.clone()));

        let item = create(&dispatcher, ladoo(2)).await;
        assert_eq!(item.price.to_string(), "10.00");
        assert_eq!(store.list().await.unwrap(), vec![item]);

        let err = dispatcher
            .dispatch(
                &admin(),
                InventoryCommand::Create(NewItem::new("Peda", "Milk", Decimal::new(5, 3))),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn users_may_list() {
        let (dispatcher, _) = setup();
        let item = create(&dispatcher, ladoo(2)).await;
        let outcome = dispatcher.dispatch(&user(), InventoryCommand::List).await.unwrap();
        assert_eq!(outcome, DispatchOutcome::Items(vec![item]));
    }

    #[tokio::test]
    async fn negative_quantity_update_is_rejected_and_stock_unchanged() {
        let (dispatcher, store) = setup();
        let item = create(&dispatcher, ladoo(2)).await;

        let err = dispatcher
            .dispatch(
                &admin(),
                InventoryCommand::UpdateFields {
                    id: item.id,
                    patch: ItemPatch {
                        quantity: Some(-1),
                        ..ItemPatch::default()
                    },
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(quantity_of(&store, item.id).await, 2);
    }

    #[tokio::test]
    async fn update_applies_only_provided_fields() {
        let (dispatcher, _) = setup();
        let item = create(&dispatcher, ladoo(2)).await;

        let outcome = dispatcher
            .dispatch(
                &admin(),
                InventoryCommand::UpdateFields {
                    id: item.id,
                    patch: ItemPatch {
                        category: Some("Festive".into()),
                        quantity: Some(9),
                        ..ItemPatch::default()
                    },
                },
            )
            .await
            .unwrap();

        let DispatchOutcome::Updated(updated) = outcome else {
            panic!("unexpected outcome");
        };
        assert_eq!(updated.name, "Ladoo");
        assert_eq!(updated.category, "Festive");
        assert_eq!(updated.price, Decimal::from(10));
        assert_eq!(updated.quantity, 9);
    }

    #[tokio::test]
    async fn restock_rejects_non_positive_amounts() {
        let (dispatcher, store) = setup();
        let item = create(&dispatcher, ladoo(2)).await;

        for amount in [0, -4] {
            let err = dispatcher
                .dispatch(&admin(), InventoryCommand::Restock { id: item.id, amount })
                .await
                .unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)));
        }
        assert_eq!(quantity_of(&store, item.id).await, 2);

        let err = dispatcher
            .dispatch(&admin(), InventoryCommand::Restock { id: ItemId::new(), amount: 1 })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_removes_item_and_second_delete_is_not_found() {
        let (dispatcher, store) = setup();
        let item = create(&dispatcher, ladoo(2)).await;

        let outcome = dispatcher
            .dispatch(&admin(), InventoryCommand::Delete { id: item.id })
            .await
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::Deleted(item.id));
        assert!(store.get(item.id).await.unwrap().is_none());

        let err = dispatcher
            .dispatch(&admin(), InventoryCommand::Delete { id: item.id })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn purchase_sequences_succeed_exactly_min_n_calls(stock in 0i64..20, calls in 0usize..40) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let (successes, conflicts, remaining) = rt.block_on(async {
                let (dispatcher, store) = setup();
                let item = create(&dispatcher, ladoo(stock)).await;
                let mut successes = 0i64;
                let mut conflicts = 0i64;
                for _ in 0..calls {
                    match purchase(&dispatcher, item.id).await {
                        Ok(_) => successes += 1,
                        Err(DomainError::Conflict(_)) => conflicts += 1,
                        Err(other) => panic!("unexpected error {other:?}"),
                    }
                }
                (successes, conflicts, quantity_of(&store, item.id).await)
            });

            prop_assert_eq!(successes, stock.min(calls as i64));
            prop_assert_eq!(conflicts, calls as i64 - successes);
            prop_assert_eq!(remaining, (stock - successes).max(0));
        }

        #[test]
        fn two_restocks_equal_one_combined(start in 0i64..1_000, a in 1i64..1_000, b in 1i64..1_000) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let (split, combined) = rt.block_on(async {
                let (dispatcher, store) = setup();
                let first = create(&dispatcher, ladoo(start)).await;
                let second = create(&dispatcher, ladoo(start)).await;

                for amount in [a, b] {
                    dispatcher.dispatch(&admin(), InventoryCommand::Restock { id: first.id, amount }).await.unwrap();
                }
                dispatcher
                    .dispatch(&admin(), InventoryCommand::Restock { id: second.id, amount: a + b })
                    .await
                    .unwrap();

                (quantity_of(&store, first.id).await, quantity_of(&store, second.id).await)
            });

            prop_assert_eq!(split, combined);
            prop_assert_eq!(split, start + a + b);
        }
    }

    // ---- Credential Issuer ----

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<(String, String, String)>>,
    }

    impl RecordingNotifier {
        fn last_token(&self) -> Option<String> {
            let sent = self.sent.lock().unwrap();
            let (_, _, body) = sent.last()?;
            body.lines()
                .find(|line| line.starts_with("http"))
                .and_then(|link| link.rsplit('/').next())
                .map(str::to_string)
        }
    }

    #[async_trait]
    impl ResetNotifier for RecordingNotifier {
        async fn notify(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
            self.sent
                .lock()
                .unwrap()
                .push((recipient.to_string(), subject.to_string(), body.to_string()));
            Ok(())
        }
    }

    struct FailingNotifier;

    #[async_trait]
    impl ResetNotifier for FailingNotifier {
        async fn notify(&self, _: &str, _: &str, _: &str) -> Result<(), NotifyError> {
            Err(NotifyError::Delivery("smtp down".into()))
        }
    }

    struct Auth {
        issuer: CredentialIssuer,
        store: Arc<InMemoryCredentialStore>,
        signer: Arc<TokenSigner>,
    }

    fn auth_with(notifier: Arc<dyn ResetNotifier>) -> Auth {
        let store = Arc::new(InMemoryCredentialStore::new());
        let signer = Arc::new(TokenSigner::new(SECRET).unwrap());
        let issuer = CredentialIssuer::new(
            store.clone(),
            Arc::new(Argon2PasswordHasher::new()),
            signer.clone(),
            notifier,
        )
        .with_reset_link_base("http://shop.test/reset-password");
        Auth { issuer, store, signer }
    }

    #[tokio::test]
    async fn register_normalises_role() {
        let auth = auth_with(Arc::new(RecordingNotifier::default()));
        assert_eq!(
            auth.issuer.register("Asha", "asha@x.io", "pw", Some("ADMIN")).await.unwrap(),
            Role::Admin
        );
        assert_eq!(
            auth.issuer.register("Ben", "ben@x.io", "pw", Some("superuser")).await.unwrap(),
            Role::User
        );
        assert_eq!(auth.issuer.register("Cy", "cy@x.io", "pw", None).await.unwrap(), Role::User);
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts_without_creating_account() {
        let auth = auth_with(Arc::new(RecordingNotifier::default()));
        auth.issuer.register("Asha", "asha@x.io", "pw", None).await.unwrap();

        let err = auth
            .issuer
            .register("Other", "asha@x.io", "pw2", Some("admin"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(auth.store.len(), 1);
    }

    #[tokio::test]
    async fn register_requires_all_fields() {
        let auth = auth_with(Arc::new(RecordingNotifier::default()));
        for (name, email, password) in [("", "a@x.io", "pw"), ("A", " ", "pw"), ("A", "a@x.io", "")] {
            let err = auth.issuer.register(name, email, password, None).await.unwrap_err();
            assert_eq!(err, DomainError::validation("All fields are required."));
        }
        assert!(auth.store.is_empty());
    }

    #[tokio::test]
    async fn login_issues_session_token_accepted_by_guard() {
        let auth = auth_with(Arc::new(RecordingNotifier::default()));
        auth.issuer.register("Asha", "asha@x.io", "pw", Some("admin")).await.unwrap();

        let now = Utc::now();
        let session = auth.issuer.login("asha@x.io", "pw", "admin", now).await.unwrap();
        assert_eq!(session.role, Role::Admin);
        assert_eq!(session.display_name, "Asha");

        let guard = AccessGuard::new(auth.signer.clone());
        let header = format!("Bearer {}", session.token);
        let identity = guard.authenticate(Some(&header), now + Duration::minutes(119)).unwrap();
        assert_eq!(identity.role, Role::Admin);
        assert!(guard.authenticate(Some(&header), now + Duration::minutes(121)).is_err());
    }

    #[tokio::test]
    async fn login_with_wrong_role_is_forbidden() {
        let auth = auth_with(Arc::new(RecordingNotifier::default()));
        auth.issuer.register("Ben", "ben@x.io", "pw", None).await.unwrap();

        let err = auth.issuer.login("ben@x.io", "pw", "admin", Utc::now()).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn unknown_email_and_bad_password_look_the_same() {
        let auth = auth_with(Arc::new(RecordingNotifier::default()));
        auth.issuer.register("Ben", "ben@x.io", "pw", None).await.unwrap();

        let unknown = auth.issuer.login("nobody@x.io", "pw", "user", Utc::now()).await.unwrap_err();
        let wrong = auth.issuer.login("ben@x.io", "nope", "user", Utc::now()).await.unwrap_err();
        assert_eq!(unknown, wrong);
        assert!(matches!(unknown, DomainError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn password_reset_round_trip() {
        let notifier = Arc::new(RecordingNotifier::default());
        let auth = auth_with(notifier.clone());
        auth.issuer.register("Asha", "asha@x.io", "old-pw", None).await.unwrap();

        let now = Utc::now();
        auth.issuer.request_password_reset("asha@x.io", now).await.unwrap();
        {
            let sent = notifier.sent.lock().unwrap();
            assert_eq!(sent.len(), 1);
            assert_eq!(sent[0].0, "asha@x.io");
            assert_eq!(sent[0].1, "Password Reset - Sweet Shop");
            assert!(sent[0].2.contains("http://shop.test/reset-password/"));
        }
        let token = notifier.last_token().unwrap();

        auth.issuer
            .complete_password_reset(&token, "new-pw", now + Duration::minutes(5))
            .await
            .unwrap();

        assert!(auth.issuer.login("asha@x.io", "old-pw", "user", now).await.is_err());
        assert!(auth.issuer.login("asha@x.io", "new-pw", "user", now).await.is_ok());
    }

    #[tokio::test]
    async fn expired_or_forged_reset_tokens_are_rejected() {
        let notifier = Arc::new(RecordingNotifier::default());
        let auth = auth_with(notifier.clone());
        auth.issuer.register("Asha", "asha@x.io", "pw", None).await.unwrap();

        let now = Utc::now();
        auth.issuer.request_password_reset("asha@x.io", now).await.unwrap();
        let token = notifier.last_token().unwrap();

        let late = auth
            .issuer
            .complete_password_reset(&token, "new-pw", now + Duration::minutes(16))
            .await
            .unwrap_err();
        assert!(matches!(late, DomainError::Validation(_)));

        let forged = auth
            .issuer
            .complete_password_reset("not.a.token", "new-pw", now)
            .await
            .unwrap_err();
        assert!(matches!(forged, DomainError::Validation(_)));

        let empty = auth.issuer.complete_password_reset(&token, "", now).await.unwrap_err();
        assert_eq!(empty, DomainError::validation("New password is required."));
    }

    #[tokio::test]
    async fn session_token_cannot_reset_password() {
        let auth = auth_with(Arc::new(RecordingNotifier::default()));
        auth.issuer.register("Asha", "asha@x.io", "pw", None).await.unwrap();
        let now = Utc::now();
        let session = auth.issuer.login("asha@x.io", "pw", "user", now).await.unwrap();

        let err = auth
            .issuer
            .complete_password_reset(&session.token, "new-pw", now)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn reset_request_for_unknown_email_succeeds_silently() {
        let notifier = Arc::new(RecordingNotifier::default());
        let auth = auth_with(notifier.clone());

        auth.issuer.request_password_reset("ghost@x.io", Utc::now()).await.unwrap();
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn notifier_failure_does_not_fail_reset_request() {
        let auth = auth_with(Arc::new(FailingNotifier));
        auth.issuer.register("Asha", "asha@x.io", "pw", None).await.unwrap();

        auth.issuer.request_password_reset("asha@x.io", Utc::now()).await.unwrap();
        assert!(auth.store.find_by_email("asha@x.io").await.unwrap().is_some());
    }
}
