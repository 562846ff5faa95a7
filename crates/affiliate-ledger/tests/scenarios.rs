//! # Ledger Scenarios
//!
//! End-to-end runs through [`LedgerService`] over the in-memory chain.
//!
//! ## Test Categories
//!
//! 1. **Onboarding** - apply, allocate, deposits, claim, refuse
//! 2. **Partner lifecycle** - upgrade, suspend, quit, withdraw
//! 3. **Custody** - overdraft, random operation sequences
//! 4. **Administration** - evacuate, persistence

use affiliate_ledger::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;
use std::sync::Arc;

// =============================================================================
// TEST HELPERS
// =============================================================================

const START: Timestamp = 1_700_000_000_000;
const DAY: u64 = 86_400;

fn name(s: &str) -> AccountName {
    AccountName::new(s).unwrap()
}

fn eos(units: i64) -> Asset {
    Asset::new(units * 10_000, Symbol::EOS).unwrap()
}

fn signed(signers: &[&str]) -> BTreeSet<Authority> {
    signers.iter().map(|s| s.parse().unwrap()).collect()
}

fn admin() -> BTreeSet<Authority> {
    signed(&["affiliate"])
}

fn ttl() -> GlobalTtl {
    GlobalTtl {
        safeguard: 30 * DAY,
        application: 7 * DAY,
    }
}

fn public_terms() -> LicenseTerms {
    LicenseTerms {
        global_program: true,
        upgradable: true,
        ..LicenseTerms::default()
    }
}

struct Harness {
    service: LedgerService,
    chain: Arc<InMemoryChain>,
    clock: Arc<ManualClock>,
    config: LedgerConfig,
}

impl Harness {
    /// Initialized ledger with the usual cast of accounts.
    async fn new() -> Self {
        let config = LedgerConfig::default();
        let chain = Arc::new(InMemoryChain::with_accounts(&[
            config.ledger_account.clone(),
            config.custody_account.clone(),
            config.custodian_account.clone(),
            name("witness"),
            name("alice"),
            name("bob"),
            name("carol"),
        ]));
        chain.mark_contract(config.token_contract.clone());
        for account in ["alice", "bob", "carol"] {
            chain.issue(&name(account), eos(1_000));
        }

        let clock = Arc::new(ManualClock::new(START));
        let service = LedgerService::in_memory(config.clone(), chain.clone(), clock.clone());
        let harness = Self {
            service,
            chain,
            clock,
            config,
        };
        harness
            .admin(Action::Init {
                locked: eos(0),
                witness: "witness".parse().unwrap(),
                ttl: ttl(),
            })
            .await
            .unwrap();
        harness
    }

    async fn admin(&self, action: Action) -> LedgerResult<Receipt> {
        self.service.submit(admin(), action).await
    }

    async fn announce(&self, name: &str, fee: Asset, limit: RateLimit, terms: LicenseTerms) -> LicenseId {
        let receipt = self
            .admin(Action::Announce {
                name: name.to_string(),
                fee,
                rate: LicenseRate {
                    payer: RatePayer::Partner,
                    limit,
                },
                terms,
            })
            .await
            .unwrap();
        let Some(Created::License(id)) = receipt.created else {
            panic!("announce created {:?}", receipt.created);
        };
        self.admin(Action::Activate { license: id }).await.unwrap();
        id
    }

    /// Fixed 10% license with a 10 EOS fee.
    async fn starter(&self) -> LicenseId {
        self.announce("Starter", eos(10), RateLimit::Fixed { value: 0.1 }, public_terms())
            .await
    }

    /// Peer-to-peer broker license scoped to `scope`, paying out on claim.
    async fn broker_license(&self, scope: LicenseId) -> LicenseId {
        let terms = LicenseTerms {
            global_program: true,
            instant_payout: true,
            additionable: true,
            allowed_scope: vec![scope],
            ..LicenseTerms::default()
        };
        self.announce(
            "Broker",
            eos(0),
            RateLimit::PeerToPeer { from: 0.1, to: 0.3 },
            terms,
        )
        .await
    }

    /// Makes `account` a partner on `license` straight away.
    async fn allocate(&self, account: &str, license: LicenseId, rate: Option<Rate>, discount: Asset) {
        self.admin(Action::Allocate {
            partner: name(account),
            affiliate: None,
            license,
            rate,
            discount,
            broker: None,
            approved: true,
        })
        .await
        .unwrap();
    }

    /// `alice` applies to Starter through broker `bob`.
    async fn alice_applies(&self) -> (LicenseId, ApplicationId) {
        let starter = self.starter().await;
        let broker = self.broker_license(starter).await;
        self.allocate("bob", broker, None, eos(0)).await;

        let receipt = self
            .service
            .submit(
                signed(&["alice", "witness"]),
                Action::Apply {
                    account: name("alice"),
                    license: starter,
                    rate: Some(0.1),
                    discount: eos(0),
                    broker: BrokerRequest {
                        partner: BrokerCursor::Account(name("bob")),
                        root: None,
                        license: broker,
                        rate: 0.2,
                        suspended: false,
                    },
                },
            )
            .await
            .unwrap();
        let Some(Created::Application(id)) = receipt.created else {
            panic!("apply created {:?}", receipt.created);
        };
        (starter, id)
    }

    async fn deposit(&self, from: &str, quantity: Asset) -> LedgerResult<Receipt> {
        self.service
            .transfer(
                signed(&[from]),
                TransferRequest {
                    from: name(from),
                    to: self.config.custody_account.clone(),
                    quantity,
                    memo: String::new(),
                },
            )
            .await
    }

    fn balance(&self, account: &AccountName) -> i64 {
        self.chain.balance_of(account, Symbol::EOS).amount
    }

    async fn locked(&self) -> i64 {
        self.service.locked().await.unwrap().unwrap().amount
    }
}

// =============================================================================
// ONBOARDING
// =============================================================================

#[tokio::test]
async fn test_apply_through_peer_broker_sets_expiry() {
    let h = Harness::new().await;
    let (starter, id) = h.alice_applies().await;

    let application = h.service.application(&name("alice")).await.unwrap().unwrap();
    assert_eq!(application.id, id);
    assert_eq!(application.license, starter);
    assert_eq!(application.fee, eos(10));
    assert_eq!(application.deposit, eos(0));
    assert_eq!(application.eol, START + 7 * DAY * 1_000);
    assert_eq!(application.broker.map(|b| b.rate), Some(0.2));
}

#[tokio::test]
async fn test_apply_requires_witness() {
    let h = Harness::new().await;
    let starter = h.starter().await;
    let broker = h.broker_license(starter).await;
    h.allocate("bob", broker, None, eos(0)).await;

    let err = h
        .service
        .submit(
            signed(&["alice"]),
            Action::Apply {
                account: name("alice"),
                license: starter,
                rate: Some(0.1),
                discount: eos(0),
                broker: BrokerRequest {
                    partner: BrokerCursor::Account(name("bob")),
                    root: None,
                    license: broker,
                    rate: 0.2,
                    suspended: false,
                },
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::MissingWitness { .. }));
}

#[tokio::test]
async fn test_allocate_rate_outside_range_rejected() {
    let h = Harness::new().await;
    let pro = h
        .announce(
            "Pro",
            eos(20),
            RateLimit::Range { from: 0.05, to: 0.15 },
            public_terms(),
        )
        .await;

    let err = h
        .admin(Action::Allocate {
            partner: name("carol"),
            affiliate: None,
            license: pro,
            rate: Some(0.20),
            discount: eos(0),
            broker: None,
            approved: false,
        })
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::RateOutOfRange { from: 0.05, to: 0.15 });
    assert!(h.service.application(&name("carol")).await.unwrap().is_none());
}

#[tokio::test]
async fn test_claim_pays_broker_and_cannot_repeat() {
    let h = Harness::new().await;
    h.alice_applies().await;
    h.deposit("alice", eos(12)).await.unwrap();
    assert_eq!(h.locked().await, eos(12).amount);

    let receipt = h
        .service
        .submit(signed(&["alice"]), Action::Claim { partner: name("alice") })
        .await
        .unwrap();
    assert!(matches!(receipt.created, Some(Created::Partner(_))));
    assert_eq!(
        receipt.effects,
        vec![Effect::Transfer(TransferRequest {
            from: h.config.custody_account.clone(),
            to: name("bob"),
            quantity: eos(2),
            memo: "Affiliate program broker reward".to_string(),
        })]
    );

    let alice = h.service.partner(&name("alice")).await.unwrap().unwrap();
    assert_eq!(alice.balance, eos(2));
    assert_eq!(h.locked().await, eos(2).amount);
    assert_eq!(h.balance(&name("bob")), eos(1_002).amount);

    let err = h
        .service
        .submit(signed(&["alice"]), Action::Claim { partner: name("alice") })
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::ApplicationMissing);
    assert_eq!(err.to_string(), "application does not exist");
}

#[tokio::test]
async fn test_claim_short_deposit_rejected() {
    let h = Harness::new().await;
    h.alice_applies().await;
    h.deposit("alice", eos(4)).await.unwrap();

    let err = h
        .service
        .submit(signed(&["alice"]), Action::Claim { partner: name("alice") })
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::DepositNotEnough);
    assert!(h.service.application(&name("alice")).await.unwrap().is_some());
}

#[tokio::test]
async fn test_admin_refuse_waits_for_expiry() {
    let h = Harness::new().await;
    let (_, id) = h.alice_applies().await;
    h.deposit("alice", eos(3)).await.unwrap();

    let err = h
        .admin(Action::Refuse { application: id })
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::ApplicationNotExpired);

    h.clock.advance(7 * DAY * 1_000);
    let receipt = h.admin(Action::Refuse { application: id }).await.unwrap();
    assert!(receipt
        .effects
        .contains(&Effect::Notify { recipient: name("alice") }));
    assert_eq!(h.balance(&name("alice")), eos(1_000).amount);
    assert_eq!(h.locked().await, 0);
}

#[tokio::test]
async fn test_deposit_without_target_rejected() {
    let h = Harness::new().await;
    let err = h.deposit("carol", eos(5)).await.unwrap_err();

    assert_eq!(err, LedgerError::NoViableTarget);
    assert_eq!(h.balance(&name("carol")), eos(1_000).amount);
    assert_eq!(h.balance(&h.config.custody_account), 0);
}

#[tokio::test]
async fn test_memo_to_ledger_from_stranger_rejected() {
    let h = Harness::new().await;
    let err = h
        .service
        .on_transfer(TransferNotice {
            from: name("carol"),
            to: h.config.ledger_account.clone(),
            quantity: eos(1),
            memo: "hello".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::SpamMemo);
}

// =============================================================================
// PARTNER LIFECYCLE
// =============================================================================

#[tokio::test]
async fn test_upgrade_across_rate_shapes_rejected() {
    let h = Harness::new().await;
    let starter = h.starter().await;
    let pro = h
        .announce(
            "Pro",
            eos(20),
            RateLimit::Range { from: 0.05, to: 0.15 },
            public_terms(),
        )
        .await;
    h.allocate("alice", starter, Some(0.1), eos(10)).await;

    let err = h
        .service
        .submit(
            signed(&["alice", "witness"]),
            Action::Upgrade {
                partner: name("alice"),
                from: starter,
                to: pro,
                rate: Some(0.1),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::InconsistentRateLimits);
}

#[tokio::test]
async fn test_upgrade_charges_fee_difference() {
    let h = Harness::new().await;
    let starter = h.starter().await;
    let gold = h
        .announce("Gold", eos(15), RateLimit::Fixed { value: 0.2 }, public_terms())
        .await;
    h.allocate("alice", starter, Some(0.1), eos(10)).await;
    h.deposit("alice", eos(8)).await.unwrap();

    h.service
        .submit(
            signed(&["alice", "witness"]),
            Action::Upgrade {
                partner: name("alice"),
                from: starter,
                to: gold,
                rate: Some(0.2),
            },
        )
        .await
        .unwrap();

    let alice = h.service.partner(&name("alice")).await.unwrap().unwrap();
    assert!(alice.holds(gold));
    assert!(!alice.holds(starter));
    assert_eq!(alice.balance, eos(3));
    assert_eq!(h.locked().await, eos(3).amount);
}

#[tokio::test]
async fn test_claim_then_quit_refunds_balance() {
    let h = Harness::new().await;
    h.alice_applies().await;
    h.deposit("alice", eos(15)).await.unwrap();
    h.service
        .submit(signed(&["alice"]), Action::Claim { partner: name("alice") })
        .await
        .unwrap();

    let receipt = h
        .service
        .submit(signed(&["alice"]), Action::Quit { partner: name("alice") })
        .await
        .unwrap();
    assert_eq!(
        receipt.effects,
        vec![Effect::Transfer(TransferRequest {
            from: h.config.custody_account.clone(),
            to: name("alice"),
            quantity: eos(5),
            memo: "Affiliate program participation termination".to_string(),
        })]
    );

    let alice = h.service.partner(&name("alice")).await.unwrap().unwrap();
    assert!(alice.suspended);
    assert!(alice.contracts.is_empty());
    assert_eq!(alice.balance, eos(0));
    assert_eq!(h.locked().await, 0);
    assert_eq!(h.balance(&name("alice")), eos(1_000 - 15 + 5).amount);
}

#[tokio::test]
async fn test_redundant_suspend_and_resume() {
    let h = Harness::new().await;
    let starter = h.starter().await;
    h.allocate("bob", starter, Some(0.1), eos(10)).await;

    let resume = |reason: &str| Action::Resume {
        partner: name("bob"),
        deal: None,
        reason: reason.to_string(),
    };
    let suspend = |reason: &str| Action::Suspend {
        partner: name("bob"),
        deal: None,
        reason: reason.to_string(),
    };

    assert_eq!(h.admin(resume("ok")).await.unwrap_err(), LedgerError::Redundant);
    assert_eq!(h.admin(suspend("")).await.unwrap_err(), LedgerError::ReasonRequired);
    h.admin(suspend("fraud review")).await.unwrap();
    assert_eq!(
        h.admin(suspend("again")).await.unwrap_err(),
        LedgerError::Redundant
    );
    h.admin(resume("cleared")).await.unwrap();
}

#[tokio::test]
async fn test_withdraw_beyond_custody_is_overdraft() {
    let h = Harness::new().await;
    let starter = h.starter().await;
    h.allocate("alice", starter, Some(0.1), eos(10)).await;
    h.deposit("alice", eos(6)).await.unwrap();

    h.chain.set_balance(&h.config.custody_account, eos(3));
    let err = h
        .service
        .submit(
            signed(&["alice"]),
            Action::Withdraw {
                partner: name("alice"),
                payee: name("alice"),
                quantity: eos(5),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::Overdraft);

    let alice = h.service.partner(&name("alice")).await.unwrap().unwrap();
    assert_eq!(alice.balance, eos(6));
}

// =============================================================================
// CUSTODY
// =============================================================================

#[tokio::test]
async fn test_custody_cover_holds_after_random_operations() {
    let h = Harness::new().await;
    let starter = h.starter().await;
    h.allocate("alice", starter, Some(0.1), eos(10)).await;
    h.allocate("bob", starter, Some(0.1), eos(10)).await;

    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let who = if rng.gen_bool(0.5) { "alice" } else { "bob" };
        let quantity = eos(rng.gen_range(1..=20));
        let _ = match rng.gen_range(0..3) {
            0 => h.deposit(who, quantity).await,
            1 => {
                h.service
                    .submit(
                        signed(&[who]),
                        Action::Withdraw {
                            partner: name(who),
                            payee: name(who),
                            quantity,
                        },
                    )
                    .await
            }
            _ => {
                let saldo = if rng.gen_bool(0.5) {
                    quantity
                } else {
                    quantity.negated()
                };
                h.admin(Action::Sync {
                    accounts: vec![SyncEntry {
                        owner: name(who),
                        license: starter,
                        saldo,
                    }],
                })
                .await
            }
        };

        let state = h.service.snapshot().await.unwrap();
        assert!(check_all_invariants(&state).is_ok());
        let locked = state.config.as_ref().unwrap().locked.amount;
        assert!(locked >= 0);
    }
}

// =============================================================================
// ADMINISTRATION
// =============================================================================

#[tokio::test]
async fn test_evacuate_sweeps_and_uninitializes() {
    let h = Harness::new().await;
    h.chain.issue(&h.config.ledger_account, eos(5));

    let err = h
        .admin(Action::Evacuate {
            reason: " ".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::ReasonRequired);

    h.admin(Action::Evacuate {
        reason: "key compromise".to_string(),
    })
    .await
    .unwrap();
    assert_eq!(h.balance(&h.config.custodian_account), eos(5).amount);
    assert!(h.service.locked().await.unwrap().is_none());

    let err = h
        .service
        .submit(signed(&["alice"]), Action::Claim { partner: name("alice") })
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::NotInitialized);
}

#[tokio::test]
async fn test_migrate_rejects_unknown_and_redundant_versions() {
    let h = Harness::new().await;
    assert_eq!(
        h.admin(Action::Migrate { version: 0 }).await.unwrap_err(),
        LedgerError::Redundant
    );
    assert_eq!(
        h.admin(Action::Migrate { version: 9 }).await.unwrap_err(),
        LedgerError::UnknownVersion
    );
}

#[tokio::test]
async fn test_file_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("ledger.json");
    let config = LedgerConfig::default();
    let chain = Arc::new(InMemoryChain::with_accounts(&[
        config.ledger_account.clone(),
        name("witness"),
    ]));
    let clock: Arc<dyn TimeSource> = Arc::new(ManualClock::new(START));

    let open = || {
        LedgerService::new(
            config.clone(),
            Arc::new(JsonFileStateStore::new(&path)),
            chain.clone(),
            chain.clone(),
            clock.clone(),
        )
    };

    let first = open();
    first
        .submit(
            admin(),
            Action::Init {
                locked: eos(0),
                witness: "witness".parse().unwrap(),
                ttl: ttl(),
            },
        )
        .await
        .unwrap();
    first
        .submit(
            admin(),
            Action::Announce {
                name: "Starter".to_string(),
                fee: eos(10),
                rate: LicenseRate {
                    payer: RatePayer::Platform,
                    limit: RateLimit::Fixed { value: 0.1 },
                },
                terms: public_terms(),
            },
        )
        .await
        .unwrap();
    let before = first.snapshot().await.unwrap();

    let reopened = open();
    assert_eq!(reopened.snapshot().await.unwrap(), before);
    assert_eq!(
        reopened.license(LicenseId(0)).await.unwrap().map(|l| l.active),
        Some(false)
    );
}

#[tokio::test]
async fn test_stats_count_commits_and_rejections() {
    let h = Harness::new().await;
    let _ = h.admin(Action::Migrate { version: 0 }).await;
    h.starter().await;

    let stats = h.service.stats().await;
    assert_eq!(stats.committed, 3);
    assert_eq!(stats.rejected, 1);
}
