//! Replays the bundled demo session end to end.

use affiliate_ledger::ports::inbound::LedgerApi;
use affiliate_ledger::ports::outbound::ChainHost;
use ledger_runtime::{run_script, seed_chain, LedgerContainer, RuntimeConfig, Script};
use shared_types::{AccountName, Symbol};

const DEMO: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../demos/session.json"));

fn account(name: &str) -> AccountName {
    AccountName::new(name).unwrap()
}

fn config_in(dir: &tempfile::TempDir) -> RuntimeConfig {
    RuntimeConfig {
        state_path: dir.path().join("ledger.json"),
        ..RuntimeConfig::default()
    }
}

#[tokio::test]
async fn test_demo_session_replays() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    let script = Script::from_json(DEMO).unwrap();

    let container = LedgerContainer::build(&config, script.start_time);
    seed_chain(&container, &script);
    let reports = run_script(&container, &script).await.unwrap();

    assert_eq!(reports.len(), script.steps.len());
    let rejected: Vec<_> = reports.iter().filter(|r| !r.is_ok()).collect();
    assert_eq!(rejected.len(), 1, "unexpected rejections: {rejected:?}");
    assert_eq!(rejected[0].step, "claim");
    assert_eq!(
        rejected[0].error.as_deref(),
        Some("application does not exist")
    );

    let eos = Symbol::EOS;
    assert_eq!(container.chain.balance_of(&account("alice"), eos).amount, 400_000);
    assert_eq!(container.chain.balance_of(&account("bob"), eos).amount, 20_000);
    assert_eq!(
        container
            .chain
            .balance_of(&config.ledger.custody_account, eos)
            .amount,
        80_000
    );

    let locked = container.service.locked().await.unwrap().unwrap();
    assert_eq!(locked.amount, 0);

    let alice = container.service.partner(&account("alice")).await.unwrap().unwrap();
    assert!(alice.suspended);
    assert!(alice.contracts.is_empty());
}

#[tokio::test]
async fn test_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    let script = Script::from_json(DEMO).unwrap();

    {
        let container = LedgerContainer::build(&config, script.start_time);
        seed_chain(&container, &script);
        run_script(&container, &script).await.unwrap();
    }

    let restarted = LedgerContainer::build(&config, script.start_time);
    let state = restarted.service.snapshot().await.unwrap();
    assert!(state.is_initialized());
    assert_eq!(state.licenses.len(), 2);
    assert_eq!(state.partners.len(), 2);
    assert!(state.applications.is_empty());
}
