//! Fixtures shared by the unit tests of the domain modules.

use crate::adapters::InMemoryChain;
use crate::config::LedgerConfig;
use crate::domain::effects::{Created, Outcome};
use crate::domain::entities::{BrokerRequest, GlobalTtl, LicenseTerms, Partner};
use crate::domain::ledger::{ActionContext, Ledger};
use crate::domain::state::LedgerState;
use crate::domain::value_objects::{
    BrokerCursor, LicenseId, LicenseRate, Rate, RateLimit, RatePayer,
};
use crate::errors::LedgerResult;
use crate::ports::inbound::Action;
use shared_types::{AccountName, Asset, Authority, Symbol, Timestamp, TransferNotice};
use std::collections::BTreeSet;

pub const START: Timestamp = 1_700_000_000_000;
pub const DAY: u64 = 86_400;

pub fn name(s: &str) -> AccountName {
    AccountName::new(s).unwrap()
}

/// `units` whole EOS.
pub fn eos(units: i64) -> Asset {
    Asset::new(units * 10_000, Symbol::EOS).unwrap()
}

pub fn signed(signers: &[&str]) -> BTreeSet<Authority> {
    signers.iter().map(|s| s.parse().unwrap()).collect()
}

pub fn ttl() -> GlobalTtl {
    GlobalTtl {
        safeguard: 30 * DAY,
        application: 7 * DAY,
    }
}

pub fn public_terms() -> LicenseTerms {
    LicenseTerms {
        global_program: true,
        upgradable: true,
        ..LicenseTerms::default()
    }
}

pub fn broker_request(account: &str, license: LicenseId, rate: Rate) -> BrokerRequest {
    BrokerRequest {
        partner: BrokerCursor::Account(name(account)),
        root: None,
        license,
        rate,
        suspended: false,
    }
}

/// Working state plus the chain it runs against. A failed operation leaves
/// the state untouched.
pub struct Fixture {
    pub state: LedgerState,
    pub settings: LedgerConfig,
    pub chain: InMemoryChain,
    pub now: Timestamp,
}

impl Fixture {
    /// Uninitialized ledger; the usual accounts exist on the chain.
    pub fn bare() -> Self {
        let settings = LedgerConfig::default();
        let chain = InMemoryChain::with_accounts(&[
            settings.ledger_account.clone(),
            settings.custody_account.clone(),
            settings.custodian_account.clone(),
            name("witness"),
            name("alice"),
            name("bob"),
            name("carol"),
            name("dave"),
        ]);
        chain.mark_contract(settings.token_contract.clone());
        Self {
            state: LedgerState::default(),
            settings,
            chain,
            now: START,
        }
    }

    /// Initialized ledger with `witness` as witness.
    pub fn new() -> Self {
        let mut fixture = Self::bare();
        fixture
            .admin(Action::Init {
                locked: eos(0),
                witness: "witness".parse().unwrap(),
                ttl: ttl(),
            })
            .unwrap();
        fixture
    }

    pub fn run(&mut self, signers: &[&str], action: Action) -> LedgerResult<Outcome> {
        let mut working = self.state.clone();
        let ctx = ActionContext::new(signed(signers), self.now);
        let outcome =
            Ledger::new(&mut working, &self.settings, &self.chain, &ctx).execute(action)?;
        self.state = working;
        Ok(outcome)
    }

    pub fn admin(&mut self, action: Action) -> LedgerResult<Outcome> {
        self.run(&["affiliate"], action)
    }

    pub fn notice(&mut self, notice: &TransferNotice) -> LedgerResult<Outcome> {
        let mut working = self.state.clone();
        let ctx = ActionContext::new(BTreeSet::new(), self.now);
        let outcome =
            Ledger::new(&mut working, &self.settings, &self.chain, &ctx).on_transfer(notice)?;
        self.state = working;
        Ok(outcome)
    }

    /// Runs `f` on a ledger over the current state, signed by `signers`.
    pub fn with_ledger<R>(&mut self, signers: &[&str], f: impl FnOnce(Ledger<'_>) -> R) -> R {
        let ctx = ActionContext::new(signed(signers), self.now);
        f(Ledger::new(&mut self.state, &self.settings, &self.chain, &ctx))
    }

    /// Deposit from `from` into custody; the chain balance follows.
    pub fn deposit(&mut self, from: &str, quantity: Asset) -> LedgerResult<Outcome> {
        let outcome = self.notice(&TransferNotice {
            from: name(from),
            to: self.settings.custody_account.clone(),
            quantity,
            memo: String::new(),
        })?;
        self.chain.issue(&self.settings.custody_account, quantity);
        Ok(outcome)
    }

    /// Announces an inactive license.
    pub fn announce(
        &mut self,
        title: &str,
        fee: Asset,
        limit: RateLimit,
        terms: LicenseTerms,
    ) -> LedgerResult<LicenseId> {
        let outcome = self.admin(Action::Announce {
            name: title.to_string(),
            fee,
            rate: LicenseRate {
                payer: RatePayer::Partner,
                limit,
            },
            terms,
        })?;
        match outcome.created {
            Some(Created::License(id)) => Ok(id),
            other => panic!("announce created {other:?}"),
        }
    }

    /// Announces and activates a license.
    pub fn license(
        &mut self,
        title: &str,
        fee: Asset,
        limit: RateLimit,
        terms: LicenseTerms,
    ) -> LicenseId {
        let id = self.announce(title, fee, limit, terms).unwrap();
        self.admin(Action::Activate { license: id }).unwrap();
        id
    }

    /// Fixed 10% license, 10 EOS fee.
    pub fn starter(&mut self) -> LicenseId {
        self.license("Starter", eos(10), RateLimit::Fixed { value: 0.1 }, public_terms())
    }

    /// Range 5% to 15% license, 20 EOS fee.
    pub fn pro(&mut self) -> LicenseId {
        self.license(
            "Pro",
            eos(20),
            RateLimit::Range { from: 0.05, to: 0.15 },
            public_terms(),
        )
    }

    /// Peer-to-peer broker license over `scope`, paying out on claim.
    pub fn broker_license(&mut self, scope: Vec<LicenseId>) -> LicenseId {
        self.license(
            "Broker",
            eos(0),
            RateLimit::PeerToPeer { from: 0.1, to: 0.3 },
            LicenseTerms {
                global_program: true,
                instant_payout: true,
                additionable: true,
                revocable: true,
                allowed_scope: scope,
                ..LicenseTerms::default()
            },
        )
    }

    /// Approved allocation of `account` on `license`, with zero balance when
    /// `discount` equals the fee.
    pub fn partner(
        &mut self,
        account: &str,
        license: LicenseId,
        rate: Option<Rate>,
        discount: Asset,
    ) -> Partner {
        self.admin(Action::Allocate {
            partner: name(account),
            affiliate: None,
            license,
            rate,
            discount,
            broker: None,
            approved: true,
        })
        .unwrap();
        self.partner_of(account).clone()
    }

    pub fn partner_of(&self, account: &str) -> &Partner {
        self.state.partners.find_by_primary(&name(account)).unwrap()
    }

    pub fn locked(&self) -> Asset {
        self.state.config().unwrap().locked
    }
}
