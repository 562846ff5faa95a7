//! # Keyed Tables
//!
//! Primary-keyed tables with secondary indices.
//!
//! Rows are only reachable through `insert`, `modify` and `remove`, which keep
//! every index in step with the rows. Unique indices reject duplicate keys.
//! Tables persist as plain row lists; indices are rebuilt on load and a
//! duplicate key in persisted rows is reported as corruption.

use crate::domain::entities::{Application, License, Partner};
use crate::domain::value_objects::{ApplicationId, LicenseId, PartnerId};
use crate::errors::TableError;
use serde::{Deserialize, Serialize};
use shared_types::AccountName;
use std::collections::{BTreeMap, BTreeSet};

fn claim_unique<K: Ord + Clone + ToString, V: Copy>(
    index: &BTreeMap<K, V>,
    name: &'static str,
    key: Option<&K>,
) -> Result<(), TableError> {
    match key {
        Some(k) if index.contains_key(k) => Err(TableError::DuplicateKey {
            index: name,
            key: k.to_string(),
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// LICENSES
// =============================================================================

/// Licenses, primary key only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<License>", into = "Vec<License>")]
pub struct LicenseTable {
    rows: BTreeMap<LicenseId, License>,
}

impl LicenseTable {
    /// Next free primary key.
    #[must_use]
    pub fn next_id(&self) -> LicenseId {
        LicenseId(self.rows.keys().next_back().map_or(0, |k| k.0 + 1))
    }

    #[must_use]
    pub fn get(&self, id: LicenseId) -> Option<&License> {
        self.rows.get(&id)
    }

    pub fn get_mut(&mut self, id: LicenseId) -> Option<&mut License> {
        self.rows.get_mut(&id)
    }

    pub fn insert(&mut self, license: License) -> Result<(), TableError> {
        if self.rows.contains_key(&license.id) {
            return Err(TableError::DuplicatePrimaryKey(license.id.0));
        }
        self.rows.insert(license.id, license);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &License> {
        self.rows.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl TryFrom<Vec<License>> for LicenseTable {
    type Error = TableError;

    fn try_from(rows: Vec<License>) -> Result<Self, Self::Error> {
        let mut table = Self::default();
        for row in rows {
            table.insert(row)?;
        }
        Ok(table)
    }
}

impl From<LicenseTable> for Vec<License> {
    fn from(table: LicenseTable) -> Self {
        table.rows.into_values().collect()
    }
}

// =============================================================================
// APPLICATIONS
// =============================================================================

/// Applications: unique by owner, unique by affiliate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Application>", into = "Vec<Application>")]
pub struct ApplicationTable {
    rows: BTreeMap<ApplicationId, Application>,
    by_owner: BTreeMap<AccountName, ApplicationId>,
    by_affiliate: BTreeMap<AccountName, ApplicationId>,
}

impl ApplicationTable {
    #[must_use]
    pub fn next_id(&self) -> ApplicationId {
        ApplicationId(self.rows.keys().next_back().map_or(0, |k| k.0 + 1))
    }

    #[must_use]
    pub fn get(&self, id: ApplicationId) -> Option<&Application> {
        self.rows.get(&id)
    }

    #[must_use]
    pub fn find_by_owner(&self, owner: &AccountName) -> Option<&Application> {
        self.by_owner.get(owner).and_then(|id| self.rows.get(id))
    }

    #[must_use]
    pub fn has_owner(&self, owner: &AccountName) -> bool {
        self.by_owner.contains_key(owner)
    }

    #[must_use]
    pub fn has_affiliate(&self, affiliate: &AccountName) -> bool {
        self.by_affiliate.contains_key(affiliate)
    }

    pub fn insert(&mut self, row: Application) -> Result<(), TableError> {
        if self.rows.contains_key(&row.id) {
            return Err(TableError::DuplicatePrimaryKey(row.id.0));
        }
        claim_unique(&self.by_owner, "owner", Some(&row.owner))?;
        claim_unique(&self.by_affiliate, "affiliate", row.affiliate.as_ref())?;

        self.by_owner.insert(row.owner.clone(), row.id);
        if let Some(affiliate) = &row.affiliate {
            self.by_affiliate.insert(affiliate.clone(), row.id);
        }
        self.rows.insert(row.id, row);
        Ok(())
    }

    pub fn remove(&mut self, id: ApplicationId) -> Option<Application> {
        let row = self.rows.remove(&id)?;
        self.by_owner.remove(&row.owner);
        if let Some(affiliate) = &row.affiliate {
            self.by_affiliate.remove(affiliate);
        }
        Some(row)
    }

    /// Applies `f` to a row, re-indexing it. The row is left untouched if the
    /// change would collide with another row's unique key.
    pub fn modify<F>(&mut self, id: ApplicationId, f: F) -> Result<(), TableError>
    where
        F: FnOnce(&mut Application),
    {
        let old = self.remove(id).ok_or(TableError::MissingRow(id.0))?;
        let mut row = old.clone();
        f(&mut row);
        row.id = id;
        if let Err(err) = self.insert(row) {
            let restored = self.insert(old);
            debug_assert!(restored.is_ok());
            return Err(err);
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Application> {
        self.rows.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl TryFrom<Vec<Application>> for ApplicationTable {
    type Error = TableError;

    fn try_from(rows: Vec<Application>) -> Result<Self, Self::Error> {
        let mut table = Self::default();
        for row in rows {
            table.insert(row)?;
        }
        Ok(table)
    }
}

impl From<ApplicationTable> for Vec<Application> {
    fn from(table: ApplicationTable) -> Self {
        table.rows.into_values().collect()
    }
}

// =============================================================================
// PARTNERS
// =============================================================================

/// Partners: unique by primary, standby and affiliate; grouped by broker root.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Partner>", into = "Vec<Partner>")]
pub struct PartnerTable {
    rows: BTreeMap<PartnerId, Partner>,
    by_primary: BTreeMap<AccountName, PartnerId>,
    by_standby: BTreeMap<AccountName, PartnerId>,
    by_affiliate: BTreeMap<AccountName, PartnerId>,
    by_root: BTreeMap<PartnerId, BTreeSet<PartnerId>>,
}

impl PartnerTable {
    #[must_use]
    pub fn next_id(&self) -> PartnerId {
        PartnerId(self.rows.keys().next_back().map_or(0, |k| k.0 + 1))
    }

    #[must_use]
    pub fn get(&self, id: PartnerId) -> Option<&Partner> {
        self.rows.get(&id)
    }

    #[must_use]
    pub fn find_by_primary(&self, account: &AccountName) -> Option<&Partner> {
        self.by_primary.get(account).and_then(|id| self.rows.get(id))
    }

    #[must_use]
    pub fn has_primary(&self, account: &AccountName) -> bool {
        self.by_primary.contains_key(account)
    }

    #[must_use]
    pub fn has_standby(&self, account: &AccountName) -> bool {
        self.by_standby.contains_key(account)
    }

    #[must_use]
    pub fn has_affiliate(&self, affiliate: &AccountName) -> bool {
        self.by_affiliate.contains_key(affiliate)
    }

    /// Partners whose broker chain is rooted at `root`.
    pub fn under_root(&self, root: PartnerId) -> impl Iterator<Item = &Partner> {
        self.by_root
            .get(&root)
            .into_iter()
            .flatten()
            .filter_map(|id| self.rows.get(id))
    }

    pub fn insert(&mut self, row: Partner) -> Result<(), TableError> {
        if self.rows.contains_key(&row.id) {
            return Err(TableError::DuplicatePrimaryKey(row.id.0));
        }
        claim_unique(&self.by_primary, "primary", Some(&row.primary))?;
        claim_unique(&self.by_standby, "standby", row.standby.as_ref())?;
        claim_unique(&self.by_affiliate, "affiliate", row.affiliate.as_ref())?;

        self.by_primary.insert(row.primary.clone(), row.id);
        if let Some(standby) = &row.standby {
            self.by_standby.insert(standby.clone(), row.id);
        }
        if let Some(affiliate) = &row.affiliate {
            self.by_affiliate.insert(affiliate.clone(), row.id);
        }
        if let Some(root) = row.broker_root() {
            self.by_root.entry(root).or_default().insert(row.id);
        }
        self.rows.insert(row.id, row);
        Ok(())
    }

    fn remove(&mut self, id: PartnerId) -> Option<Partner> {
        let row = self.rows.remove(&id)?;
        self.by_primary.remove(&row.primary);
        if let Some(standby) = &row.standby {
            self.by_standby.remove(standby);
        }
        if let Some(affiliate) = &row.affiliate {
            self.by_affiliate.remove(affiliate);
        }
        if let Some(root) = row.broker_root() {
            if let Some(group) = self.by_root.get_mut(&root) {
                group.remove(&id);
                if group.is_empty() {
                    self.by_root.remove(&root);
                }
            }
        }
        Some(row)
    }

    /// Applies `f` to a row, re-indexing it. The row is left untouched if the
    /// change would collide with another row's unique key.
    pub fn modify<F>(&mut self, id: PartnerId, f: F) -> Result<(), TableError>
    where
        F: FnOnce(&mut Partner),
    {
        let old = self.remove(id).ok_or(TableError::MissingRow(id.0))?;
        let mut row = old.clone();
        f(&mut row);
        row.id = id;
        if let Err(err) = self.insert(row) {
            let restored = self.insert(old);
            debug_assert!(restored.is_ok());
            return Err(err);
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Partner> {
        self.rows.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl TryFrom<Vec<Partner>> for PartnerTable {
    type Error = TableError;

    fn try_from(rows: Vec<Partner>) -> Result<Self, Self::Error> {
        let mut table = Self::default();
        for row in rows {
            table.insert(row)?;
        }
        Ok(table)
    }
}

impl From<PartnerTable> for Vec<Partner> {
    fn from(table: PartnerTable) -> Self {
        table.rows.into_values().collect()
    }
}
