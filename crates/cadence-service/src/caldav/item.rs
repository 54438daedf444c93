//! Recurring items: a master definition and its date-specific modifications.

use std::collections::BTreeMap;
use std::collections::btree_map;

use cadence_rfc::rfc::ical::core::{Component, Property};
use cadence_rfc::rfc::ical::expand::TimeZoneResolver;

use super::fingerprint;
use super::index::TimeRangeIndex;
use super::time::{RecurrenceKey, TimeValue};
use crate::error::{ServiceError, ServiceResult};

type ModificationMap = BTreeMap<RecurrenceKey, RecurringItem>;

/// Shared view handed out while a master has no modifications.
static EMPTY_MODIFICATIONS: ModificationMap = BTreeMap::new();

/// Master-only state.
#[derive(Debug, Clone, Default)]
pub struct MasterState {
    modifications: ModificationMap,
    has_modifications: bool,
}

/// Modification-only state.
#[derive(Debug, Clone)]
pub struct ModificationState {
    /// Occurrence this modification overrides.
    pub recurrence_id: TimeValue,
    /// Whether the override extends to every later occurrence.
    pub this_and_future: bool,
    /// UID of the master this modification belongs to.
    pub modifies: String,
}

/// Role of a recurring item.
#[derive(Debug, Clone)]
pub enum ItemRole {
    /// Series definition owning modifications.
    Master(MasterState),
    /// Override of one occurrence (or, with this-and-future, of a tail).
    Modification(ModificationState),
}

/// A calendar item that is either a recurring master or one of its overrides.
#[derive(Debug, Clone)]
pub struct RecurringItem {
    uid: Option<String>,
    modified: Option<i64>,
    content: Component,
    role: ItemRole,
    index: Option<TimeRangeIndex>,
}

impl RecurringItem {
    /// ## Summary
    /// Creates a master item from its VEVENT/VTODO/VJOURNAL content.
    ///
    /// The time-range index is derived from the content; content without a
    /// usable DTSTART yields no index.
    #[must_use]
    pub fn master(uid: Option<String>, content: Component) -> Self {
        let index = derive_index(&content);
        Self {
            uid,
            modified: None,
            content,
            role: ItemRole::Master(MasterState::default()),
            index,
        }
    }

    /// ## Summary
    /// Creates a modification of the master identified by `modifies`.
    ///
    /// The recurrence identifier is read from the content's RECURRENCE-ID;
    /// `RANGE=THISANDFUTURE` on it sets the this-and-future flag.
    ///
    /// ## Errors
    /// Returns [`ServiceError::InvalidOverride`] if the content has no usable
    /// RECURRENCE-ID.
    pub fn modification(
        uid: Option<String>,
        content: Component,
        modifies: impl Into<String>,
    ) -> ServiceResult<Self> {
        let (recurrence_id, this_and_future) = read_recurrence_id(&content)?;
        let index = derive_index(&content);
        Ok(Self {
            uid,
            modified: None,
            content,
            role: ItemRole::Modification(ModificationState {
                recurrence_id,
                this_and_future,
                modifies: modifies.into(),
            }),
            index,
        })
    }

    /// Sets the last-modified timestamp (epoch milliseconds).
    #[must_use]
    pub const fn with_modified(mut self, modified: i64) -> Self {
        self.modified = Some(modified);
        self
    }

    /// ## Summary
    /// Returns the item's uid, minting a random (v4) one if it has none.
    ///
    /// ## Side Effects
    /// Stores the minted uid on the item.
    pub fn ensure_uid(&mut self) -> &str {
        self.uid
            .get_or_insert_with(|| {
                let uid = uuid::Uuid::new_v4().to_string();
                tracing::debug!(%uid, "Minted uid");
                uid
            })
            .as_str()
    }

    /// The item's uid, if any.
    #[must_use]
    pub fn uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }

    /// Last-modified timestamp (epoch milliseconds), if any.
    #[must_use]
    pub const fn modified(&self) -> Option<i64> {
        self.modified
    }

    /// Records a new last-modified timestamp.
    pub fn touch(&mut self, modified: i64) {
        self.modified = Some(modified);
    }

    /// The item's time-bearing payload.
    #[must_use]
    pub const fn content(&self) -> &Component {
        &self.content
    }

    /// The item's role.
    #[must_use]
    pub const fn role(&self) -> &ItemRole {
        &self.role
    }

    /// Whether this item is a master.
    #[must_use]
    pub const fn is_master(&self) -> bool {
        matches!(self.role, ItemRole::Master(_))
    }

    /// Modification state, if this item is a modification.
    #[must_use]
    pub const fn as_modification(&self) -> Option<&ModificationState> {
        match &self.role {
            ItemRole::Modification(state) => Some(state),
            ItemRole::Master(_) => None,
        }
    }

    /// Derived time-range index of the content.
    #[must_use]
    pub const fn index(&self) -> Option<&TimeRangeIndex> {
        self.index.as_ref()
    }

    /// Whether this master currently has modifications.
    #[must_use]
    pub const fn has_modifications(&self) -> bool {
        match &self.role {
            ItemRole::Master(state) => state.has_modifications,
            ItemRole::Modification(_) => false,
        }
    }

    /// ## Summary
    /// Replaces the time-bearing payload and recomputes the full index.
    ///
    /// For modifications the recurrence identifier and this-and-future flag
    /// are re-read as well.
    ///
    /// ## Errors
    /// Returns [`ServiceError::InvalidOverride`] if a modification's new
    /// content has no usable RECURRENCE-ID; the item is left unchanged.
    pub fn set_content(&mut self, content: Component) -> ServiceResult<()> {
        if let ItemRole::Modification(state) = &mut self.role {
            let (recurrence_id, this_and_future) = read_recurrence_id(&content)?;
            state.recurrence_id = recurrence_id;
            state.this_and_future = this_and_future;
        }
        self.index = derive_index(&content);
        self.content = content;
        Ok(())
    }

    /// ## Summary
    /// Adds a modification keyed by its recurrence identifier.
    ///
    /// A modification already stored at the same identifier is replaced and
    /// returned.
    ///
    /// ## Errors
    /// Returns [`ServiceError::InvalidOverride`] if this item is itself a
    /// modification, if `modification` is not a modification, or if it
    /// references another master.
    #[tracing::instrument(skip_all, fields(master = ?self.uid, modification = ?modification.uid))]
    pub fn add_modification(
        &mut self,
        modification: RecurringItem,
    ) -> ServiceResult<Option<RecurringItem>> {
        let ItemRole::Master(state) = &mut self.role else {
            return Err(ServiceError::InvalidOverride(
                "a modification cannot own modifications".to_string(),
            ));
        };
        let Some(mod_state) = modification.as_modification() else {
            return Err(ServiceError::InvalidOverride(
                "only modifications can be added to a master".to_string(),
            ));
        };
        if self.uid.as_deref() != Some(mod_state.modifies.as_str()) {
            return Err(ServiceError::InvalidOverride(format!(
                "modification belongs to {}, not {:?}",
                mod_state.modifies, self.uid
            )));
        }

        let key = mod_state.recurrence_id.recurrence_key();
        let displaced = state.modifications.insert(key, modification);
        state.has_modifications = true;
        tracing::debug!(
            count = state.modifications.len(),
            replaced = displaced.is_some(),
            "Added modification"
        );
        Ok(displaced)
    }

    /// ## Summary
    /// Removes the modification with the given uid.
    ///
    /// Returns whether a modification was removed.
    pub fn remove_modification(&mut self, uid: &str) -> bool {
        let ItemRole::Master(state) = &mut self.role else {
            return false;
        };
        let before = state.modifications.len();
        state
            .modifications
            .retain(|_, m| m.uid.as_deref() != Some(uid));
        let removed = state.modifications.len() != before;
        state.has_modifications = !state.modifications.is_empty();
        if removed {
            tracing::debug!(uid, remaining = state.modifications.len(), "Removed modification");
        }
        removed
    }

    /// Removes every modification.
    pub fn remove_all_modifications(&mut self) {
        if let ItemRole::Master(state) = &mut self.role {
            state.modifications.clear();
            state.has_modifications = false;
        }
    }

    /// ## Summary
    /// Returns a read-only view of the modifications.
    ///
    /// While the master has none (and for modifications themselves) the view
    /// borrows one shared empty set.
    #[must_use]
    pub fn get_modifications(&self) -> Modifications<'_> {
        match &self.role {
            ItemRole::Master(state) if state.has_modifications => Modifications {
                map: &state.modifications,
            },
            _ => Modifications {
                map: &EMPTY_MODIFICATIONS,
            },
        }
    }

    /// ## Summary
    /// Consumes the item and returns the uids of everything it owned.
    ///
    /// For a master this is its own uid followed by each modification's uid
    /// in recurrence-identifier order.
    #[must_use]
    pub fn destroy(self) -> Vec<String> {
        let mut removed: Vec<String> = self.uid.into_iter().collect();
        if let ItemRole::Master(state) = self.role {
            removed.extend(state.modifications.into_values().filter_map(|m| m.uid));
        }
        tracing::debug!(count = removed.len(), "Destroyed item");
        removed
    }

    /// Change token over this item and, for masters, its live modifications.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        fingerprint::calculate(self)
    }
}

/// Read-only view of a master's modifications, in recurrence-identifier order.
#[derive(Debug, Clone)]
pub struct Modifications<'a> {
    map: &'a ModificationMap,
}

impl<'a> Modifications<'a> {
    /// Number of modifications.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether there are no modifications.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterates modifications in recurrence-identifier order.
    pub fn iter(&self) -> btree_map::Values<'a, RecurrenceKey, RecurringItem> {
        self.map.values()
    }

    /// Looks up the modification overriding `recurrence_id`.
    #[must_use]
    pub fn get(&self, recurrence_id: &TimeValue) -> Option<&'a RecurringItem> {
        self.map.get(&recurrence_id.recurrence_key())
    }

    /// Whether this view borrows the shared empty set.
    #[must_use]
    pub fn is_shared_empty(&self) -> bool {
        std::ptr::eq(self.map, &EMPTY_MODIFICATIONS)
    }
}

impl<'a> IntoIterator for Modifications<'a> {
    type Item = &'a RecurringItem;
    type IntoIter = btree_map::Values<'a, RecurrenceKey, RecurringItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.map.values()
    }
}

impl<'a> IntoIterator for &Modifications<'a> {
    type Item = &'a RecurringItem;
    type IntoIter = btree_map::Values<'a, RecurrenceKey, RecurringItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.map.values()
    }
}

fn derive_index(content: &Component) -> Option<TimeRangeIndex> {
    let mut resolver = TimeZoneResolver::new();
    TimeRangeIndex::from_component(content, &mut resolver)
}

fn read_recurrence_id(content: &Component) -> ServiceResult<(TimeValue, bool)> {
    let prop: &Property = content.recurrence_id().ok_or_else(|| {
        ServiceError::InvalidOverride("modification has no RECURRENCE-ID".to_string())
    })?;
    let mut resolver = TimeZoneResolver::new();
    let recurrence_id = TimeValue::from_property(prop, &mut resolver)
        .map_err(|err| ServiceError::InvalidOverride(format!("unusable RECURRENCE-ID: {err}")))?;
    Ok((recurrence_id, prop.is_this_and_future()))
}
