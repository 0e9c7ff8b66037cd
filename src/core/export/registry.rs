//! Export forms registry
//!
//! The registry owns the authoritative selection and configuration state for
//! every known form. It is shared between the caller (which mutates selection
//! and overrides) and running exports (which only read an atomic snapshot and
//! append status messages).

use super::configuration::ExportConfiguration;
use super::status::{StatusMessage, StatusSink};
use crate::core::preferences::Preferences;
use crate::domain::form::FormDefinition;
use crate::domain::ids::FormId;
use crate::domain::{Result, SatchelError};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

/// Registry record for one form
#[derive(Debug, Clone, PartialEq)]
pub struct FormEntry {
    pub definition: FormDefinition,
    pub selected: bool,
    pub custom_configuration: Option<ExportConfiguration>,
    pub status_history: Vec<StatusMessage>,
    pub last_export: Option<DateTime<Utc>>,
}

impl FormEntry {
    fn new(definition: FormDefinition) -> Self {
        Self {
            definition,
            selected: false,
            custom_configuration: None,
            status_history: Vec::new(),
            last_export: None,
        }
    }

    pub fn form_id(&self) -> &FormId {
        &self.definition.id
    }
}

/// A selected form paired with its resolved configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedForm {
    pub definition: FormDefinition,
    pub configuration: ExportConfiguration,
}

/// Changes applied by [`FormRegistry::merge`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub added: Vec<FormId>,
    pub removed: Vec<FormId>,
    /// Definition files rejected because their form id was already taken
    pub duplicates: Vec<PathBuf>,
}

#[derive(Debug)]
struct RegistryState {
    entries: BTreeMap<FormId, FormEntry>,
    default_configuration: ExportConfiguration,
    /// Forms removed by `merge` whose persisted keys are still to be dropped
    dropped: HashSet<FormId>,
}

impl RegistryState {
    fn entry_mut(&mut self, form_id: &FormId) -> Result<&mut FormEntry> {
        self.entries
            .get_mut(form_id)
            .ok_or_else(|| SatchelError::Configuration(format!("Unknown form: {form_id}")))
    }

    fn effective(&self, entry: &FormEntry) -> ExportConfiguration {
        match &entry.custom_configuration {
            Some(custom) => custom.merge_over(&self.default_configuration),
            None => self.default_configuration.clone(),
        }
    }

    fn sorted_entries(&self) -> Vec<&FormEntry> {
        let mut entries: Vec<&FormEntry> = self.entries.values().collect();
        entries.sort_by(|a, b| {
            a.definition
                .title
                .cmp(&b.definition.title)
                .then_with(|| a.definition.id.cmp(&b.definition.id))
        });
        entries
    }
}

/// Thread-safe registry of export forms
#[derive(Debug)]
pub struct FormRegistry {
    state: RwLock<RegistryState>,
}

impl FormRegistry {
    /// Rebuild the registry from known forms and persisted key/value state
    ///
    /// Per-form overrides are read from keys prefixed with `"<form_id>::"`.
    ///
    /// # Errors
    ///
    /// Returns `SatchelError::DuplicateForm` if two definitions share a form id.
    pub fn load(
        default_configuration: ExportConfiguration,
        known_forms: Vec<FormDefinition>,
        persisted: &BTreeMap<String, String>,
    ) -> Result<Self> {
        let mut entries: BTreeMap<FormId, FormEntry> = BTreeMap::new();

        for definition in known_forms {
            let form_id = definition.id.clone();
            if let Some(existing) = entries.get(&form_id) {
                return Err(SatchelError::DuplicateForm(format!(
                    "{form_id} is defined by both {} and {}",
                    existing.definition.source_path.display(),
                    definition.source_path.display()
                )));
            }

            let mut entry = FormEntry::new(definition);
            let prefix = form_id.custom_conf_prefix();
            let custom = ExportConfiguration::from_key_value_map(persisted, Some(prefix.as_str()));
            if !custom.is_empty() {
                entry.custom_configuration = Some(custom);
            }
            entry.last_export = persisted
                .get(&form_id.last_export_key())
                .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
                .map(|dt| dt.with_timezone(&Utc));

            entries.insert(form_id, entry);
        }

        tracing::debug!(forms = entries.len(), "Loaded form registry");

        Ok(Self {
            state: RwLock::new(RegistryState {
                entries,
                default_configuration,
                dropped: HashSet::new(),
            }),
        })
    }

    /// Rebuild the registry from a preferences namespace
    ///
    /// The default configuration lives under unprefixed keys.
    pub fn load_from_preferences(
        known_forms: Vec<FormDefinition>,
        preferences: &dyn Preferences,
    ) -> Result<Self> {
        let persisted = preferences.snapshot();
        let default_configuration = ExportConfiguration::from_key_value_map(&persisted, None);
        Self::load(default_configuration, known_forms, &persisted)
    }

    /// Reconcile with a freshly retrieved list of forms
    ///
    /// New forms are added unselected, forms still present keep their selection,
    /// override and history (their definition is refreshed), forms no longer
    /// present are dropped. Repeating the same merge changes nothing.
    pub fn merge(&self, latest_forms: Vec<FormDefinition>) -> MergeSummary {
        let mut state = self.state.write();
        let mut summary = MergeSummary::default();
        let mut seen: HashSet<FormId> = HashSet::new();

        for definition in latest_forms {
            let form_id = definition.id.clone();
            if !seen.insert(form_id.clone()) {
                tracing::warn!(
                    form_id = %form_id,
                    path = %definition.source_path.display(),
                    "Duplicate form id, keeping the first definition"
                );
                summary.duplicates.push(definition.source_path);
                continue;
            }

            match state.entries.get_mut(&form_id) {
                Some(entry) => entry.definition = definition,
                None => {
                    summary.added.push(form_id.clone());
                    state.dropped.remove(&form_id);
                    state.entries.insert(form_id, FormEntry::new(definition));
                }
            }
        }

        let stale: Vec<FormId> = state
            .entries
            .keys()
            .filter(|id| !seen.contains(*id))
            .cloned()
            .collect();
        for form_id in stale {
            state.entries.remove(&form_id);
            state.dropped.insert(form_id.clone());
            summary.removed.push(form_id);
        }

        if !summary.added.is_empty() || !summary.removed.is_empty() {
            tracing::info!(
                added = summary.added.len(),
                removed = summary.removed.len(),
                "Merged form list"
            );
        }

        summary
    }

    pub fn set_selected(&self, form_id: &FormId, selected: bool) -> Result<()> {
        self.state.write().entry_mut(form_id)?.selected = selected;
        Ok(())
    }

    pub fn select_all(&self) {
        for entry in self.state.write().entries.values_mut() {
            entry.selected = true;
        }
    }

    pub fn clear_all(&self) {
        for entry in self.state.write().entries.values_mut() {
            entry.selected = false;
        }
    }

    /// Deselect everything when every form is selected, otherwise select everything
    pub fn toggle_all_based_on_current_state(&self) {
        let mut state = self.state.write();
        let all_selected =
            !state.entries.is_empty() && state.entries.values().all(|e| e.selected);
        for entry in state.entries.values_mut() {
            entry.selected = !all_selected;
        }
    }

    /// Replace the shared default configuration
    pub fn update_default_configuration(&self, configuration: ExportConfiguration) {
        self.state.write().default_configuration = configuration;
    }

    pub fn default_configuration(&self) -> ExportConfiguration {
        self.state.read().default_configuration.clone()
    }

    pub fn set_custom_configuration(
        &self,
        form_id: &FormId,
        configuration: ExportConfiguration,
    ) -> Result<()> {
        let mut state = self.state.write();
        let entry = state.entry_mut(form_id)?;
        entry.custom_configuration = if configuration.is_empty() {
            None
        } else {
            Some(configuration)
        };
        Ok(())
    }

    pub fn remove_custom_configuration(&self, form_id: &FormId) -> Result<()> {
        self.state.write().entry_mut(form_id)?.custom_configuration = None;
        Ok(())
    }

    pub fn custom_configurations(&self) -> BTreeMap<FormId, ExportConfiguration> {
        self.state
            .read()
            .entries
            .iter()
            .filter_map(|(id, e)| e.custom_configuration.clone().map(|c| (id.clone(), c)))
            .collect()
    }

    /// The override merged over the default, or the default alone
    pub fn effective_configuration(&self, form_id: &FormId) -> Result<ExportConfiguration> {
        let state = self.state.read();
        let entry = state
            .entries
            .get(form_id)
            .ok_or_else(|| SatchelError::Configuration(format!("Unknown form: {form_id}")))?;
        Ok(state.effective(entry))
    }

    /// Selected entries ordered by form name
    pub fn selected_forms(&self) -> Vec<FormEntry> {
        self.state
            .read()
            .sorted_entries()
            .into_iter()
            .filter(|e| e.selected)
            .cloned()
            .collect()
    }

    /// Selected forms with their effective configuration, taken under one lock
    pub fn selection_snapshot(&self) -> Vec<SelectedForm> {
        let state = self.state.read();
        state
            .sorted_entries()
            .into_iter()
            .filter(|e| e.selected)
            .map(|e| SelectedForm {
                definition: e.definition.clone(),
                configuration: state.effective(e),
            })
            .collect()
    }

    /// Every entry ordered by form name
    pub fn forms(&self) -> Vec<FormEntry> {
        self.state
            .read()
            .sorted_entries()
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn get(&self, form_id: &FormId) -> Option<FormEntry> {
        self.state.read().entries.get(form_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().entries.is_empty()
    }

    pub fn some_selected(&self) -> bool {
        self.state.read().entries.values().any(|e| e.selected)
    }

    pub fn all_selected(&self) -> bool {
        let state = self.state.read();
        !state.entries.is_empty() && state.entries.values().all(|e| e.selected)
    }

    pub fn all_selected_have_valid_configuration(&self) -> bool {
        let state = self.state.read();
        state
            .entries
            .values()
            .filter(|e| e.selected)
            .all(|e| state.effective(e).is_valid())
    }

    /// Whether an export run may be started
    pub fn can_export(&self) -> bool {
        self.some_selected() && self.all_selected_have_valid_configuration()
    }

    pub fn clear_status_history(&self, form_id: &FormId) {
        if let Some(entry) = self.state.write().entries.get_mut(form_id) {
            entry.status_history.clear();
        }
    }

    pub fn status_history(&self, form_id: &FormId) -> Vec<StatusMessage> {
        self.state
            .read()
            .entries
            .get(form_id)
            .map(|e| e.status_history.clone())
            .unwrap_or_default()
    }

    pub fn record_successful_export(&self, form_id: &FormId, at: DateTime<Utc>) {
        if let Some(entry) = self.state.write().entries.get_mut(form_id) {
            entry.last_export = Some(at);
        }
    }

    pub fn last_export(&self, form_id: &FormId) -> Option<DateTime<Utc>> {
        self.state.read().entries.get(form_id).and_then(|e| e.last_export)
    }

    /// Write default, overrides and last-export dates to preferences
    ///
    /// Stale keys are removed first; the default configuration is only written
    /// when it is valid. Keys of forms dropped by [`merge`](Self::merge) are
    /// removed as well.
    pub fn persist(&self, preferences: &dyn Preferences) -> Result<()> {
        let mut state = self.state.write();

        preferences.remove_all(&ExportConfiguration::keys(None))?;
        if state.default_configuration.is_valid() {
            preferences.put_all(&state.default_configuration.as_key_value_map(None))?;
        }

        for (form_id, entry) in &state.entries {
            let prefix = form_id.custom_conf_prefix();
            preferences.remove_all(&ExportConfiguration::keys(Some(prefix.as_str())))?;
            if let Some(custom) = &entry.custom_configuration {
                preferences.put_all(&custom.as_key_value_map(Some(prefix.as_str())))?;
            }
            if let Some(at) = entry.last_export {
                preferences.put(&form_id.last_export_key(), &at.to_rfc3339())?;
            }
        }

        for form_id in std::mem::take(&mut state.dropped) {
            let prefix = form_id.custom_conf_prefix();
            let mut keys = ExportConfiguration::keys(Some(prefix.as_str()));
            keys.push(form_id.last_export_key());
            preferences.remove_all(&keys)?;
            tracing::debug!(form_id = %form_id, "Removed preferences of dropped form");
        }

        tracing::debug!(namespace = preferences.namespace(), "Persisted form registry");
        Ok(())
    }

    /// Write only the last-export dates
    ///
    /// Used after an export run, which changes nothing else. Configuration
    /// keys are left exactly as stored.
    pub fn persist_last_exports(&self, preferences: &dyn Preferences) -> Result<()> {
        let state = self.state.read();
        let mut written = 0;
        for (form_id, entry) in &state.entries {
            if let Some(at) = entry.last_export {
                preferences.put(&form_id.last_export_key(), &at.to_rfc3339())?;
                written += 1;
            }
        }
        tracing::debug!(
            namespace = preferences.namespace(),
            forms = written,
            "Persisted last export dates"
        );
        Ok(())
    }
}

impl StatusSink for FormRegistry {
    fn notify(&self, form_id: &FormId, message: &str, is_error: bool) {
        if let Some(entry) = self.state.write().entries.get_mut(form_id) {
            entry
                .status_history
                .push(StatusMessage::new(message, is_error));
        }
    }
}
