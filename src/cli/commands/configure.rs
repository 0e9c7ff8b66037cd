//! Configure command implementation
//!
//! Updates the default export configuration, or a per-form override, and
//! persists it to the export preferences.

use super::open_context;
use crate::cli::{EXIT_CONFIG, EXIT_FATAL, EXIT_OK};
use crate::core::export::{ExportConfiguration, FormRegistry};
use crate::domain::{FormId, Result};
use chrono::NaiveDate;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the configure command
#[derive(Args, Debug)]
pub struct ConfigureArgs {
    /// Configure an override for this form instead of the default
    #[arg(short, long)]
    pub form: Option<String>,

    /// Drop the override (or the whole default) before applying flags
    #[arg(long)]
    pub reset: bool,

    /// Directory export files are written to
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Earliest submission date exported (YYYY-MM-DD, inclusive)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Latest submission date exported (YYYY-MM-DD, inclusive)
    #[arg(long)]
    pub end_date: Option<NaiveDate>,

    /// PEM private key for encrypted forms
    #[arg(long)]
    pub pem_file: Option<PathBuf>,

    /// Pull submissions from the server before exporting
    #[arg(long)]
    pub pull_before: Option<bool>,

    /// Replace existing export files instead of appending
    #[arg(long)]
    pub overwrite: Option<bool>,

    /// Write one column per choice of multiple-choice fields
    #[arg(long)]
    pub explode_choice_lists: Option<bool>,
}

impl ConfigureArgs {
    /// Execute the configure command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let ctx = match open_context(config_path) {
            Ok(ctx) => ctx,
            Err(code) => return Ok(code),
        };
        let (registry, _) = match ctx.load_registry() {
            Ok(loaded) => loaded,
            Err(e) => {
                println!("❌ Failed to load forms: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let target = match self.form.as_deref().map(FormId::new).transpose() {
            Ok(target) => target,
            Err(e) => {
                println!("❌ Invalid form id: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        if let Err(e) = self.apply(&registry, target.as_ref()) {
            println!("❌ {e}");
            return Ok(EXIT_CONFIG);
        }

        let preferences = ctx.export_preferences()?;
        if let Err(e) = registry.persist(preferences.as_ref()) {
            crate::log_error_with_context!(&e, "Failed to save export preferences");
            println!("❌ Failed to save export preferences: {e}");
            return Ok(EXIT_FATAL);
        }

        let default = registry.default_configuration();
        let validation = default.validate();
        if !validation.is_valid() {
            println!(
                "⚠️  Default configuration is invalid and was not saved: {}",
                validation.message()
            );
        }

        match &target {
            Some(form_id) => {
                println!("✅ Updated configuration for {form_id}");
                print_configuration(&registry.effective_configuration(form_id)?);
            }
            None => {
                println!("✅ Updated default configuration");
                print_configuration(&default);
            }
        }
        Ok(EXIT_OK)
    }

    /// Configuration holding only the fields given on the command line
    fn requested(&self) -> ExportConfiguration {
        ExportConfiguration {
            output_directory: self.output_dir.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            pem_key_file: self.pem_file.clone(),
            pull_before: self.pull_before,
            overwrite_existing: self.overwrite,
            explode_choice_lists: self.explode_choice_lists,
        }
    }

    fn apply(&self, registry: &FormRegistry, target: Option<&FormId>) -> Result<()> {
        let requested = self.requested();
        match target {
            Some(form_id) => {
                let existing = match registry.get(form_id) {
                    Some(entry) if !self.reset => entry.custom_configuration.unwrap_or_default(),
                    Some(_) => ExportConfiguration::empty(),
                    None => {
                        return Err(crate::domain::SatchelError::Configuration(format!(
                            "Unknown form: {form_id}"
                        )))
                    }
                };
                registry.set_custom_configuration(form_id, requested.merge_over(&existing))
            }
            None => {
                let existing = if self.reset {
                    ExportConfiguration::empty()
                } else {
                    registry.default_configuration()
                };
                registry.update_default_configuration(requested.merge_over(&existing));
                Ok(())
            }
        }
    }
}

fn print_configuration(configuration: &ExportConfiguration) {
    let values = configuration.as_key_value_map(None);
    for key in ExportConfiguration::keys(None) {
        println!(
            "  {:<22} {}",
            key,
            values.get(&key).map(String::as_str).unwrap_or("(unset)")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FormDefinition;
    use std::collections::BTreeMap;
    use std::path::Path;

    fn args() -> ConfigureArgs {
        ConfigureArgs {
            form: None,
            reset: false,
            output_dir: None,
            start_date: None,
            end_date: None,
            pem_file: None,
            pull_before: None,
            overwrite: None,
            explode_choice_lists: None,
        }
    }

    fn registry() -> FormRegistry {
        let definition =
            FormDefinition::from_json(Path::new("/forms/visits/form.json"), br#"{"id": "visits"}"#)
                .unwrap();
        FormRegistry::load(
            ExportConfiguration::empty().with_output_directory("/out"),
            vec![definition],
            &BTreeMap::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_apply_merges_flags_over_existing_default() {
        let registry = registry();
        let update = ConfigureArgs {
            pull_before: Some(true),
            ..args()
        };
        update.apply(&registry, None).unwrap();

        let default = registry.default_configuration();
        assert_eq!(default.output_directory, Some(PathBuf::from("/out")));
        assert!(default.pull_before());
    }

    #[test]
    fn test_apply_reset_override() {
        let registry = registry();
        let form_id = FormId::new("visits").unwrap();
        let update = ConfigureArgs {
            overwrite: Some(true),
            ..args()
        };
        update.apply(&registry, Some(&form_id)).unwrap();
        assert!(registry.custom_configurations().contains_key(&form_id));

        let reset = ConfigureArgs {
            reset: true,
            ..args()
        };
        reset.apply(&registry, Some(&form_id)).unwrap();
        assert!(registry.custom_configurations().is_empty());
    }

    #[test]
    fn test_apply_unknown_form() {
        let registry = registry();
        let form_id = FormId::new("missing").unwrap();
        assert!(args().apply(&registry, Some(&form_id)).is_err());
    }
}
