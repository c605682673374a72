//! Config Action Service
//!
//! Indexes config actions by module and action name, both
//! case-insensitive.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::application::plugin::ConfigAction;
use crate::application::services::{Service, ServiceClass};
use crate::shared::error::BotError;
use crate::startup::BotHandle;

pub struct ConfigActionService {
    actions: RwLock<HashMap<String, Vec<Arc<ConfigAction>>>>,
}

impl ServiceClass for ConfigActionService {
    const NAME: &'static str = "configActionService";

    fn construct(_bot: BotHandle) -> Self {
        Self {
            actions: RwLock::new(HashMap::new()),
        }
    }
}

impl Service for ConfigActionService {}

impl ConfigActionService {
    pub fn add_action(&self, action: Arc<ConfigAction>) -> Result<(), BotError> {
        let mut actions = self.actions.write();
        let module_actions = actions.entry(action.module_name.to_lowercase()).or_default();

        if module_actions.iter().any(|existing| existing.name.eq_ignore_ascii_case(&action.name)) {
            return Err(BotError::invalid_descriptor(
                "name",
                format!("Config action {} already exists in module {}.", action.name, action.module_name),
            ));
        }

        tracing::trace!(module = %action.module_name, action = %action.name, "config action registered");
        module_actions.push(action);
        Ok(())
    }

    pub fn get_action(&self, module_name: &str, action_name: &str) -> Option<Arc<ConfigAction>> {
        self.actions
            .read()
            .get(&module_name.to_lowercase())?
            .iter()
            .find(|action| action.name.eq_ignore_ascii_case(action_name))
            .cloned()
    }

    /// Actions of one module in registration order.
    pub fn actions_for(&self, module_name: &str) -> Vec<Arc<ConfigAction>> {
        self.actions
            .read()
            .get(&module_name.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }
}
