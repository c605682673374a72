//! Service Registry
//!
//! Namespaced singleton services. Keys are `namespace.Name`, compared
//! case-insensitively. Services are constructed with a [`BotHandle`] and
//! resolve each other lazily through it, so registration order only matters
//! for the order configuration and lifecycle hooks run in.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::config::Settings;
use crate::domain::Guild;
use crate::shared::error::BotError;
use crate::startup::BotHandle;

/// A registered singleton.
#[async_trait]
pub trait Service: Any + Send + Sync {
    /// One-time configuration during startup. A failure aborts startup.
    async fn configure_service(&self, _settings: &Settings) -> Result<(), BotError> {
        Ok(())
    }

    /// The bot finished connecting.
    async fn on_listen(&self) -> Result<(), BotError> {
        Ok(())
    }

    /// The bot joined (or started up in) a guild.
    async fn on_join_guild(&self, _guild: &Guild) -> Result<(), BotError> {
        Ok(())
    }
}

/// A service type the registry can construct.
pub trait ServiceClass: Service + Sized {
    const NAME: &'static str;

    fn construct(bot: BotHandle) -> Self;
}

/// A constructed service, held both as a trait object and as `Any` so it
/// can be handed back at its concrete type.
#[derive(Clone)]
pub struct ServiceInstance {
    service: Arc<dyn Service>,
    any: Arc<dyn Any + Send + Sync>,
}

impl ServiceInstance {
    pub fn new<S: Service>(service: Arc<S>) -> Self {
        Self {
            service: service.clone(),
            any: service,
        }
    }

    pub fn service(&self) -> &Arc<dyn Service> {
        &self.service
    }

    pub fn downcast<S: Service>(&self) -> Option<Arc<S>> {
        self.any.clone().downcast::<S>().ok()
    }
}

impl fmt::Debug for ServiceInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceInstance").finish_non_exhaustive()
    }
}

fn construct_erased<S: ServiceClass>(bot: BotHandle) -> ServiceInstance {
    ServiceInstance::new(Arc::new(S::construct(bot)))
}

/// Type-erased constructor a module declares.
#[derive(Clone, Copy)]
pub struct ServiceEntry {
    name: &'static str,
    construct: fn(BotHandle) -> ServiceInstance,
}

impl ServiceEntry {
    pub fn of<S: ServiceClass>() -> Self {
        Self {
            name: S::NAME,
            construct: construct_erased::<S>,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for ServiceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ServiceEntry").field(&self.name).finish()
    }
}

fn service_key(namespace: &str, name: &str) -> String {
    format!("{}.{}", namespace, name).to_lowercase()
}

#[derive(Default)]
struct RegistryInner {
    order: Vec<(String, ServiceInstance)>,
    by_key: HashMap<String, ServiceInstance>,
}

/// Namespaced service registry preserving registration order.
#[derive(Default)]
pub struct ServiceRegistry {
    inner: RwLock<RegistryInner>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct and register a service under `namespace`.
    pub fn add(&self, namespace: &str, entry: ServiceEntry, bot: BotHandle) -> Result<ServiceInstance, BotError> {
        if self.contains(namespace, entry.name) {
            return Err(BotError::ServiceAlreadyExists(format!("{}.{}", namespace, entry.name)));
        }
        self.insert(namespace, entry.name, (entry.construct)(bot))
    }

    /// Register an already constructed service.
    pub fn insert(&self, namespace: &str, name: &str, instance: ServiceInstance) -> Result<ServiceInstance, BotError> {
        let key = service_key(namespace, name);

        let mut inner = self.inner.write();
        if inner.by_key.contains_key(&key) {
            return Err(BotError::ServiceAlreadyExists(format!("{}.{}", namespace, name)));
        }
        inner.by_key.insert(key.clone(), instance.clone());
        inner.order.push((key, instance.clone()));

        tracing::debug!(namespace, service = name, "service registered");
        Ok(instance)
    }

    pub fn get_erased(&self, namespace: &str, name: &str) -> Result<ServiceInstance, BotError> {
        self.inner
            .read()
            .by_key
            .get(&service_key(namespace, name))
            .cloned()
            .ok_or_else(|| BotError::ServiceNotFound(format!("{}.{}", namespace, name)))
    }

    /// Look a service up at its concrete type.
    pub fn get<S: Service>(&self, namespace: &str, name: &str) -> Result<Arc<S>, BotError> {
        self.get_erased(namespace, name)?
            .downcast::<S>()
            .ok_or_else(|| BotError::ServiceNotFound(format!("{}.{}", namespace, name)))
    }

    pub fn contains(&self, namespace: &str, name: &str) -> bool {
        self.inner.read().by_key.contains_key(&service_key(namespace, name))
    }

    /// Services in registration order, keyed `namespace.name` (lowercased).
    pub fn services(&self) -> Vec<(String, Arc<dyn Service>)> {
        self.inner
            .read()
            .order
            .iter()
            .map(|(key, instance)| (key.clone(), instance.service().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configure every service in registration order. The first failure
    /// aborts the pass.
    pub async fn configure_services(&self, settings: &Settings) -> Result<usize, BotError> {
        let services = self.services();
        for (key, service) in &services {
            tracing::debug!(service = %key, "configuring service");
            service.configure_service(settings).await.map_err(|err| {
                tracing::error!(service = %key, error = %err, "service configuration failed");
                err
            })?;
        }
        Ok(services.len())
    }
}
