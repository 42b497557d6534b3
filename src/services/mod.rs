//! Background services and their lifecycle
//!
//! Every periodic task (rate limiter windows, cache health probe, update
//! broadcaster, HTTP server) is a [`Service`]. The [`ServiceManager`] starts
//! them in dependency and priority order and stops them in reverse, driven by
//! one shared `Notify` shutdown signal.

pub mod broadcaster;
mod health;
pub mod implementations;

pub use broadcaster::{Broadcaster, TokenUpdate, UpdateKind};
pub use health::ServiceHealth;

use crate::config::Config;
use crate::logger::{self, LogTag};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Grace period for a service's tasks to finish after shutdown is signalled
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Core service trait that all services must implement
#[async_trait]
pub trait Service: Send + Sync {
    /// Unique service identifier
    fn name(&self) -> &'static str;

    /// Service priority (lower = starts earlier, stops later)
    fn priority(&self) -> i32 {
        100
    }

    /// Services this service depends on
    fn dependencies(&self) -> Vec<&'static str> {
        vec![]
    }

    /// Check if service is enabled in configuration
    fn is_enabled(&self, _config: &Config) -> bool {
        true
    }

    /// Initialize the service
    async fn initialize(&mut self) -> Result<(), String> {
        Ok(())
    }

    /// Start the service
    async fn start(&mut self, shutdown: Arc<Notify>) -> Result<Vec<JoinHandle<()>>, String>;

    /// Stop the service
    async fn stop(&mut self) -> Result<(), String> {
        Ok(())
    }

    /// Check service health
    async fn health(&self) -> ServiceHealth {
        ServiceHealth::Healthy
    }
}

pub struct ServiceManager {
    services: HashMap<&'static str, Box<dyn Service>>,
    handles: HashMap<&'static str, Vec<JoinHandle<()>>>,
    shutdown: Arc<Notify>,
    config: Config,
}

impl ServiceManager {
    pub fn new(config: Config) -> Self {
        Self {
            services: HashMap::new(),
            handles: HashMap::new(),
            shutdown: Arc::new(Notify::new()),
            config,
        }
    }

    /// Register a service
    pub fn register(&mut self, service: Box<dyn Service>) {
        let name = service.name();
        self.services.insert(name, service);
    }

    pub fn shutdown_signal(&self) -> Arc<Notify> {
        self.shutdown.clone()
    }

    /// Start all enabled services in dependency and priority order
    pub async fn start_all(&mut self) -> Result<(), String> {
        logger::info(LogTag::Service, "Starting all services...");

        let enabled_services: Vec<&'static str> = self
            .services
            .iter()
            .filter(|(_, service)| service.is_enabled(&self.config))
            .map(|(name, _)| *name)
            .collect();

        let ordered = self.resolve_startup_order(&enabled_services)?;
        logger::info(
            LogTag::Service,
            &format!("Service startup order: {:?}", ordered),
        );

        for service_name in ordered {
            if let Some(service) = self.services.get_mut(service_name) {
                logger::debug(
                    LogTag::Service,
                    &format!("Initializing service: {}", service_name),
                );
                service.initialize().await?;

                let handles = service.start(self.shutdown.clone()).await?;
                self.handles.insert(service_name, handles);

                logger::info(LogTag::Service, &format!("Service started: {}", service_name));
            }
        }

        logger::info(LogTag::Service, "All services started");
        Ok(())
    }

    /// Stop all services in reverse startup order
    pub async fn stop_all(&mut self) -> Result<(), String> {
        logger::info(LogTag::Service, "Stopping all services...");

        self.shutdown.notify_waiters();

        let running_services: Vec<&'static str> = self.handles.keys().copied().collect();
        let mut ordered = self.resolve_startup_order(&running_services)?;
        ordered.reverse();

        for service_name in ordered {
            if let Some(service) = self.services.get_mut(service_name) {
                if let Err(e) = service.stop().await {
                    logger::warning(
                        LogTag::Service,
                        &format!("Service stop error for {}: {}", service_name, e),
                    );
                }

                if let Some(handles) = self.handles.remove(service_name) {
                    for mut handle in handles {
                        if tokio::time::timeout(STOP_TIMEOUT, &mut handle).await.is_err() {
                            logger::warning(
                                LogTag::Service,
                                &format!(
                                    "Service {} did not stop within {:?}, aborting",
                                    service_name, STOP_TIMEOUT
                                ),
                            );
                            handle.abort();
                        }
                    }
                }

                logger::info(LogTag::Service, &format!("Service stopped: {}", service_name));
            }
        }

        logger::info(LogTag::Service, "All services stopped");
        Ok(())
    }

    /// Dependencies first; ties broken by priority
    fn resolve_startup_order(
        &self,
        services: &[&'static str],
    ) -> Result<Vec<&'static str>, String> {
        use std::collections::HashSet;

        let mut ordered = Vec::new();
        let mut visited = HashSet::new();
        let mut visiting = HashSet::new();

        fn visit(
            name: &'static str,
            services: &HashMap<&'static str, Box<dyn Service>>,
            ordered: &mut Vec<&'static str>,
            visited: &mut HashSet<&'static str>,
            visiting: &mut HashSet<&'static str>,
        ) -> Result<(), String> {
            if visited.contains(name) {
                return Ok(());
            }

            if visiting.contains(name) {
                return Err(format!("Circular dependency detected for service: {}", name));
            }

            visiting.insert(name);

            if let Some(service) = services.get(name) {
                for dep in service.dependencies() {
                    visit(dep, services, ordered, visited, visiting)?;
                }
            }

            visiting.remove(name);
            visited.insert(name);
            ordered.push(name);

            Ok(())
        }

        let mut roots = services.to_vec();
        roots.sort_by_key(|name| {
            self.services
                .get(name)
                .map(|s| s.priority())
                .unwrap_or(100)
        });

        for service_name in roots {
            visit(service_name, &self.services, &mut ordered, &mut visited, &mut visiting)?;
        }

        Ok(ordered)
    }

    /// Get health status
    pub async fn get_health(&self) -> HashMap<&'static str, ServiceHealth> {
        let mut health = HashMap::new();
        for (name, service) in &self.services {
            health.insert(*name, service.health().await);
        }
        health
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct Recorder {
        name: &'static str,
        priority: i32,
        deps: Vec<&'static str>,
        enabled: bool,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Service for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn dependencies(&self) -> Vec<&'static str> {
            self.deps.clone()
        }

        fn is_enabled(&self, _config: &Config) -> bool {
            self.enabled
        }

        async fn start(&mut self, _shutdown: Arc<Notify>) -> Result<Vec<JoinHandle<()>>, String> {
            self.log.lock().push(format!("start:{}", self.name));
            Ok(vec![tokio::spawn(async {})])
        }

        async fn stop(&mut self) -> Result<(), String> {
            self.log.lock().push(format!("stop:{}", self.name));
            Ok(())
        }
    }

    fn recorder(
        name: &'static str,
        priority: i32,
        deps: Vec<&'static str>,
        log: &Arc<Mutex<Vec<String>>>,
    ) -> Box<dyn Service> {
        Box::new(Recorder {
            name,
            priority,
            deps,
            enabled: true,
            log: log.clone(),
        })
    }

    #[tokio::test]
    async fn test_start_order_respects_dependencies_and_priority() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut manager = ServiceManager::new(Config::default());
        manager.register(recorder("web", 10, vec!["cache"], &log));
        manager.register(recorder("cache", 50, vec![], &log));
        manager.register(recorder("limits", 20, vec![], &log));

        manager.start_all().await.unwrap();
        assert_eq!(
            *log.lock(),
            vec!["start:cache", "start:web", "start:limits"]
        );

        log.lock().clear();
        manager.stop_all().await.unwrap();
        assert_eq!(
            *log.lock(),
            vec!["stop:limits", "stop:web", "stop:cache"]
        );
    }

    #[tokio::test]
    async fn test_disabled_services_are_skipped() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut manager = ServiceManager::new(Config::default());
        manager.register(Box::new(Recorder {
            name: "off",
            priority: 1,
            deps: vec![],
            enabled: false,
            log: log.clone(),
        }));

        manager.start_all().await.unwrap();
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_circular_dependency_is_rejected() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut manager = ServiceManager::new(Config::default());
        manager.register(recorder("a", 1, vec!["b"], &log));
        manager.register(recorder("b", 1, vec!["a"], &log));

        assert!(manager.resolve_startup_order(&["a", "b"]).is_err());
    }
}
