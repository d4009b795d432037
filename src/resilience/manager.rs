//! # Circuit Breaker Manager
//!
//! Holds one circuit breaker per named component, created on first use from the
//! loaded [`CircuitBreakerSettings`]. Provides centralized overrides and stats
//! aggregation for the composition root.

use crate::config::CircuitBreakerSettings;
use crate::resilience::{CircuitBreaker, CircuitBreakerStats, CircuitState, SystemCircuitBreakerStats};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Manager for multiple circuit breakers across system components
#[derive(Debug, Clone)]
pub struct CircuitBreakerManager {
    /// Collection of circuit breakers by component name
    circuit_breakers: Arc<RwLock<HashMap<String, Arc<CircuitBreaker>>>>,

    settings: CircuitBreakerSettings,
}

impl CircuitBreakerManager {
    pub fn from_settings(settings: &CircuitBreakerSettings) -> Self {
        info!(
            default_failure_threshold = settings.default_config.failure_threshold,
            configured_components = settings.component_configs.len(),
            "Initializing circuit breaker manager"
        );

        Self {
            circuit_breakers: Arc::new(RwLock::new(HashMap::new())),
            settings: settings.clone(),
        }
    }

    /// Get or create circuit breaker for a component
    pub async fn get_circuit_breaker(&self, component_name: &str) -> Arc<CircuitBreaker> {
        {
            let breakers = self.circuit_breakers.read().await;
            if let Some(breaker) = breakers.get(component_name) {
                return Arc::clone(breaker);
            }
        }

        let mut breakers = self.circuit_breakers.write().await;

        // Double-check: another task may have created it between the two locks
        if let Some(breaker) = breakers.get(component_name) {
            return Arc::clone(breaker);
        }

        if breakers.len() >= self.settings.global_settings.max_circuit_breakers {
            warn!(
                component = component_name,
                current_count = breakers.len(),
                max_allowed = self.settings.global_settings.max_circuit_breakers,
                "Circuit breaker limit exceeded"
            );
        }

        let component_config = self
            .settings
            .config_for_component(component_name)
            .to_resilience_config();

        let breaker = Arc::new(CircuitBreaker::new(component_name, component_config));
        breakers.insert(component_name.to_string(), Arc::clone(&breaker));

        info!(
            component = component_name,
            total_circuit_breakers = breakers.len(),
            "Created new circuit breaker"
        );

        breaker
    }

    /// Get all circuit breaker names
    pub async fn list_components(&self) -> Vec<String> {
        let breakers = self.circuit_breakers.read().await;
        breakers.keys().cloned().collect()
    }

    /// Get stats for a specific circuit breaker
    pub async fn get_component_stats(&self, component_name: &str) -> Option<CircuitBreakerStats> {
        let breakers = self.circuit_breakers.read().await;
        breakers.get(component_name).map(|breaker| breaker.stats())
    }

    /// Get system-wide circuit breaker stats
    pub async fn get_system_stats(&self) -> SystemCircuitBreakerStats {
        let mut system_stats = SystemCircuitBreakerStats::new();

        let breakers = self.circuit_breakers.read().await;
        for breaker in breakers.values() {
            system_stats.add_circuit_breaker(breaker.stats());
        }

        system_stats
    }

    /// Force open all circuit breakers (emergency stop)
    pub async fn force_open_all(&self) {
        warn!("Forcing all circuit breakers open");

        let breakers = self.circuit_breakers.read().await;
        for breaker in breakers.values() {
            breaker.trip();
        }
    }

    /// Force close all circuit breakers (emergency recovery)
    pub async fn force_close_all(&self) {
        warn!("Forcing all circuit breakers closed");

        let breakers = self.circuit_breakers.read().await;
        for breaker in breakers.values() {
            breaker.reset();
        }
    }

    /// Remove circuit breaker for a component
    pub async fn remove_circuit_breaker(&self, component_name: &str) -> bool {
        let mut breakers = self.circuit_breakers.write().await;
        if breakers.remove(component_name).is_some() {
            info!(
                component = component_name,
                remaining_count = breakers.len(),
                "Removed circuit breaker"
            );
            true
        } else {
            false
        }
    }

    /// Get count of circuit breakers by state
    pub async fn get_state_summary(&self) -> HashMap<CircuitState, usize> {
        self.get_system_stats().await.count_by_state()
    }

    /// Overall health based on circuit breaker states
    pub async fn system_health_score(&self) -> f64 {
        self.get_system_stats().await.health_score()
    }

    /// Emit one structured log line summarising every managed breaker
    pub async fn log_summary(&self) {
        let system_stats = self.get_system_stats().await;
        crate::logging::log_system_summary(&system_stats);
    }
}
