//! Periodic status publishing for sensor and battery declarations.

use std::time::Duration;

use log::{debug, warn};

use crate::error::MeshError;
use crate::models::registry::ModelState;
use crate::node::MeshNode;

/// One periodic publish obligation, snapshotted from the registry.
#[derive(Debug, Clone, Copy)]
enum PublishJob {
    Sensor { index: usize, property_id: u16, period: Duration },
    Battery { index: usize, period: Duration },
}

impl PublishJob {
    fn period(&self) -> Duration {
        match self {
            PublishJob::Sensor { period, .. } | PublishJob::Battery { period, .. } => *period,
        }
    }
}

impl MeshNode {
    /// Spawns one task per periodic declaration. Tasks observe the
    /// running flag and wind down after [`stop`](MeshNode::stop); ticks
    /// before provisioning or publication configuration are skipped.
    pub(crate) fn spawn_periodic_publishers(&self) {
        for job in self.periodic_jobs() {
            let node = self.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(job.period());
                loop {
                    ticker.tick().await;
                    if !*node.running.read() {
                        break;
                    }
                    if !node.is_provisioned() {
                        debug!("Skipping periodic publish; node not provisioned");
                        continue;
                    }
                    let result = match job {
                        PublishJob::Sensor { index, property_id, .. } => {
                            node.publish_sensor(index, property_id).await
                        }
                        PublishJob::Battery { index, .. } => node.publish_battery(index).await,
                    };
                    match result {
                        Ok(()) => {}
                        Err(MeshError::PublicationNotConfigured) => {
                            debug!("Skipping periodic publish; publication not configured");
                        }
                        Err(err) => warn!("Periodic publish failed: {}", err),
                    }
                }
            });
        }
    }

    /// Collects periodic declarations with their kind-relative indices.
    fn periodic_jobs(&self) -> Vec<PublishJob> {
        let reg = self.registry.read();
        let mut jobs = Vec::new();
        let mut sensors_seen = 0;
        let mut batteries_seen = 0;
        for entry in reg.entries() {
            match &entry.state {
                ModelState::Sensor(state) => {
                    for slot in &state.sensors {
                        if let Some(period) = slot.spec.publish_period {
                            jobs.push(PublishJob::Sensor {
                                index: sensors_seen,
                                property_id: slot.spec.property_id,
                                period,
                            });
                        }
                    }
                    sensors_seen += 1;
                }
                ModelState::Battery(state) => {
                    if let Some(period) = state.publish_period {
                        jobs.push(PublishJob::Battery { index: batteries_seen, period });
                    }
                    batteries_seen += 1;
                }
                _ => {}
            }
        }
        jobs
    }
}
