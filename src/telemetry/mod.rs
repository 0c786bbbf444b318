//! Telemetry sampler
//!
//! Attaches geolocation and link-quality metadata to successful
//! measurements. The location provider is an external collaborator queried
//! with a bounded wait; failures and timeouts degrade to "no fix" rather
//! than propagating. Whether fix-less measurements are recorded at all is
//! the [`GpsPolicy`] switch, not a separate code path.

use crate::error::Result;
use crate::models::{GpsFix, LinkQuality};
use crate::types::GpsPolicy;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// External source of geolocation fixes
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Query the current position; `Ok(None)` when no fix is available
    async fn current_fix(&self) -> Result<Option<GpsFix>>;
}

/// Location provider that runs an external command and parses its JSON
///
/// The default command is `termux-location -p gps`, which prints a JSON
/// object with `latitude`/`longitude` and friends on stdout.
pub struct CommandLocationProvider {
    program: String,
    args: Vec<String>,
}

impl CommandLocationProvider {
    /// Build from a whitespace-separated command line
    pub fn from_command_line(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }
}

/// Wire shape of the location command output
#[derive(Debug, Deserialize)]
struct LocationOutput {
    latitude: Option<f64>,
    longitude: Option<f64>,
    altitude: Option<f64>,
    accuracy: Option<f64>,
    speed: Option<f64>,
    bearing: Option<f64>,
}

#[async_trait]
impl LocationProvider for CommandLocationProvider {
    async fn current_fix(&self) -> Result<Option<GpsFix>> {
        let output = match tokio::process::Command::new(&self.program)
            .args(&self.args)
            .output()
            .await
        {
            Ok(output) => output,
            Err(_) => return Ok(None),
        };

        if !output.status.success() {
            return Ok(None);
        }

        let parsed: LocationOutput = match serde_json::from_slice(&output.stdout) {
            Ok(parsed) => parsed,
            Err(_) => return Ok(None),
        };

        let (Some(latitude), Some(longitude)) = (parsed.latitude, parsed.longitude) else {
            return Ok(None);
        };

        Ok(Some(GpsFix {
            latitude,
            longitude,
            altitude: parsed.altitude,
            accuracy: parsed.accuracy,
            speed: parsed.speed,
            bearing: parsed.bearing,
        }))
    }
}

/// Provider used when geolocation is disabled
pub struct NoopLocationProvider;

#[async_trait]
impl LocationProvider for NoopLocationProvider {
    async fn current_fix(&self) -> Result<Option<GpsFix>> {
        Ok(None)
    }
}

/// Provider returning a fixed position, for tests and dry runs
pub struct StaticLocationProvider {
    fix: GpsFix,
}

impl StaticLocationProvider {
    pub fn new(fix: GpsFix) -> Self {
        Self { fix }
    }
}

#[async_trait]
impl LocationProvider for StaticLocationProvider {
    async fn current_fix(&self) -> Result<Option<GpsFix>> {
        Ok(Some(self.fix))
    }
}

/// Annotated metadata for one measurement
#[derive(Debug, Clone, Copy)]
pub struct TelemetrySample {
    pub gps: Option<GpsFix>,
    pub link: Option<LinkQuality>,
}

/// Samples geolocation with a bounded wait and forwards link metadata
pub struct TelemetrySampler {
    provider: Arc<dyn LocationProvider>,
    timeout: Duration,
    policy: GpsPolicy,
}

impl TelemetrySampler {
    pub fn new(provider: Arc<dyn LocationProvider>, timeout: Duration, policy: GpsPolicy) -> Self {
        Self {
            provider,
            timeout,
            policy,
        }
    }

    /// The configured policy for fix-less measurements
    pub fn policy(&self) -> GpsPolicy {
        self.policy
    }

    /// Query the provider, never waiting longer than the configured bound
    ///
    /// Provider errors and timeouts both collapse to "no geolocation".
    pub async fn sample(&self, link: Option<LinkQuality>) -> TelemetrySample {
        let gps = match tokio::time::timeout(self.timeout, self.provider.current_fix()).await {
            Ok(Ok(fix)) => fix,
            Ok(Err(_)) | Err(_) => None,
        };
        TelemetrySample { gps, link }
    }

    /// Whether a sample should become a measurement entry under the policy
    pub fn admits(&self, sample: &TelemetrySample) -> bool {
        match self.policy {
            GpsPolicy::Lenient => true,
            GpsPolicy::Strict => sample.gps.is_some(),
        }
    }
}
