//! Fakes shared by the unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::errors::Error;
use crate::light::{Applied, Device};
use crate::registry::{DiscoveredLight, Vendor};
use crate::runtime::BoxFuture;
use crate::state::LightState;
use crate::types::Protocol;

type Result<T> = std::result::Result<T, Error>;

/// A device that records every state it is asked to apply.
#[derive(Default)]
pub(crate) struct RecordingDevice {
    applied: Mutex<Vec<LightState>>,
    fail: bool,
}

impl RecordingDevice {
    pub fn failing() -> Self {
        RecordingDevice {
            fail: true,
            ..Self::default()
        }
    }

    pub fn applied(&self) -> Vec<LightState> {
        self.applied.lock().unwrap().clone()
    }
}

impl Device for RecordingDevice {
    fn apply<'a>(&'a self, desired: &'a LightState) -> BoxFuture<'a, Result<Applied>> {
        Box::pin(async move {
            if self.fail {
                return Err(Error::timed_out("receive"));
            }
            self.applied.lock().unwrap().push(desired.clone());
            Ok(Applied {
                attempted: desired.clone(),
                acknowledged: true,
            })
        })
    }
}

/// A vendor whose scan results are scripted by the test.
pub(crate) struct FakeVendor {
    protocol: Protocol,
    lights: Mutex<Vec<(String, LightState)>>,
    pub device: Arc<RecordingDevice>,
    scans: AtomicUsize,
    fail: AtomicBool,
}

impl FakeVendor {
    pub fn new(protocol: Protocol, names: &[&str]) -> Self {
        FakeVendor {
            protocol,
            lights: Mutex::new(
                names
                    .iter()
                    .map(|n| (n.to_string(), LightState::new()))
                    .collect(),
            ),
            device: Arc::new(RecordingDevice::default()),
            scans: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    pub fn set_lights(&self, lights: Vec<(String, LightState)>) {
        *self.lights.lock().unwrap() = lights;
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn scans(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }
}

impl Vendor for FakeVendor {
    fn protocol(&self) -> Protocol {
        self.protocol
    }

    fn scan(&self) -> BoxFuture<'_, Result<Vec<DiscoveredLight>>> {
        Box::pin(async move {
            self.scans.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(Error::socket(
                    "connect",
                    std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
                ));
            }
            let lights = self.lights.lock().unwrap().clone();
            Ok(lights
                .into_iter()
                .map(|(name, state)| DiscoveredLight {
                    name,
                    state,
                    device: Arc::clone(&self.device) as Arc<dyn Device>,
                })
                .collect())
        })
    }
}
