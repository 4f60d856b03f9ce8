// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The per-process bridge context.

use std::sync::{Arc, PoisonError, RwLock};

use mapview_core::BridgeConfig;
use mapview_core::engine::{EngineFactory, MapEngine};
use tracing::{info, warn};

use crate::dispatch;
use crate::error::Result;
use crate::handles::HandleTable;
use crate::host::HostEnv;
use crate::metadata::MetadataCache;

/// State that exists while the library is loaded: resolved metadata, the
/// live map instances and the factory that creates them.
///
/// Built by [`Bridge::attach`] at load and consumed by [`Bridge::detach`] at
/// unload, so nothing from a previous load can be observed after the next.
pub struct Bridge {
    config: BridgeConfig,
    cache: MetadataCache,
    handles: HandleTable,
    factory: Arc<dyn EngineFactory>,
}

impl Bridge {
    /// Resolve metadata and register the native methods on the wrapper.
    pub fn attach<H: HostEnv + ?Sized>(
        host: &mut H,
        config: BridgeConfig,
        factory: Arc<dyn EngineFactory>,
    ) -> Result<Self> {
        let (cache, wrapper) = MetadataCache::load(host, &config)?;
        if let Err(err) = dispatch::register(host, wrapper, &config.classes) {
            cache.release(host);
            return Err(err);
        }
        info!(wrapper = %config.classes.map_view, "map view bridge attached");
        Ok(Self {
            config,
            cache,
            handles: HandleTable::new(),
            factory,
        })
    }

    /// Destroy every remaining map and release the metadata cache.
    pub fn detach<H: HostEnv + ?Sized>(self, host: &mut H) {
        let remaining = self.handles.drain();
        if !remaining.is_empty() {
            warn!(count = remaining.len(), "destroying maps still alive at unload");
        }
        drop(remaining);
        self.cache.release(host);
        info!("map view bridge detached");
    }

    /// Detach a bridge taken out of a [`BridgeSlot`]. Returns `false`, leaving
    /// the metadata pinned, while another thread still holds the bridge.
    pub fn detach_shared<H: HostEnv + ?Sized>(shared: Arc<Self>, host: &mut H) -> bool {
        match Arc::try_unwrap(shared) {
            Ok(bridge) => {
                bridge.detach(host);
                true
            }
            Err(shared) => {
                warn!(
                    holders = Arc::strong_count(&shared),
                    "bridge still in use at unload; metadata left pinned"
                );
                false
            }
        }
    }

    /// The engine behind a managed handle.
    pub fn map(&self, raw: i64) -> Result<Arc<dyn MapEngine>> {
        self.handles.get(raw)
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    pub fn handles(&self) -> &HandleTable {
        &self.handles
    }

    pub fn factory(&self) -> &dyn EngineFactory {
        self.factory.as_ref()
    }
}

/// Process-wide home of the loaded bridge.
///
/// Native calls clone the bridge out and drop the lock before running, so a
/// callback that re-enters the library never takes the lock recursively and
/// never waits behind a pending unload.
pub struct BridgeSlot {
    inner: RwLock<Option<Arc<Bridge>>>,
}

impl BridgeSlot {
    pub const fn new() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }

    /// The loaded bridge, if any.
    pub fn current(&self) -> Option<Arc<Bridge>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Store `bridge`, returning the one it replaces.
    pub fn install(&self, bridge: Bridge) -> Option<Arc<Bridge>> {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(Arc::new(bridge))
    }

    /// Empty the slot. Calls already running keep their own reference.
    pub fn take(&self) -> Option<Arc<Bridge>> {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl Default for BridgeSlot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessFactory;
    use crate::testing::TestHost;

    #[test]
    fn attach_registers_every_method() {
        let mut host = TestHost::new();
        let bridge = Bridge::attach(
            &mut host,
            BridgeConfig::default(),
            Arc::new(HeadlessFactory::default()),
        )
        .unwrap();
        assert_eq!(host.natives().len(), dispatch::METHOD_COUNT);
        assert_eq!(host.live_globals(), bridge.cache().pinned());
        assert_eq!(bridge.config(), &BridgeConfig::default());
        bridge.detach(&mut host);
        assert_eq!(host.live_globals(), 0);
    }

    #[test]
    fn failed_registration_releases_metadata() {
        let mut host = TestHost::new();
        host.fail_registration(true);
        let result = Bridge::attach(
            &mut host,
            BridgeConfig::default(),
            Arc::new(HeadlessFactory::default()),
        );
        assert!(result.is_err());
        assert_eq!(host.live_globals(), 0);
    }

    #[test]
    fn detach_destroys_live_maps() {
        let mut host = TestHost::new();
        let factory = Arc::new(HeadlessFactory::default());
        let bridge = Bridge::attach(&mut host, BridgeConfig::default(), factory.clone()).unwrap();
        let cache = host.string("/cache");
        let data = host.string("/data");
        let apk = host.string("/apk");
        host.call(&bridge, "nativeCreate", &[cache.into(), data.into(), apk.into()]);
        assert_eq!(factory.live(), 1);

        bridge.detach(&mut host);
        assert_eq!(factory.live(), 0);
    }

    fn attached(host: &mut TestHost) -> Bridge {
        Bridge::attach(host, BridgeConfig::default(), Arc::new(HeadlessFactory::default())).unwrap()
    }

    #[test]
    fn slot_is_unlocked_while_a_call_holds_the_bridge() {
        let mut host = TestHost::new();
        let slot = BridgeSlot::new();
        assert!(slot.install(attached(&mut host)).is_none());

        let running = slot.current().unwrap();
        let cache = host.string("/cache");
        let data = host.string("/data");
        let apk = host.string("/apk");
        let handle = host.call(&running, "nativeCreate", &[cache.into(), data.into(), apk.into()]);
        assert_ne!(handle, crate::host::HostValue::Long(0));

        // A re-entrant lookup and an unload both proceed while `running` is
        // still held by this thread.
        assert!(slot.current().is_some());
        let taken = slot.take().unwrap();
        assert!(slot.current().is_none());
        assert!(!Bridge::detach_shared(taken.clone(), &mut host));
        assert!(host.live_globals() > 0);

        drop(running);
        assert!(Bridge::detach_shared(taken, &mut host));
        assert_eq!(host.live_globals(), 0);
    }

    #[test]
    fn install_returns_the_replaced_bridge() {
        let mut host = TestHost::new();
        let slot = BridgeSlot::default();
        slot.install(attached(&mut host));
        let previous = slot.install(attached(&mut host)).unwrap();
        assert!(Bridge::detach_shared(previous, &mut host));
        let current = slot.take().unwrap();
        assert!(Bridge::detach_shared(current, &mut host));
        assert_eq!(host.live_globals(), 0);
    }
}
