// Shared name cache and the scope that hands out its updater

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

use crate::index::ident::{Module, OccName};
use crate::index::symbol::Symbol;

/// Process-unique key handed out by a [`NameCache`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Unique(u64);

impl Unique {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// A resolved name: an occurrence in a specific module, tagged with its unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name {
    pub unique: Unique,
    pub occ: OccName,
    pub module: Module,
}

impl Name {
    pub fn to_symbol(&self) -> Symbol {
        Symbol::new(self.occ.clone(), self.module.clone())
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module.name, self.occ)
    }
}

/// Original-name table: every (module, occurrence) pair resolves to one [`Name`].
#[derive(Debug, Default)]
pub struct NameCache {
    names: HashMap<Module, HashMap<OccName, Name>>,
    next_unique: u64,
}

impl NameCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(modules: usize) -> Self {
        Self {
            names: HashMap::with_capacity(modules),
            next_unique: 0,
        }
    }

    pub fn lookup(&self, module: &Module, occ: &OccName) -> Option<&Name> {
        self.names.get(module).and_then(|occs| occs.get(occ))
    }

    /// Return the cached name, allocating a fresh unique on first sight.
    pub fn lookup_or_insert(&mut self, module: &Module, occ: &OccName) -> Name {
        if let Some(name) = self.lookup(module, occ) {
            return name.clone();
        }

        let unique = Unique(self.next_unique);
        self.next_unique += 1;

        let name = Name {
            unique,
            occ: occ.clone(),
            module: module.clone(),
        };
        trace!("New name {} with unique {}", name, unique.0);

        self.names
            .entry(module.clone())
            .or_default()
            .insert(occ.clone(), name.clone());
        name
    }

    pub fn len(&self) -> usize {
        self.names.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.names.values().all(HashMap::is_empty)
    }

    /// Uniques handed out so far.
    pub fn allocated(&self) -> u64 {
        self.next_unique
    }
}

/// Handle for mutating the shared cache. Every update runs under one lock.
#[derive(Clone)]
pub struct NameCacheUpdater {
    cache: Arc<Mutex<NameCache>>,
}

impl NameCacheUpdater {
    /// Apply `f` as one indivisible read-modify-write of the cache.
    pub fn update<R>(&self, f: impl FnOnce(&mut NameCache) -> R) -> R {
        let mut cache = self.cache.lock();
        f(&mut cache)
    }

    pub fn lookup_or_insert(&self, module: &Module, occ: &OccName) -> Name {
        self.update(|cache| cache.lookup_or_insert(module, occ))
    }
}

/// Execution contexts that can hand out the name cache updater.
pub trait HasNameCache {
    fn name_resolution_updater(&self) -> NameCacheUpdater;
}

/// The single cache owned by the host process.
#[derive(Clone, Default)]
pub struct SharedNameCache {
    cache: Arc<Mutex<NameCache>>,
}

impl SharedNameCache {
    pub fn new(cache: NameCache) -> Self {
        Self {
            cache: Arc::new(Mutex::new(cache)),
        }
    }

    /// Run `f` inside a scope bound to this cache.
    pub fn scope<R>(&self, f: impl FnOnce(&NameCacheScope) -> R) -> R {
        let scope = NameCacheScope {
            cache: Arc::clone(&self.cache),
        };
        f(&scope)
    }

    /// Read the cache without mutating it.
    pub fn read<R>(&self, f: impl FnOnce(&NameCache) -> R) -> R {
        let cache = self.cache.lock();
        f(&cache)
    }
}

impl fmt::Debug for SharedNameCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedNameCache")
            .field("strong_refs", &Arc::strong_count(&self.cache))
            .finish()
    }
}

/// Execution scope binding one shared cache for everything run inside it.
pub struct NameCacheScope {
    cache: Arc<Mutex<NameCache>>,
}

impl NameCacheScope {
    pub fn shares_cache_with(&self, shared: &SharedNameCache) -> bool {
        Arc::ptr_eq(&self.cache, &shared.cache)
    }
}

impl HasNameCache for NameCacheScope {
    fn name_resolution_updater(&self) -> NameCacheUpdater {
        NameCacheUpdater {
            cache: Arc::clone(&self.cache),
        }
    }
}

/// Resolve a decoded symbol to its cached [`Name`].
pub fn resolve_symbol<C: HasNameCache + ?Sized>(ctx: &C, symbol: &Symbol) -> Name {
    ctx.name_resolution_updater()
        .lookup_or_insert(&symbol.module, &symbol.name)
}
