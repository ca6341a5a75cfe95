use std::cmp::Ordering;
use std::fmt::{self, Debug, Display};
use std::hash::Hash;
use std::sync::{LazyLock, RwLock};

use foldhash::{HashMap, HashMapExt};

use crate::ERR_POISONED_LOCK;

/// A name that an [`Engine`][crate::Engine] can key its timers by.
///
/// Implemented for every type that is cheap to copy, hashable and printable. The two intended
/// implementations are borrowed string slices (`&'a str`) and interned [`Key`]s.
///
/// Keys are stored in the pending events of an engine, so borrowed keys must outlive the engine.
/// The borrow checker enforces this: an `Engine<&'a str>` cannot outlive `'a`.
pub trait TimerKey: Copy + Eq + Hash + Debug + Display {}

impl<T> TimerKey for T where T: Copy + Eq + Hash + Debug + Display {}

/// An interned timer name.
///
/// Interning maps each distinct name to a small dense integer once per process, after which
/// hashing and comparing keys never touches the string content. The mapping only grows;
/// the same name always yields the same key for the lifetime of the process.
///
/// Ordering follows the string content of the names, so sorting keys gives the same order
/// as sorting the names themselves.
///
/// Prefer the [`key!`][crate::key!] macro at call sites, which caches the key so that only
/// the first call from each site consults the interner.
///
/// # Example
///
/// ```
/// use tick_tock::Key;
///
/// let a = Key::intern("checkout");
/// let b = Key::intern("checkout");
///
/// assert_eq!(a, b);
/// assert_eq!(a.name(), "checkout");
/// ```
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct Key {
    id: u32,
}

impl Key {
    /// Returns the key for `name`, registering the name on first use.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` distinct names are interned in one process.
    #[must_use]
    pub fn intern(name: &'static str) -> Self {
        // Almost always the name is already known, so we try being optimistic.
        if let Some(id) = INTERNER.read().expect(ERR_POISONED_LOCK).get(name) {
            return Self { id };
        }

        let id = INTERNER.write().expect(ERR_POISONED_LOCK).intern(name);
        Self { id }
    }

    /// The dense integer identifying this key within the current process.
    #[must_use]
    pub fn id(self) -> u32 {
        self.id
    }

    /// The name this key was interned from.
    #[must_use]
    pub fn name(self) -> &'static str {
        INTERNER
            .read()
            .expect(ERR_POISONED_LOCK)
            .name(self.id)
            .expect("keys can only be created by interning, so the name is always registered")
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.id == other.id {
            return Ordering::Equal;
        }

        self.name().cmp(other.name())
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("id", &self.id)
            .field("name", &self.name())
            .finish()
    }
}

/// Interns a string literal into a [`Key`], caching the result at the call site.
///
/// The first evaluation of each macro invocation consults the process-wide interner.
/// Every later evaluation of the same invocation is a single atomic load.
///
/// # Example
///
/// ```
/// use tick_tock::{Key, key};
///
/// fn lookup() -> Key {
///     key!("inventory_lookup")
/// }
///
/// assert_eq!(lookup(), lookup());
/// assert_eq!(lookup().name(), "inventory_lookup");
/// ```
#[macro_export]
macro_rules! key {
    ($name:literal) => {{
        static KEY: ::std::sync::OnceLock<$crate::Key> = ::std::sync::OnceLock::new();
        *KEY.get_or_init(|| $crate::Key::intern($name))
    }};
}

static INTERNER: LazyLock<RwLock<Interner>> = LazyLock::new(|| RwLock::new(Interner::new()));

/// Append-only bidirectional mapping between names and dense ids.
#[derive(Debug, Default)]
pub(crate) struct Interner {
    ids: HashMap<&'static str, u32>,
    names: Vec<&'static str>,
}

impl Interner {
    pub(crate) fn new() -> Self {
        Self {
            ids: HashMap::new(),
            names: Vec::new(),
        }
    }

    pub(crate) fn get(&self, name: &str) -> Option<u32> {
        self.ids.get(name).copied()
    }

    pub(crate) fn name(&self, id: u32) -> Option<&'static str> {
        self.names.get(usize::try_from(id).ok()?).copied()
    }

    /// Returns the id of `name`, assigning the next free id if the name is new.
    pub(crate) fn intern(&mut self, name: &'static str) -> u32 {
        if let Some(id) = self.get(name) {
            // Someone else interned it between our read and write lock.
            return id;
        }

        let id = u32::try_from(self.names.len()).expect("more than u32::MAX interned timer names");

        self.names.push(name);
        self.ids.insert(name, id);

        tracing::trace!(name, id, "interned timer name");

        id
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.names.len()
    }
}
