//! Pooled instance allocation.
//!
//! Size-class free lists keyed by payload footprint: alloc and free are O(1).
//! Reference counting is explicit; the engine calls `inc_ref`/`dec_ref` at
//! every ownership hand-off and runs the destroy path at count zero. There is
//! no cycle collector: a cyclic instance graph leaks (the pool's live count
//! makes such leaks visible to tests).
use ahash::RandomState;
use hashbrown::HashMap;

use crate::class::ClassId;
use crate::instance::{Instance, InstanceData, InstanceId, NIL};

type FastHashMap<K, V> = HashMap<K, V, RandomState>;

fn fast_map_new<K: Eq + std::hash::Hash, V>() -> FastHashMap<K, V> {
    HashMap::with_hasher(RandomState::with_seeds(0, 0, 0, 0))
}

/// Default size rounding: footprints bucket to powers of two so near-same
/// size instances share a free list. Hosts may supply their own rounding.
pub fn round_pow2(footprint: usize) -> usize {
    footprint.next_power_of_two()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub allocs: usize,
    pub frees: usize,
    pub reuses: usize,
    pub live: usize,
}

pub struct ObjPool {
    slots: Vec<Option<Instance>>,
    free: FastHashMap<usize, Vec<u32>>,
    size_round: fn(usize) -> usize,
    stats: PoolStats,
}

impl ObjPool {
    pub fn new(nil_class: ClassId, size_round: fn(usize) -> usize) -> Self {
        let mut pool = Self {
            slots: Vec::with_capacity(1024),
            free: fast_map_new(),
            size_round,
            stats: PoolStats::default(),
        };
        // Slot 0 is the pinned nil instance.
        pool.slots.push(Some(Instance {
            class: nil_class,
            refs: 1,
            data: InstanceData::None,
        }));
        pool
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            live: self.live_count(),
            ..self.stats
        }
    }

    pub fn live_count(&self) -> usize {
        // nil is infrastructure, not a script-visible allocation
        self.slots.iter().flatten().count() - 1
    }

    /// Allocate with refcount 1, reusing a pooled slot of the same size class
    /// when one is free.
    pub fn alloc(&mut self, class: ClassId, data: InstanceData) -> InstanceId {
        self.stats.allocs += 1;
        let class_key = (self.size_round)(data.footprint());
        let inst = Instance {
            class,
            refs: 1,
            data,
        };
        if let Some(list) = self.free.get_mut(&class_key) {
            if let Some(idx) = list.pop() {
                self.stats.reuses += 1;
                self.slots[idx as usize] = Some(inst);
                return InstanceId(idx);
            }
        }
        let idx = self.slots.len() as u32;
        self.slots.push(Some(inst));
        InstanceId(idx)
    }

    pub fn get(&self, id: InstanceId) -> &Instance {
        self.slots[id.0 as usize]
            .as_ref()
            .expect("use of freed instance")
    }

    pub fn get_mut(&mut self, id: InstanceId) -> &mut Instance {
        self.slots[id.0 as usize]
            .as_mut()
            .expect("use of freed instance")
    }

    pub fn is_live(&self, id: InstanceId) -> bool {
        self.slots
            .get(id.0 as usize)
            .map(|s| s.is_some())
            .unwrap_or(false)
    }

    pub fn class_of(&self, id: InstanceId) -> ClassId {
        self.get(id).class
    }

    pub fn refs(&self, id: InstanceId) -> u32 {
        self.get(id).refs
    }

    pub fn inc_ref(&mut self, id: InstanceId) {
        if id == NIL {
            return;
        }
        let inst = self.get_mut(id);
        inst.refs += 1;
    }

    /// Drop one reference. Returns the payload for teardown when the count
    /// reached zero; the caller (engine) releases nested references and runs
    /// the destroy hook, then the slot is already back on its free list.
    #[must_use]
    pub fn dec_ref(&mut self, id: InstanceId) -> Option<(ClassId, InstanceData)> {
        if id == NIL {
            return None;
        }
        let inst = self.get_mut(id);
        debug_assert!(inst.refs > 0, "refcount underflow");
        inst.refs -= 1;
        if inst.refs > 0 {
            return None;
        }
        let inst = self.slots[id.0 as usize].take().expect("double free");
        self.stats.frees += 1;
        let key = (self.size_round)(inst.data.footprint());
        self.free.entry(key).or_default().push(id.0);
        Some((inst.class, inst.data))
    }

    /// Iterate live instance ids (tests, debugger inspection).
    pub fn iter_live(&self) -> impl Iterator<Item = InstanceId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_some())
            .map(|(i, _)| InstanceId(i as u32))
    }
}
