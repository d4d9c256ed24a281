use crate::easing::EasingRegistry;
use crate::geometry::ShapePath;

/// Reference to a pooled path. Stale handles (released, or from a slot that
/// has been reused since) never resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathHandle {
    index: u32,
    generation: u32,
}

#[derive(Debug)]
struct Slot {
    path: ShapePath,
    generation: u32,
    live: bool,
}

/// Arena of reusable paths.
///
/// Released paths are cleared but keep their buffers, so once playback has
/// touched every frame the pool stops allocating.
#[derive(Debug, Default)]
pub struct PathPool {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl PathPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty path owned by the caller until released.
    pub fn checkout(&mut self) -> PathHandle {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.live = true;
            return PathHandle {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            path: ShapePath::new(),
            generation: 0,
            live: true,
        });
        PathHandle {
            index,
            generation: 0,
        }
    }

    /// Checks out a path holding a copy of `source`.
    pub fn checkout_copy(&mut self, source: &ShapePath) -> PathHandle {
        let handle = self.checkout();
        if let Some(path) = self.get_mut(handle) {
            path.copy_from(source);
        }
        handle
    }

    pub fn get(&self, handle: PathHandle) -> Option<&ShapePath> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.live && slot.generation == handle.generation)
            .map(|slot| &slot.path)
    }

    pub fn get_mut(&mut self, handle: PathHandle) -> Option<&mut ShapePath> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.live && slot.generation == handle.generation)
            .map(|slot| &mut slot.path)
    }

    /// Reads one path while writing another. `None` if either handle is stale
    /// or both name the same slot.
    pub fn read_write(
        &mut self,
        source: PathHandle,
        target: PathHandle,
    ) -> Option<(&ShapePath, &mut ShapePath)> {
        if source.index == target.index {
            return None;
        }
        self.get(source)?;
        self.get(target)?;
        let (s, t) = (source.index as usize, target.index as usize);
        if s < t {
            let (head, tail) = self.slots.split_at_mut(t);
            Some((&head[s].path, &mut tail[0].path))
        } else {
            let (head, tail) = self.slots.split_at_mut(s);
            Some((&tail[0].path, &mut head[t].path))
        }
    }

    /// Returns a path to the pool. Returns false for a stale handle.
    pub fn release(&mut self, handle: PathHandle) -> bool {
        match self.slots.get_mut(handle.index as usize) {
            Some(slot) if slot.live && slot.generation == handle.generation => {
                slot.live = false;
                slot.generation = slot.generation.wrapping_add(1);
                slot.path.clear();
                self.free.push(handle.index);
                true
            }
            _ => false,
        }
    }

    pub fn release_all(&mut self, handles: &mut Vec<PathHandle>) {
        for handle in handles.drain(..) {
            self.release(handle);
        }
    }

    /// Paths currently checked out.
    pub fn live(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Paths ever allocated.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

/// Caches shared by everything built from one document.
#[derive(Debug, Default)]
pub struct Resources {
    pub easing: EasingRegistry,
    pub pool: PathPool,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }
}
