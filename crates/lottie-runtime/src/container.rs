/// Anything that re-evaluates itself for a frame and reports whether its
/// observable value changed.
///
/// The returned flag is valid only for the frame it was computed for. Owners
/// that see `false` may reuse whatever they derived from the previous frame.
pub trait DynamicProperty {
    fn tick(&mut self, frame: f32) -> bool;
}

impl<T: DynamicProperty + ?Sized> DynamicProperty for Box<T> {
    fn tick(&mut self, frame: f32) -> bool {
        (**self).tick(frame)
    }
}

/// Ticks every item and ORs the results without short-circuiting.
pub fn tick_all<'a, I, D>(items: I, frame: f32) -> bool
where
    I: IntoIterator<Item = &'a mut D>,
    D: DynamicProperty + ?Sized + 'a,
{
    items
        .into_iter()
        .fold(false, |modified, item| item.tick(frame) | modified)
}

/// An owning list of dynamic children.
///
/// Children keep their concrete type so owners can still read resolved values;
/// use the default parameter when the children are heterogeneous.
#[derive(Debug, Clone)]
pub struct DynamicPropertyContainer<C = Box<dyn DynamicProperty>> {
    children: Vec<C>,
    frame: Option<f32>,
    modified: bool,
}

impl<C> Default for DynamicPropertyContainer<C> {
    fn default() -> Self {
        Self {
            children: Vec::new(),
            frame: None,
            modified: false,
        }
    }
}

impl<C: DynamicProperty> DynamicPropertyContainer<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_property(&mut self, child: C) -> usize {
        self.children.push(child);
        // a new child has not been evaluated for the cached frame
        self.frame = None;
        self.children.len() - 1
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&C> {
        self.children.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut C> {
        self.children.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, C> {
        self.children.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, C> {
        self.children.iter_mut()
    }

    pub fn as_slice(&self) -> &[C] {
        &self.children
    }

    pub fn as_mut_slice(&mut self) -> &mut [C] {
        &mut self.children
    }

    /// Result of the last `tick`.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Frame the modified flag belongs to.
    pub fn frame(&self) -> Option<f32> {
        self.frame
    }
}

impl<C> std::ops::Index<usize> for DynamicPropertyContainer<C> {
    type Output = C;

    fn index(&self, index: usize) -> &C {
        &self.children[index]
    }
}

impl<C> std::ops::IndexMut<usize> for DynamicPropertyContainer<C> {
    fn index_mut(&mut self, index: usize) -> &mut C {
        &mut self.children[index]
    }
}

impl<C: DynamicProperty> DynamicProperty for DynamicPropertyContainer<C> {
    fn tick(&mut self, frame: f32) -> bool {
        if self.frame == Some(frame) {
            return self.modified;
        }
        let modified = tick_all(&mut self.children, frame);
        self.modified = modified;
        self.frame = Some(frame);
        modified
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        changes_on: Vec<f32>,
        ticks: usize,
    }

    impl DynamicProperty for Counter {
        fn tick(&mut self, frame: f32) -> bool {
            self.ticks += 1;
            self.changes_on.contains(&frame)
        }
    }

    fn counter(changes_on: &[f32]) -> Counter {
        Counter {
            changes_on: changes_on.to_vec(),
            ticks: 0,
        }
    }

    #[test]
    fn modified_is_or_of_children() {
        let mut c = DynamicPropertyContainer::new();
        c.add_property(counter(&[1.0]));
        c.add_property(counter(&[2.0]));
        assert!(c.tick(1.0));
        assert!(c.tick(2.0));
        assert!(!c.tick(3.0));
        // every child was evaluated each frame
        assert!(c.iter().all(|child| child.ticks == 3));
    }

    #[test]
    fn same_frame_is_not_recomputed() {
        let mut c = DynamicPropertyContainer::new();
        c.add_property(counter(&[1.0]));
        assert!(c.tick(1.0));
        assert!(c.tick(1.0));
        assert_eq!(c[0].ticks, 1);
    }

    #[test]
    fn containers_nest() {
        let mut inner: DynamicPropertyContainer = DynamicPropertyContainer::new();
        inner.add_property(Box::new(counter(&[4.0])));
        let mut outer: DynamicPropertyContainer = DynamicPropertyContainer::new();
        outer.add_property(Box::new(inner));
        outer.add_property(Box::new(counter(&[])));
        assert!(!outer.tick(3.0));
        assert!(outer.tick(4.0));
    }

    #[test]
    fn tick_all_does_not_short_circuit() {
        let mut a = counter(&[1.0]);
        let mut b = counter(&[]);
        let changed = tick_all([&mut a as &mut dyn DynamicProperty, &mut b], 1.0);
        assert!(changed);
        assert_eq!(b.ticks, 1);
    }
}
