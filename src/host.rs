use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

/// Handle to anything the track owns in the host's scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectRef {
    Track,
    /// Stable per-curve id, unaffected by renumbering.
    Curve(ObjectId),
    Generated(ObjectId),
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectRef::Track => write!(f, "track"),
            ObjectRef::Curve(id) => write!(f, "curve#{}", id.0),
            ObjectRef::Generated(id) => write!(f, "generated#{}", id.0),
        }
    }
}

/// Scene-side collaborator notified around every structural mutation.
pub trait HostServices {
    fn object_created(&mut self, object: ObjectRef);
    fn object_destroyed(&mut self, object: ObjectRef);
    /// Called before `object` is mutated.
    fn object_changing(&mut self, object: ObjectRef);
    fn reparent(&mut self, object: ObjectRef, parent: ObjectRef);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHost;

impl HostServices for NoopHost {
    fn object_created(&mut self, _object: ObjectRef) {}
    fn object_destroyed(&mut self, _object: ObjectRef) {}
    fn object_changing(&mut self, _object: ObjectRef) {}
    fn reparent(&mut self, _object: ObjectRef, _parent: ObjectRef) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    Created(ObjectRef),
    Destroyed(ObjectRef),
    Changing(ObjectRef),
    Reparented { object: ObjectRef, parent: ObjectRef },
}

/// Records every host call so design-time tooling can group them into undo
/// steps. Clones share the same journal.
#[derive(Debug, Default, Clone)]
pub struct UndoJournal {
    events: Rc<RefCell<Vec<HostEvent>>>,
}

impl UndoJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.events.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Removes and returns everything recorded since the last drain, i.e. one
    /// undo step.
    pub fn drain(&self) -> Vec<HostEvent> {
        self.events.borrow_mut().drain(..).collect()
    }

    fn push(&self, event: HostEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl HostServices for UndoJournal {
    fn object_created(&mut self, object: ObjectRef) {
        self.push(HostEvent::Created(object));
    }

    fn object_destroyed(&mut self, object: ObjectRef) {
        self.push(HostEvent::Destroyed(object));
    }

    fn object_changing(&mut self, object: ObjectRef) {
        self.push(HostEvent::Changing(object));
    }

    fn reparent(&mut self, object: ObjectRef, parent: ObjectRef) {
        self.push(HostEvent::Reparented { object, parent });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn journal_clones_share_events() {
        let journal = UndoJournal::new();
        let mut handle = journal.clone();
        let curve = ObjectRef::Curve(ObjectId(4));
        handle.object_created(curve);
        handle.reparent(curve, ObjectRef::Track);
        assert_eq!(journal.len(), 2);
        let step = journal.drain();
        assert_eq!(step[0], HostEvent::Created(curve));
        assert!(journal.is_empty());
        assert_eq!(curve.to_string(), "curve#4");
    }
}
