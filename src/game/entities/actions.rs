// Trigger action chains
//
// Level triggers compile into chains of action commands: "activate that
// entity, then switch the camera, then count the secret". Links live in an
// arena owned by the simulation context; controllers walk them by index and
// never release them, so a link can be handed from controller to controller
// across ticks.

/// What a chain link does when reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Hand the rest of the chain to another entity's controller.
    Activate,
    /// Switch the view to a fixed camera.
    CameraSwitch,
    /// Point the camera at an entity.
    CameraTarget,
    /// Count a secret as found.
    Secret,
    // Inert at the simulation layer; the outer game flow consumes these.
    Flow,
    FlipMap,
    FlipOn,
    FlipOff,
    Soundtrack,
    Hardcode,
    Clear,
    FlybyCamera,
    Cutscene,
    End,
}

/// Index of a link in the arena.
pub type ActionId = usize;

/// One link in a trigger chain.
#[derive(Debug, Clone, Copy)]
pub struct ActionCommand {
    pub kind: ActionKind,
    /// Kind-specific payload: entity index, camera id, secret id.
    pub value: i32,
    pub timer: f32,
    pub next: Option<ActionId>,
}

/// Arena of chain links, owned by the simulation context.
#[derive(Debug, Default)]
pub struct ActionArena {
    nodes: Vec<ActionCommand>,
}

impl ActionArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a single link; wire `next` yourself or use [`Self::chain`].
    pub fn push(&mut self, cmd: ActionCommand) -> ActionId {
        self.nodes.push(cmd);
        self.nodes.len() - 1
    }

    /// Build a whole chain front to back, returning its head.
    pub fn chain(&mut self, links: &[(ActionKind, i32, f32)]) -> Option<ActionId> {
        let mut head = None;
        for &(kind, value, timer) in links.iter().rev() {
            head = Some(self.push(ActionCommand {
                kind,
                value,
                timer,
                next: head,
            }));
        }
        head
    }

    pub fn get(&self, id: ActionId) -> ActionCommand {
        self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_links_front_to_back() {
        let mut arena = ActionArena::new();
        let head = arena
            .chain(&[
                (ActionKind::Activate, 3, 0.0),
                (ActionKind::Secret, 0, 0.0),
                (ActionKind::End, 0, 0.0),
            ])
            .unwrap();

        let first = arena.get(head);
        assert_eq!(first.kind, ActionKind::Activate);
        assert_eq!(first.value, 3);

        let second = arena.get(first.next.unwrap());
        assert_eq!(second.kind, ActionKind::Secret);

        let third = arena.get(second.next.unwrap());
        assert_eq!(third.kind, ActionKind::End);
        assert_eq!(third.next, None);
    }

    #[test]
    fn test_empty_chain() {
        let mut arena = ActionArena::new();
        assert_eq!(arena.chain(&[]), None);
        assert!(arena.is_empty());
    }

    #[test]
    fn test_push_returns_indices_in_order() {
        let mut arena = ActionArena::new();
        let a = arena.push(ActionCommand {
            kind: ActionKind::Flow,
            value: 0,
            timer: 0.0,
            next: None,
        });
        let b = arena.push(ActionCommand {
            kind: ActionKind::End,
            value: 0,
            timer: 0.0,
            next: Some(a),
        });
        assert_eq!((a, b), (0, 1));
        assert_eq!(arena.len(), 2);
    }
}
