use std::collections::VecDeque;

/// Something that happened in the game for the outer layer to react to.
/// Sounds, screens and HUD updates are driven from these.
#[derive(Clone, PartialEq, Debug)]
pub enum GameEvent {
    LevelStarted { level_id: u32 },
    LevelCompleted { level_id: u32 },
    PlayerDied { level_id: u32 },
    /// Rate limited per character.
    CharacterDamaged { name: String },
    EnemyDied { name: String },
    ItemUsed { name: String },
    ItemSwitched { name: String },
    ItemPickedUp { name: String },
    ItemDropped { name: String },
}

/// Queue of events emitted while running frames.
#[derive(Default, Debug)]
pub struct EventQueue(VecDeque<GameEvent>);

impl EventQueue {

    pub fn push(&mut self, event: GameEvent) {
        log::trace!("Event {event:?}");
        self.0.push_back(event);
    }

    pub fn pop(&mut self) -> Option<GameEvent> {
        self.0.pop_front()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = GameEvent> + '_ {
        self.0.drain(..)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
