use crate::camera::CameraMode;
use std::fmt;

/// Structured diagnostics emitted by scene build and the simulation loop.
/// Consumers (UI overlays, the headless runner, tests) drain the bus once per
/// frame; nothing in the engine blocks on it.
#[derive(Debug, Clone)]
pub enum SceneEvent {
    BuildingPlaced { id: String },
    EntityRejected { id: String, district: String, reason: String },
    AssetFallback { id: String, reason: String },
    HoverChanged { id: Option<String> },
    EntityClicked { id: String },
    CameraModeChanged { mode: CameraMode },
    BacklogDropped { seconds: f32 },
}

impl fmt::Display for SceneEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneEvent::BuildingPlaced { id } => write!(f, "BuildingPlaced id={id}"),
            SceneEvent::EntityRejected { id, district, reason } => {
                write!(f, "EntityRejected id={id} district={district} reason={reason}")
            }
            SceneEvent::AssetFallback { id, reason } => {
                write!(f, "AssetFallback id={id} reason={reason}")
            }
            SceneEvent::HoverChanged { id } => {
                write!(f, "HoverChanged id={}", id.as_deref().unwrap_or("-"))
            }
            SceneEvent::EntityClicked { id } => write!(f, "EntityClicked id={id}"),
            SceneEvent::CameraModeChanged { mode } => {
                write!(f, "CameraModeChanged mode={}", mode.label())
            }
            SceneEvent::BacklogDropped { seconds } => {
                write!(f, "BacklogDropped seconds={seconds:.3}")
            }
        }
    }
}

#[derive(Default)]
pub struct EventBus {
    events: Vec<SceneEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: SceneEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<SceneEvent> {
        self.events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
