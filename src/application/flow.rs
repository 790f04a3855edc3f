//! Add / link flow
//!
//! State machine behind "add an owner" and "link an existing entity" on a
//! node of the ownership structure. Nothing reaches the store until a
//! submission succeeds; cancelling from any state leaves it untouched.

use std::fmt;

use tracing::{debug, instrument};

use crate::application::services::OwnershipService;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{Entity, EntityId, EntityKind, Percentage};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FlowState {
    #[default]
    Idle,
    /// Creating a new entity; `parent` is the node it will own a stake in,
    /// `None` meaning the organisation itself
    DialogOpen {
        kind: EntityKind,
        parent: Option<EntityId>,
    },
    /// Choosing an existing entity to become an owner of `parent`
    LinkingExisting { parent: EntityId },
    /// Waiting for the percentage `candidate` holds in `parent`
    AmountPrompt {
        parent: EntityId,
        candidate: EntityId,
    },
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowState::Idle => write!(f, "idle"),
            FlowState::DialogOpen { kind, .. } => write!(f, "{kind:?} dialog open"),
            FlowState::LinkingExisting { parent } => write!(f, "linking an owner of {parent}"),
            FlowState::AmountPrompt { candidate, .. } => {
                write!(f, "prompting for the amount held by {candidate}")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum FlowEvent {
    OpenDialog {
        kind: EntityKind,
        parent: Option<EntityId>,
    },
    StartLink { parent: EntityId },
    PickCandidate { candidate: EntityId },
    /// Dialog submission; `shareholding` is the raw form text
    SubmitEntity { entity: Entity, shareholding: String },
    SubmitAmount { amount: String },
    Cancel,
}

impl FlowEvent {
    fn name(&self) -> &'static str {
        match self {
            FlowEvent::OpenDialog { .. } => "open a dialog",
            FlowEvent::StartLink { .. } => "start linking",
            FlowEvent::PickCandidate { .. } => "pick a candidate",
            FlowEvent::SubmitEntity { .. } => "submit an entity",
            FlowEvent::SubmitAmount { .. } => "submit an amount",
            FlowEvent::Cancel => "cancel",
        }
    }
}

/// What handling an event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    /// Moved to a new non-terminal state
    Moved,
    /// A change was committed to the store; the flow is idle again
    Submitted(EntityId),
    Cancelled,
}

#[derive(Debug, Default)]
pub struct OwnershipFlow {
    state: FlowState,
}

impl OwnershipFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    /// Apply one event.
    ///
    /// On error the flow stays where it was, so a rejected submission can be
    /// corrected and retried.
    #[instrument(level = "debug", skip(self, service, event), fields(state = %self.state, event = event.name()))]
    pub fn handle(
        &mut self,
        service: &OwnershipService,
        event: FlowEvent,
    ) -> ApplicationResult<FlowOutcome> {
        let (next, outcome) = transition(service, &self.state, event)?;
        debug!("handle: {} -> {}", self.state, next);
        self.state = next;
        Ok(outcome)
    }
}

fn transition(
    service: &OwnershipService,
    state: &FlowState,
    event: FlowEvent,
) -> ApplicationResult<(FlowState, FlowOutcome)> {
    match (state, event) {
        (_, FlowEvent::Cancel) => Ok((FlowState::Idle, FlowOutcome::Cancelled)),
        (FlowState::Idle, FlowEvent::OpenDialog { kind, parent }) => {
            Ok((FlowState::DialogOpen { kind, parent }, FlowOutcome::Moved))
        }
        (FlowState::Idle, FlowEvent::StartLink { parent }) => {
            Ok((FlowState::LinkingExisting { parent }, FlowOutcome::Moved))
        }
        (FlowState::DialogOpen { kind, parent }, FlowEvent::SubmitEntity { entity, shareholding }) => {
            let actual = EntityKind::of(&entity);
            if actual != *kind {
                return Err(ApplicationError::KindMismatch {
                    expected: *kind,
                    actual,
                });
            }
            let shareholding = Percentage::parse_optional(&shareholding)?;
            let parent = parent.clone().unwrap_or_else(EntityId::root);
            let id = service.add_owner(&parent, entity, shareholding)?;
            Ok((FlowState::Idle, FlowOutcome::Submitted(id)))
        }
        (FlowState::LinkingExisting { parent }, FlowEvent::PickCandidate { candidate }) => {
            service.check_link(parent, &candidate)?;
            let next = FlowState::AmountPrompt {
                parent: parent.clone(),
                candidate,
            };
            Ok((next, FlowOutcome::Moved))
        }
        (FlowState::AmountPrompt { parent, candidate }, FlowEvent::SubmitAmount { amount }) => {
            let shareholding = Percentage::parse(&amount)?;
            service.link_existing(parent, candidate, Some(shareholding))?;
            Ok((FlowState::Idle, FlowOutcome::Submitted(candidate.clone())))
        }
        (state, event) => Err(ApplicationError::InvalidTransition {
            state: state.to_string(),
            event: event.name().to_string(),
        }),
    }
}
