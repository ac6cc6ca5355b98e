//! Participation ledger: join, leave, approve and reject under capacity.

use std::sync::Arc;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::models::{Participant, ParticipantStatus, SportEvent};
use crate::ports::{DecisionOutcome, EventStore, JoinOutcome, ParticipantStore};
use crate::services::notification::{Notification, NotificationEmitter, NotificationKind};

#[derive(Clone)]
pub struct ParticipationLedger {
    events: Arc<dyn EventStore>,
    participants: Arc<dyn ParticipantStore>,
    notifier: Arc<dyn NotificationEmitter>,
}

impl ParticipationLedger {
    pub fn new(
        events: Arc<dyn EventStore>,
        participants: Arc<dyn ParticipantStore>,
        notifier: Arc<dyn NotificationEmitter>,
    ) -> Self {
        Self {
            events,
            participants,
            notifier,
        }
    }

    /// Joins `user_id` to the event: Confirmed for public events, Pending
    /// for private ones. The owner is notified.
    pub async fn join(&self, event_id: Uuid, user_id: Uuid) -> CoreResult<Participant> {
        let event = self.load_event(event_id).await?;
        if event.is_owned_by(user_id) {
            return Err(CoreError::forbidden("You cannot join your own event"));
        }

        let status = event.join_status();
        let participant = match self.participants.join(event_id, user_id, status).await? {
            JoinOutcome::Joined(p) => p,
            JoinOutcome::AlreadyActive(_) => {
                return Err(CoreError::conflict(
                    "You are already participating in this event",
                ))
            }
            JoinOutcome::Declined(_) => {
                return Err(CoreError::forbidden(
                    "Your request to join this event was declined",
                ))
            }
            JoinOutcome::Full => return Err(CoreError::capacity_exceeded()),
            JoinOutcome::EventMissing => return Err(CoreError::not_found("Event not found")),
        };

        tracing::info!(
            event_id = %event_id,
            user_id = %user_id,
            status = %participant.status,
            "Participant joined event"
        );

        let (kind, title, body) = match participant.status {
            ParticipantStatus::Pending => (
                NotificationKind::JoinRequested,
                "New join request",
                format!("Someone asked to join {}", event.label()),
            ),
            _ => (
                NotificationKind::ParticipantJoined,
                "New participant",
                format!("Someone joined {}", event.label()),
            ),
        };
        self.notifier
            .notify(Notification {
                recipient_id: event.owner_id,
                from_user_id: Some(user_id),
                kind,
                title: title.to_string(),
                body,
                reference_id: Some(event_id.to_string()),
            })
            .await;

        Ok(participant)
    }

    /// Cancels the caller's active participation. No capacity check.
    pub async fn leave(&self, event_id: Uuid, user_id: Uuid) -> CoreResult<Participant> {
        self.load_event(event_id).await?;
        let participant = self
            .participants
            .cancel(event_id, user_id)
            .await?
            .ok_or_else(CoreError::not_participating)?;

        tracing::info!(event_id = %event_id, user_id = %user_id, "Participant left event");
        Ok(participant)
    }

    /// Confirms a pending participant if the event still has room.
    pub async fn approve(
        &self,
        event_id: Uuid,
        participant_id: Uuid,
        requester_id: Uuid,
    ) -> CoreResult<Participant> {
        let event = self.owned_event(event_id, requester_id).await?;
        self.participant_of(&event, participant_id).await?;

        let participant = match self.participants.confirm(participant_id).await? {
            DecisionOutcome::Applied(p) => p,
            DecisionOutcome::NotPending(p) => {
                return Err(CoreError::conflict(format!(
                    "Participant is {}, not pending",
                    p.status
                )))
            }
            DecisionOutcome::Full => return Err(CoreError::capacity_exceeded()),
            DecisionOutcome::Missing => return Err(CoreError::not_found("Participant not found")),
        };

        tracing::info!(
            event_id = %event_id,
            participant_id = %participant_id,
            "Participant approved"
        );
        self.notify_decision(&event, &participant, NotificationKind::ParticipationApproved)
            .await;
        Ok(participant)
    }

    /// Declines a pending participant. Declined is terminal.
    pub async fn reject(
        &self,
        event_id: Uuid,
        participant_id: Uuid,
        requester_id: Uuid,
    ) -> CoreResult<Participant> {
        let event = self.owned_event(event_id, requester_id).await?;
        self.participant_of(&event, participant_id).await?;

        let participant = match self.participants.decline(participant_id).await? {
            DecisionOutcome::Applied(p) => p,
            DecisionOutcome::NotPending(p) => {
                return Err(CoreError::conflict(format!(
                    "Participant is {}, not pending",
                    p.status
                )))
            }
            DecisionOutcome::Full | DecisionOutcome::Missing => {
                return Err(CoreError::not_found("Participant not found"))
            }
        };

        tracing::info!(
            event_id = %event_id,
            participant_id = %participant_id,
            "Participant rejected"
        );
        self.notify_decision(&event, &participant, NotificationKind::ParticipationDeclined)
            .await;
        Ok(participant)
    }

    /// Pending requests in join order. Owner only.
    pub async fn list_pending(
        &self,
        event_id: Uuid,
        requester_id: Uuid,
    ) -> CoreResult<Vec<Participant>> {
        self.owned_event(event_id, requester_id).await?;
        Ok(self
            .participants
            .list_by_status(event_id, ParticipantStatus::Pending)
            .await?)
    }

    async fn load_event(&self, event_id: Uuid) -> CoreResult<SportEvent> {
        self.events
            .find_event(event_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Event not found"))
    }

    async fn owned_event(&self, event_id: Uuid, requester_id: Uuid) -> CoreResult<SportEvent> {
        let event = self.load_event(event_id).await?;
        if !event.is_owned_by(requester_id) {
            return Err(CoreError::forbidden(
                "Only the event owner can manage participants",
            ));
        }
        Ok(event)
    }

    async fn participant_of(
        &self,
        event: &SportEvent,
        participant_id: Uuid,
    ) -> CoreResult<Participant> {
        self.participants
            .find_participant(participant_id)
            .await?
            .filter(|p| p.event_id == event.id)
            .ok_or_else(|| CoreError::not_found("Participant not found for this event"))
    }

    async fn notify_decision(
        &self,
        event: &SportEvent,
        participant: &Participant,
        kind: NotificationKind,
    ) {
        let (title, body) = match kind {
            NotificationKind::ParticipationApproved => (
                "Request approved",
                format!("You are confirmed for {}", event.label()),
            ),
            _ => (
                "Request declined",
                format!("Your request to join {} was declined", event.label()),
            ),
        };
        self.notifier
            .notify(Notification {
                recipient_id: participant.user_id,
                from_user_id: Some(event.owner_id),
                kind,
                title: title.to_string(),
                body,
                reference_id: Some(event.id.to_string()),
            })
            .await;
    }
}
