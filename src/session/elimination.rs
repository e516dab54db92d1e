use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::coordinator::SessionCoordinator;
use crate::{
    room::models::{Candidate, EliminationState, RoundInfo, SpinRecord},
    shared::AppError,
    wheel::{ELIMINATION_SPIN, FULL_SPIN},
    websockets::{messages::EliminationRoundCompletePayload, WebSocketMessage},
};

/// What the spin driver waits on next
#[derive(Debug)]
pub(super) enum SpinPhase {
    /// A spin whose result is the room's pick
    Final(SpinRecord),
    /// A spin whose result leaves the wheel
    Elimination(SpinRecord),
    /// Nothing left to wait on
    Done,
}

impl SessionCoordinator {
    pub(super) async fn start_elimination(
        self: &Arc<Self>,
        code: String,
        started_by: String,
        duration: f64,
        total_rounds: u32,
        available_candidates: usize,
    ) -> Result<(), AppError> {
        let state = EliminationState::new(total_rounds, started_by.clone(), duration);
        let sequence = state.sequence.clone();
        self.repository.set_elimination_state(&code, Some(state))?;

        info!(
            room_code = %code,
            total_rounds = total_rounds,
            available_candidates = available_candidates,
            "Elimination sequence started"
        );
        self.broadcast(
            &code,
            &WebSocketMessage::elimination_started(total_rounds, started_by, available_candidates),
        )
        .await;

        let phase = self.run_elimination_round(&code, &sequence).await?;
        self.spawn_spin_driver(code, Some(sequence), phase);
        Ok(())
    }

    /// Waits out spins in the background and advances the room once each one
    /// lands
    pub(super) fn spawn_spin_driver(
        self: &Arc<Self>,
        code: String,
        sequence: Option<String>,
        phase: SpinPhase,
    ) {
        if matches!(phase, SpinPhase::Done) {
            return;
        }
        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            coordinator.drive(code, sequence, phase).await;
        });
    }

    async fn drive(&self, code: String, sequence: Option<String>, mut phase: SpinPhase) {
        loop {
            phase = match phase {
                SpinPhase::Done => return,
                SpinPhase::Final(spin) => {
                    sleep(self.completion_delay(&spin)).await;
                    self.finish_spin(&code, &spin.token).await;
                    return;
                }
                SpinPhase::Elimination(spin) => {
                    let Some(sequence) = sequence.as_deref() else {
                        warn!(room_code = %code, "Elimination spin without a sequence");
                        return;
                    };

                    sleep(self.completion_delay(&spin)).await;
                    if !self.finish_elimination_spin(&code, sequence, &spin).await {
                        return;
                    }

                    sleep(self.timing.elimination_pacing).await;
                    match self.run_elimination_round(&code, sequence).await {
                        Ok(next) => next,
                        Err(e) => {
                            debug!(room_code = %code, error = %e, "Elimination sequence stopped");
                            return;
                        }
                    }
                }
            }
        }
    }

    /// Takes the selected movie off the wheel. Returns false once the spin or
    /// its sequence has been superseded, or the room is gone.
    async fn finish_elimination_spin(&self, code: &str, sequence: &str, spin: &SpinRecord) -> bool {
        match self.repository.complete_spin(code, &spin.token) {
            Ok(Some(_)) => {}
            Ok(None) => {
                debug!(room_code = %code, "Elimination spin was superseded");
                return false;
            }
            Err(e) => {
                debug!(room_code = %code, error = %e, "Room gone before elimination landed");
                return false;
            }
        }

        let eliminated = &spin.selected_candidate;
        let record = match self
            .repository
            .record_elimination(code, sequence, eliminated.id)
        {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!(room_code = %code, "Elimination sequence was superseded");
                return false;
            }
            Err(e) => {
                debug!(room_code = %code, error = %e, "Room gone before elimination landed");
                return false;
            }
        };

        info!(
            room_code = %code,
            round = record.state.current_round,
            total_rounds = record.state.total_rounds,
            eliminated = %eliminated.title,
            "Movie eliminated"
        );
        self.broadcast(
            code,
            &WebSocketMessage::elimination_round_complete(EliminationRoundCompletePayload {
                candidate_id: eliminated.id,
                title: eliminated.title.clone(),
                current_round: record.state.current_round,
                total_rounds: record.state.total_rounds,
                remaining_candidates: record.remaining_candidates,
                eliminated: record.state.eliminated,
            }),
        )
        .await;
        true
    }

    /// Starts the next round of a sequence: another elimination spin, the
    /// final spin, or an outright win when only one movie is left standing
    pub(super) async fn run_elimination_round(
        &self,
        code: &str,
        sequence: &str,
    ) -> Result<SpinPhase, AppError> {
        let Some(state) = self.repository.advance_elimination(code, sequence)? else {
            debug!(room_code = %code, "Elimination sequence no longer current");
            return Ok(SpinPhase::Done);
        };

        let wheel: Vec<Candidate> = self
            .repository
            .get_room(code)?
            .eligible_candidates()
            .into_iter()
            .filter(|c| !state.eliminated.contains(&c.id))
            .collect();

        if wheel.len() <= 1 {
            self.repository.end_elimination(code, sequence)?;
            match wheel.into_iter().next() {
                Some(winner) => {
                    info!(room_code = %code, winner = %winner.title, "Last movie standing");
                    self.broadcast(
                        code,
                        &WebSocketMessage::spin_stopped(winner, state.started_by, true),
                    )
                    .await;
                }
                None => warn!(room_code = %code, "Elimination sequence ran out of movies"),
            }
            return Ok(SpinPhase::Done);
        }

        if state.current_round > state.total_rounds {
            self.repository.end_elimination(code, sequence)?;
            debug!(room_code = %code, remaining = wheel.len(), "Eliminations done, final spin");
            let spin = self
                .launch_spin(code, state.started_by, state.duration, wheel, FULL_SPIN, None)
                .await?;
            return Ok(SpinPhase::Final(spin));
        }

        let round = RoundInfo {
            current_round: state.current_round,
            total_rounds: state.total_rounds,
            remaining_candidates: wheel.len(),
        };
        let spin = self
            .launch_spin(
                code,
                state.started_by,
                state.duration,
                wheel,
                ELIMINATION_SPIN,
                Some(round),
            )
            .await?;
        Ok(SpinPhase::Elimination(spin))
    }
}
